use std::time::Duration;

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{error, info, instrument};

use super::{PaymentGateway, PaymentIntent, PaymentIntentRequest, Refund};
use crate::error::{IncubationError, IncubationResult};

#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key
    pub api_key: String,
    /// Signing secret of the booking webhook endpoint
    pub webhook_secret: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            webhook_secret: webhook_secret.into(),
            api_url: "https://api.stripe.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl FromEnv for StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = env_parse("STRIPE_TIMEOUT_SECS", 10)?;

        Ok(
            Self::new(env_required("STRIPE_KEY")?, env_required("INCUBATION_SECRET")?)
                .with_api_url(env_or_default("STRIPE_API_URL", "https://api.stripe.com"))
                .with_timeout(Duration::from_secs(timeout_secs)),
        )
    }
}

/// Stripe payment intents over the form-encoded REST API.
pub struct StripeGateway {
    config: StripeConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> IncubationResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Form fields in Stripe's bracket notation.
    fn form(request: &PaymentIntentRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency.clone()),
            ("payment_method_types[]".to_string(), "card".to_string()),
            (
                "application_fee_amount".to_string(),
                request.application_fee_amount.to_string(),
            ),
            (
                "transfer_data[destination]".to_string(),
                request.destination.clone(),
            ),
        ];
        form.extend(
            request
                .metadata
                .iter()
                .map(|(key, value)| (format!("metadata[{}]", key), value.clone())),
        );
        form
    }

    fn refund_form(payment_intent: &str) -> Vec<(String, String)> {
        vec![
            ("payment_intent".to_string(), payment_intent.to_string()),
            ("reverse_transfer".to_string(), "true".to_string()),
            ("refund_application_fee".to_string(), "true".to_string()),
        ]
    }

    /// POST a form to `/v1/{resource}` and decode the JSON reply.
    async fn post_form<T: DeserializeOwned>(
        &self,
        resource: &str,
        form: &[(String, String)],
        idempotency_key: Option<&str>,
    ) -> IncubationResult<T> {
        let url = format!(
            "{}/v1/{}",
            self.config.api_url.trim_end_matches('/'),
            resource
        );

        let mut request = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .form(form);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<StripeError>(&body) {
                Ok(parsed) => format!("Stripe error ({}): {}", status, parsed.error.message),
                Err(_) => format!("Stripe error ({}): {}", status, body),
            };
            error!(resource, error = %message, "Stripe request failed");
            return Err(IncubationError::PaymentGateway(message));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(amount = request.amount, destination = %request.destination))]
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> IncubationResult<PaymentIntent> {
        let intent: PaymentIntentResponse = self
            .post_form("payment_intents", &Self::form(request), None)
            .await?;
        info!(payment_intent = %intent.id, "Payment intent created");

        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }

    #[instrument(skip(self))]
    async fn refund_payment_intent(&self, payment_intent: &str) -> IncubationResult<Refund> {
        let idempotency_key = format!("refund-{}", payment_intent);
        let refund: RefundResponse = self
            .post_form(
                "refunds",
                &Self::refund_form(payment_intent),
                Some(&idempotency_key),
            )
            .await?;
        info!(refund_id = %refund.id, status = %refund.status, "Payment refunded");

        Ok(Refund {
            id: refund.id,
            status: refund.status,
        })
    }
}
