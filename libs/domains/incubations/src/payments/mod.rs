//! Payment processor integration: intent creation and webhook events.

mod stripe;
pub mod webhook;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::IncubationResult;

pub use stripe::{StripeConfig, StripeGateway};
pub use webhook::{PaymentIntentObject, WebhookEvent, WebhookVerifier};

/// A card payment split between the hospital and the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    /// Platform fee in minor units
    pub application_fee_amount: i64,
    /// Connected account receiving the remainder
    pub destination: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// A refund issued for a captured payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Refund {
    pub id: String,
    pub status: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> IncubationResult<PaymentIntent>;

    /// Refund the whole payment, pulling the transfer and platform fee back.
    /// Repeated calls for one intent return the first refund.
    async fn refund_payment_intent(&self, payment_intent: &str) -> IncubationResult<Refund>;
}
