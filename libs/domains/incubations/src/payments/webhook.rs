//! Webhook signature verification and event parsing.
//!
//! The `Stripe-Signature` header has the form `t=<unix>,v1=<hex>[,v1=<hex>]`.
//! Each `v1` is an HMAC-SHA256 of `"<t>.<raw body>"` keyed by the endpoint
//! secret. Verification runs on the raw bytes, before any JSON parsing.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use crate::error::{IncubationError, IncubationResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum age of a signed payload, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentIntentObject {
    pub id: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl WebhookEvent {
    /// The confirmed payment intent, or `None` for any other event type.
    pub fn succeeded_payment(&self) -> IncubationResult<Option<PaymentIntentObject>> {
        if self.kind != PAYMENT_INTENT_SUCCEEDED {
            return Ok(None);
        }
        serde_json::from_value(self.data.object.clone())
            .map(Some)
            .map_err(|e| IncubationError::Validation(format!("invalid payment intent: {}", e)))
    }
}

#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verify `header` against `payload` and parse the event.
    pub fn construct_event(
        &self,
        payload: &[u8],
        header: Option<&str>,
    ) -> IncubationResult<WebhookEvent> {
        self.construct_event_at(payload, header, chrono::Utc::now().timestamp())
    }

    pub fn construct_event_at(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now: i64,
    ) -> IncubationResult<WebhookEvent> {
        let header = header.ok_or_else(|| invalid("missing Stripe-Signature header"))?;
        self.verify(payload, header, now)?;

        serde_json::from_slice(payload)
            .map_err(|e| IncubationError::Validation(format!("invalid webhook payload: {}", e)))
    }

    fn verify(&self, payload: &[u8], header: &str, now: i64) -> IncubationResult<()> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for (key, value) in header.split(',').filter_map(|part| part.trim().split_once('=')) {
            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                "v1" => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| invalid("unable to extract timestamp and signatures from header"))?;
        if signatures.is_empty() {
            return Err(invalid("no signatures found with expected scheme"));
        }

        let expected = signed_payload(&self.secret, timestamp, payload)?;
        let matched = signatures.iter().any(|signature| {
            const_hex::decode(signature)
                .map(|bytes| expected.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            return Err(invalid(
                "no signatures found matching the expected signature for payload",
            ));
        }

        if now - timestamp > self.tolerance_secs {
            return Err(invalid("timestamp outside the tolerance zone"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> IncubationError {
    IncubationError::InvalidSignature(message.to_string())
}

fn signed_payload(secret: &str, timestamp: i64, payload: &[u8]) -> IncubationResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| IncubationError::Internal(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Build a `Stripe-Signature` header value, as the processor would.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> IncubationResult<String> {
    let signature = signed_payload(secret, timestamp, payload)?
        .finalize()
        .into_bytes();
    Ok(format!("t={},v1={}", timestamp, const_hex::encode(signature)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "whsec_test";
    const NOW: i64 = 1_700_000_000;

    fn payload(kind: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": kind,
            "data": { "object": { "id": "pi_1", "metadata": { "child": "c1" } } }
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_signature_parses_event() {
        let body = payload(PAYMENT_INTENT_SUCCEEDED);
        let header = sign(&body, SECRET, NOW).unwrap();

        let event = WebhookVerifier::new(SECRET)
            .construct_event_at(&body, Some(&header), NOW + 10)
            .unwrap();
        let intent = event.succeeded_payment().unwrap().unwrap();
        assert_eq!(intent.id, "pi_1");
        assert_eq!(intent.metadata["child"], "c1");
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let body = payload(PAYMENT_INTENT_SUCCEEDED);
        let header = sign(&body, SECRET, NOW).unwrap();
        let tampered = payload("charge.refunded");

        let err = WebhookVerifier::new(SECRET)
            .construct_event_at(&tampered, Some(&header), NOW)
            .unwrap_err();
        assert!(matches!(err, IncubationError::InvalidSignature(_)));
    }

    #[test]
    fn test_wrong_secret_and_missing_header_are_rejected() {
        let body = payload(PAYMENT_INTENT_SUCCEEDED);
        let header = sign(&body, "another_secret", NOW).unwrap();
        let verifier = WebhookVerifier::new(SECRET);

        assert!(verifier.construct_event_at(&body, Some(&header), NOW).is_err());
        assert!(verifier.construct_event_at(&body, None, NOW).is_err());
        assert!(verifier.construct_event_at(&body, Some("v1=abc"), NOW).is_err());
        assert!(verifier.construct_event_at(&body, Some("t=1700000000"), NOW).is_err());
    }

    #[test]
    fn test_any_matching_v1_is_accepted() {
        let body = payload(PAYMENT_INTENT_SUCCEEDED);
        let valid = sign(&body, SECRET, NOW).unwrap();
        let header = format!("{},v1=deadbeef,v0=ignored", valid);

        assert!(WebhookVerifier::new(SECRET)
            .construct_event_at(&body, Some(&header), NOW)
            .is_ok());
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let body = payload(PAYMENT_INTENT_SUCCEEDED);
        let header = sign(&body, SECRET, NOW).unwrap();
        let verifier = WebhookVerifier::new(SECRET).with_tolerance(60);

        assert!(verifier.construct_event_at(&body, Some(&header), NOW + 60).is_ok());
        let err = verifier
            .construct_event_at(&body, Some(&header), NOW + 61)
            .unwrap_err();
        assert_eq!(err.to_string(), "Webhook Error: timestamp outside the tolerance zone");
    }

    #[test]
    fn test_other_event_types_carry_no_payment() {
        let body = payload("customer.created");
        let header = sign(&body, SECRET, NOW).unwrap();
        let event = WebhookVerifier::new(SECRET)
            .construct_event_at(&body, Some(&header), NOW)
            .unwrap();

        assert_eq!(event.kind, "customer.created");
        assert!(event.succeeded_payment().unwrap().is_none());
    }
}
