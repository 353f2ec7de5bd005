//! Incubations Domain
//!
//! Finding hospitals with a free incubation, booking one through a card
//! payment, and confirming the booking when the payment processor calls back.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐
//! │  Handlers   │   │ Webhook handler  │  ← raw body, signature checked first
//! └──────┬──────┘   └────────┬─────────┘
//!        │                   │
//! ┌──────▼───────────────────▼──┐     ┌────────────────┐
//! │           Service           │ ──► │ PaymentGateway │  ← Stripe intents
//! └──────────────┬──────────────┘     └────────────────┘
//!                │
//! ┌──────────────▼──────────────┐
//! │         Repository          │  ← trait + MongoDB implementation
//! └──────────────┬──────────────┘
//!                │
//! ┌──────────────▼──────────────┐
//! │   Models / BookingMetadata  │
//! └─────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_incubations::{
//!     IncubationService, MongoIncubationRepository, StripeConfig, StripeGateway,
//!     WebhookVerifier, handlers,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("danna");
//!
//! let stripe = StripeConfig::new("sk_test_...", "whsec_...");
//! let verifier = WebhookVerifier::new(stripe.webhook_secret.clone());
//! let service = Arc::new(IncubationService::new(
//!     MongoIncubationRepository::new(&db),
//!     StripeGateway::new(stripe)?,
//!     verifier,
//! ));
//!
//! let auth = JwtAuth::new(&JwtConfig::new("a-secret-that-is-at-least-32-characters")?);
//! let api = handlers::router(service.clone(), auth);
//! let webhook = handlers::webhook_router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod metadata;
pub mod models;
pub mod mongodb;
pub mod payments;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{IncubationError, IncubationResult};
pub use handlers::{ApiDoc, WEBHOOK_PATH};
pub use metadata::BookingMetadata;
pub use models::{
    BookingCharge, BookingRequest, CheckoutSession, Child, GeoPoint, Hospital, Incubation,
    IncubationReservation, NearHospitalsRequest, ReservationScope,
};
pub use mongodb::MongoIncubationRepository;
pub use payments::{PaymentGateway, Refund, StripeConfig, StripeGateway, WebhookVerifier};
pub use repository::IncubationRepository;
pub use service::{CountedPage, IncubationService, WebhookOutcome};
