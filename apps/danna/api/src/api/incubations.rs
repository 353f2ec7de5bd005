//! Incubation reservation routes
//!
//! Nearby search and checkout under the JSON API, plus the payment webhook
//! which has to live at a fixed root path.

use std::sync::Arc;

use axum::Router;
use domain_incubations::{
    IncubationService, MongoIncubationRepository, StripeGateway, WebhookVerifier, handlers,
};
use tracing::info;

use crate::state::AppState;

pub struct IncubationRoutes {
    pub api: Router,
    pub webhook: Router,
}

/// Create the reservation and webhook routers around one shared service
pub fn routes(state: &AppState) -> eyre::Result<IncubationRoutes> {
    let stripe = state.config.stripe.clone();
    let verifier = WebhookVerifier::new(stripe.webhook_secret.clone());
    let payments = StripeGateway::new(stripe)
        .map_err(|e| eyre::eyre!("Failed to create Stripe client: {}", e))?;

    let service = Arc::new(IncubationService::new(
        MongoIncubationRepository::new(&state.db),
        payments,
        verifier,
    ));

    info!(path = handlers::WEBHOOK_PATH, "Payment webhook mounted");

    Ok(IncubationRoutes {
        api: handlers::router(service.clone(), state.auth.clone()),
        webhook: handlers::webhook_router(service),
    })
}

/// Initialize incubation indexes in MongoDB
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    MongoIncubationRepository::new(db)
        .init_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create incubation indexes: {}", e))?;
    info!("Incubation collection indexes created");
    Ok(())
}
