//! Readiness endpoint

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use database::mongodb::{Client, ping};
use serde_json::Value;

/// Create the readiness router
pub fn router(client: Client) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(client)
}

/// 200 when MongoDB answers a ping, 503 otherwise
async fn readiness_check(
    State(client): State<Client>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let admin = client.database("admin");
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "mongodb",
        Box::pin(async { ping(&admin).await.map_err(|e| e.to_string()) }),
    )];
    run_health_checks(checks).await
}
