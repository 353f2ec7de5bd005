//! API routes module
//!
//! Wires the domain crates to HTTP routes.

pub mod catalog;
pub mod health;
pub mod incubations;

use axum::Router;

use crate::state::AppState;

/// Routes nested under `/api/v1` by `axum_helpers::create_router`
pub struct Routes {
    pub apis: Router,
    /// Mounted at the server root, outside the JSON API
    pub root: Router,
}

/// Create all routes
pub fn routes(state: &AppState) -> eyre::Result<Routes> {
    let incubations = incubations::routes(state)?;

    let apis = Router::new()
        .merge(catalog::router(state)?)
        .merge(incubations.api);

    Ok(Routes {
        apis,
        root: incubations.webhook,
    })
}

/// Initialize indexes for every domain collection
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    catalog::init_indexes(db).await?;
    incubations::init_indexes(db).await?;
    Ok(())
}
