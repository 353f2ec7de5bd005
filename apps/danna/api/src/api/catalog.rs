//! Catalog API routes
//!
//! Products, categories and brands backed by MongoDB with Cloudinary images.

use axum::Router;
use domain_catalog::{CatalogService, CloudinaryStore, MongoCatalogRepository, handlers};
use tracing::info;

use crate::state::AppState;

/// Create the catalog router
pub fn router(state: &AppState) -> eyre::Result<Router> {
    let repository = MongoCatalogRepository::new(&state.db);
    let assets = CloudinaryStore::new(state.config.cloudinary.clone())
        .map_err(|e| eyre::eyre!("Failed to create Cloudinary client: {}", e))?;

    let service = CatalogService::new(repository, assets);

    Ok(handlers::router(service, state.auth.clone()))
}

/// Initialize catalog indexes in MongoDB
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    MongoCatalogRepository::new(db)
        .init_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create catalog indexes: {}", e))?;
    info!("Catalog collection indexes created");
    Ok(())
}
