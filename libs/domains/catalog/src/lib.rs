//! Catalog Domain
//!
//! Products, categories and brands backed by MongoDB, with images kept in
//! Cloudinary.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, multipart parsing, admin checks
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │   Service   │ ──► │ AssetStore  │  ← Cloudinary uploads / deletes
//! └──────┬──────┘     └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, update intents
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_catalog::{
//!     CatalogService, CloudinaryConfig, CloudinaryStore, MongoCatalogRepository, handlers,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("danna");
//!
//! let repository = MongoCatalogRepository::new(&db);
//! let assets = CloudinaryStore::new(CloudinaryConfig::new("cloud", "key", "secret"))?;
//! let service = CatalogService::new(repository, assets);
//!
//! let auth = JwtAuth::new(&JwtConfig::new("a-secret-that-is-at-least-32-characters")?);
//! let router = handlers::router(service, auth);
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod slug;
pub mod update;

// Re-export commonly used types
pub use assets::{AssetStore, CloudinaryConfig, CloudinaryStore};
pub use error::{CatalogError, CatalogResult};
pub use handlers::ApiDoc;
pub use models::{
    Asset, CatalogEntity, CreateProduct, Label, LabelKind, Product, UpdateProduct, final_price,
};
pub use mongodb::MongoCatalogRepository;
pub use repository::CatalogRepository;
pub use service::{CatalogService, ListPage};
pub use update::{LabelUpdateIntent, ProductUpdateIntent};
