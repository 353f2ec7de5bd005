//! Image storage.
//!
//! The catalog only needs two operations from the asset store: upload one
//! image into a folder and delete a batch of images by public id.

mod cloudinary;

pub use cloudinary::{CloudinaryConfig, CloudinaryStore};

use async_trait::async_trait;
use axum_helpers::FileUpload;

use crate::error::CatalogResult;
use crate::models::Asset;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload one image. `folder` is relative to the store's root folder.
    async fn upload(&self, folder: &str, file: &FileUpload) -> CatalogResult<Asset>;

    /// Delete images by public id. An empty slice is a no-op.
    async fn delete_many(&self, ids: &[String]) -> CatalogResult<()>;
}
