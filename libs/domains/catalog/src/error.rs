use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, is_duplicate_key};
use thiserror::Error;

use crate::models::CatalogEntity;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(CatalogEntity),

    #[error("Not {} added yet", .0.plural())]
    Empty(CatalogEntity),

    #[error("product title is already exists")]
    DuplicateTitle,

    #[error("{0} name is already exists")]
    DuplicateName(CatalogEntity),

    #[error("{entity} {field} is required")]
    ImageRequired {
        entity: CatalogEntity,
        field: &'static str,
    },

    #[error("product images are required")]
    ProductImagesRequired,

    #[error("sold must be greater than rating Count")]
    SoldBelowRatingCount,

    #[error("enter name or upload image")]
    NothingToUpdate,

    #[error("{0}")]
    Validation(String),

    #[error("Asset store error: {0}")]
    AssetStore(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) | CatalogError::Empty(_) => {
                AppError::NotFound(err.to_string())
            }
            CatalogError::DuplicateTitle | CatalogError::DuplicateName(_) => {
                AppError::Conflict(err.to_string())
            }
            CatalogError::ImageRequired { .. }
            | CatalogError::ProductImagesRequired
            | CatalogError::SoldBelowRatingCount
            | CatalogError::NothingToUpdate => AppError::BadRequest(err.to_string()),
            CatalogError::Validation(msg) => AppError::BadRequest(msg),
            CatalogError::AssetStore(msg) => AppError::BadGateway(msg),
            // Unique indexes catch races the existence checks miss.
            CatalogError::Database(e) if is_duplicate_key(&e) => {
                AppError::Conflict("duplicate value for a unique field".to_string())
            }
            CatalogError::Database(e) => AppError::Mongo(e),
            CatalogError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::AssetStore(err.to_string())
    }
}

impl From<validator::ValidationErrors> for CatalogError {
    fn from(err: validator::ValidationErrors) -> Self {
        CatalogError::Validation(err.to_string())
    }
}
