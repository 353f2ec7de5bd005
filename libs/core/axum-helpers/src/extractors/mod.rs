//! Custom extractors for Axum handlers.
//!
//! This module provides reusable extractors that reduce boilerplate
//! and standardize error handling across your API.

pub mod multipart;
pub mod object_id_path;
pub mod validated_json;

pub use multipart::{ALLOWED_IMAGE_TYPES, FileUpload, MultipartForm};
pub use object_id_path::ObjectIdPath;
pub use validated_json::ValidatedJson;
