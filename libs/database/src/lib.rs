//! Database library providing the MongoDB connector and shared retry utilities
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB support
//! - `config` - Configuration support with `core_config::FromEnv`
//! - `all` - All features
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{self, MongoConfig};
//! use core_config::FromEnv;
//!
//! let config = MongoConfig::from_env()?;
//! let client = mongodb::connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```
//!
//! The retry helpers are usable on their own for any fallible async operation:
//!
//! ```ignore
//! use database::common::{RetryConfig, retry_with_backoff};
//!
//! let count = retry_with_backoff(|| repository.count_empty(hospital_id), RetryConfig::default()).await?;
//! ```

// Always available modules
pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

// Re-exports for convenience
pub use common::{DatabaseError, DatabaseResult, RetryConfig, retry_with_backoff};
