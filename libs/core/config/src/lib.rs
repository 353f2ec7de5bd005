//! Environment-driven configuration shared by every Danna crate.
//!
//! Each config struct implements [`FromEnv`]; the binary composes them into
//! one `Config` at startup and fails fast on the first missing or malformed
//! variable.

pub mod app;
pub mod server;
pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

pub use app::AppInfo;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Deployment flavour, selected by `APP_ENV` (anything but "production" is
/// development).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        match env::var("APP_ENV") {
            Ok(value) if value.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an environment variable into `T`, falling back to `default` when unset
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_selection() {
        for (value, expected) in [
            (None, Environment::Development),
            (Some("production"), Environment::Production),
            (Some("PRODUCTION"), Environment::Production),
            (Some("staging"), Environment::Development),
        ] {
            temp_env::with_var("APP_ENV", value, || {
                assert_eq!(Environment::from_env(), expected, "APP_ENV={value:?}");
            });
        }
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("CLOUD_FOLDER_NAME", Some("danna-staging"), || {
            assert_eq!(env_or_default("CLOUD_FOLDER_NAME", "danna"), "danna-staging");
        });
        temp_env::with_var_unset("CLOUD_FOLDER_NAME", || {
            assert_eq!(env_or_default("CLOUD_FOLDER_NAME", "danna"), "danna");
        });
    }

    #[test]
    fn test_env_required_names_the_missing_key() {
        temp_env::with_var_unset("STRIPE_KEY", || {
            let err = env_required("STRIPE_KEY").unwrap_err();
            assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "STRIPE_KEY"));
        });
    }

    #[test]
    fn test_env_parse_uses_default_when_unset() {
        temp_env::with_var_unset("STRIPE_TIMEOUT_SECS", || {
            let value: u64 = env_parse("STRIPE_TIMEOUT_SECS", 10).unwrap();
            assert_eq!(value, 10);
        });
    }

    #[test]
    fn test_env_parse_trims_value() {
        temp_env::with_var("STRIPE_TIMEOUT_SECS", Some(" 25 "), || {
            let value: u64 = env_parse("STRIPE_TIMEOUT_SECS", 10).unwrap();
            assert_eq!(value, 25);
        });
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        temp_env::with_var("STRIPE_TIMEOUT_SECS", Some("soon"), || {
            let err = env_parse::<u64>("STRIPE_TIMEOUT_SECS", 10).unwrap_err();
            assert!(err.to_string().contains("STRIPE_TIMEOUT_SECS"));
        });
    }
}
