use axum_helpers::JwtConfig;
use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use database::mongodb::MongoConfig;
use domain_catalog::CloudinaryConfig;
use domain_incubations::StripeConfig;

pub use core_config::Environment;

/// Application configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub stripe: StripeConfig,
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            mongodb: MongoConfig::from_env()?,
            server: ServerConfig::from_env()?,
            environment: Environment::from_env(),
            jwt: JwtConfig::from_env()?,
            stripe: StripeConfig::from_env()?,
            cloudinary: CloudinaryConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [(&str, Option<&str>); 9] = [
        ("MONGODB_URL", Some("mongodb://localhost:27017")),
        ("MONGODB_DATABASE", Some("danna")),
        ("JWT_SECRET", Some("this-is-a-valid-secret-with-32-chars!")),
        ("STRIPE_KEY", Some("sk_test_123")),
        ("INCUBATION_SECRET", Some("whsec_123")),
        ("CLOUDINARY_CLOUD_NAME", Some("danna")),
        ("CLOUDINARY_API_KEY", Some("key")),
        ("CLOUDINARY_API_SECRET", Some("secret")),
        ("APP_ENV", None),
    ];

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(REQUIRED, || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.mongodb.database(), "danna");
            assert_eq!(config.stripe.webhook_secret, "whsec_123");
            assert!(config.environment.is_development());
        });
    }

    #[test]
    fn test_config_requires_stripe_key() {
        let mut vars = REQUIRED;
        vars[3] = ("STRIPE_KEY", None);
        temp_env::with_vars(vars, || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("STRIPE_KEY"));
        });
    }
}
