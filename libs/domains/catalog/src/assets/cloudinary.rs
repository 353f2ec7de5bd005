//! Cloudinary upload and admin API client.

use std::time::Duration;

use async_trait::async_trait;
use axum_helpers::FileUpload;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};
use reqwest::{Client, multipart};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, instrument};

use super::AssetStore;
use crate::error::{CatalogError, CatalogResult};
use crate::models::Asset;

/// Admin API limit for one delete call.
const DELETE_BATCH: usize = 100;

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Root folder every upload lands under
    pub root_folder: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            root_folder: "danna".to_string(),
            api_url: "https://api.cloudinary.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_root_folder(mut self, root_folder: impl Into<String>) -> Self {
        self.root_folder = root_folder.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl FromEnv for CloudinaryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = env_parse("CLOUDINARY_TIMEOUT_SECS", 30)?;

        Ok(Self::new(
            env_required("CLOUDINARY_CLOUD_NAME")?,
            env_required("CLOUDINARY_API_KEY")?,
            env_required("CLOUDINARY_API_SECRET")?,
        )
        .with_root_folder(env_or_default("CLOUD_FOLDER_NAME", "danna"))
        .with_api_url(env_or_default("CLOUDINARY_API_URL", "https://api.cloudinary.com"))
        .with_timeout(Duration::from_secs(timeout_secs)))
    }
}

/// Signed uploads use SHA-256, so the account must have SHA-256 signatures
/// enabled.
pub struct CloudinaryStore {
    config: CloudinaryConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryError {
    error: CloudinaryErrorDetail,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> CatalogResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn folder(&self, folder: &str) -> String {
        format!("{}/{}", self.config.root_folder, folder)
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.cloud_name,
            path
        )
    }

    /// Hex SHA-256 of the alphabetically sorted params followed by the secret.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let joined = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let digest = Sha256::digest(format!("{}{}", joined, self.config.api_secret).as_bytes());
        const_hex::encode(digest)
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<CloudinaryError>(&body) {
            Ok(parsed) => format!("Cloudinary error ({}): {}", status, parsed.error.message),
            Err(_) => format!("Cloudinary error ({}): {}", status, body),
        }
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    #[instrument(skip(self, file), fields(file_name = %file.file_name, size = file.bytes.len()))]
    async fn upload(&self, folder: &str, file: &FileUpload) -> CatalogResult<Asset> {
        let folder = self.folder(folder);
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("folder", folder.as_str()), ("timestamp", timestamp.as_str())]);

        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        debug!(folder = %folder, "Uploading image to Cloudinary");

        let response = self
            .client
            .post(self.endpoint("image/upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            error!(folder = %folder, error = %message, "Image upload failed");
            return Err(CatalogError::AssetStore(message));
        }

        let uploaded: UploadResponse = response.json().await?;
        info!(public_id = %uploaded.public_id, "Image uploaded");
        Ok(Asset::new(uploaded.public_id, uploaded.secure_url))
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn delete_many(&self, ids: &[String]) -> CatalogResult<()> {
        for batch in ids.chunks(DELETE_BATCH) {
            let query: Vec<(&str, &str)> = batch.iter().map(|id| ("public_ids[]", id.as_str())).collect();

            let response = self
                .client
                .delete(self.endpoint("resources/image/upload"))
                .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
                .query(&query)
                .send()
                .await?;

            if !response.status().is_success() {
                let message = Self::error_message(response).await;
                error!(error = %message, "Image delete failed");
                return Err(CatalogError::AssetStore(message));
            }
        }

        if !ids.is_empty() {
            info!(count = ids.len(), "Images deleted");
        }
        Ok(())
    }
}
