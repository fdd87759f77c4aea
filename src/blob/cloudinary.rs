//! Cloudinary-compatible upload API client.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use super::{discard_local_file, BlobStore, DeleteOutcome, UploadedAsset};
use crate::config::BlobStoreConfig;
use crate::errors::{Error, Result};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
    public_id: String,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Clone)]
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: BlobStoreConfig,
}

impl std::fmt::Debug for CloudinaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryStore").field("config", &self.config).finish()
    }
}

impl CloudinaryStore {
    /// Build the store. Fails if the HTTP client cannot be constructed with the configured timeout.
    pub fn new(config: BlobStoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build blob store HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, resource: &str, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.cloud_name,
            resource,
            action
        )
    }

    /// Signature over the alphabetically sorted parameters followed by the API secret
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let joined = sorted.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn try_upload(&self, local_path: &Path) -> Result<UploadedAsset> {
        let bytes = tokio::fs::read(local_path).await?;
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("timestamp", timestamp.as_str())]);

        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response =
            self.client.post(self.endpoint("auto", "upload")).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(format!("Upload rejected with {}: {}", status, body)));
        }

        let body: UploadResponse = response.json().await?;
        let url = body
            .secure_url
            .or(body.url)
            .ok_or_else(|| Error::upstream("Upload response carried no URL"))?;

        Ok(UploadedAsset { url, public_id: body.public_id, duration: body.duration })
    }

    async fn try_delete(&self, resource: &str, public_id: &str) -> Result<DeleteOutcome> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", timestamp.as_str())]);

        let params = [
            ("public_id", public_id.to_string()),
            ("api_key", self.config.api_key.clone()),
            ("timestamp", timestamp),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ];

        let response =
            self.client.post(self.endpoint(resource, "destroy")).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(format!("Delete rejected with {}", status)));
        }

        Ok(response.json::<DeleteOutcome>().await?)
    }
}

#[async_trait]
impl BlobStore for CloudinaryStore {
    #[instrument(skip(self), fields(path = %local_path.display()), name = "blob_upload")]
    async fn upload(&self, local_path: &Path) -> Option<UploadedAsset> {
        let outcome = self.try_upload(local_path).await;
        discard_local_file(local_path).await;

        match outcome {
            Ok(asset) => {
                info!(public_id = %asset.public_id, "Uploaded asset");
                Some(asset)
            }
            Err(e) => {
                warn!(error = %e, "Asset upload failed");
                None
            }
        }
    }

    #[instrument(skip(self), name = "blob_delete")]
    async fn delete(&self, public_id: &str) -> Option<DeleteOutcome> {
        self.destroy("image", public_id).await
    }

    #[instrument(skip(self), name = "blob_delete_video")]
    async fn delete_video(&self, public_id: &str) -> Option<DeleteOutcome> {
        self.destroy("video", public_id).await
    }
}

impl CloudinaryStore {
    async fn destroy(&self, resource: &str, public_id: &str) -> Option<DeleteOutcome> {
        match self.try_delete(resource, public_id).await {
            Ok(outcome) => {
                info!(public_id = %public_id, resource, result = %outcome.result, "Deleted asset");
                Some(outcome)
            }
            Err(e) => {
                warn!(public_id = %public_id, resource, error = %e, "Asset deletion failed");
                None
            }
        }
    }
}
