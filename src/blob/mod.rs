//! # Blob Store
//!
//! Media hosting for avatars, cover images, thumbnails and video files.
//! Failures never raise: callers get `None` and decide what that means for
//! their operation.

pub mod cloudinary;


use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use cloudinary::CloudinaryStore;

/// A stored asset as reported by the media host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
    /// Playback length in seconds, reported for audio and video assets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Result reported by the media host for a deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub result: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a staged local file. The local file is removed whether or not the upload succeeds.
    async fn upload(&self, local_path: &Path) -> Option<UploadedAsset>;

    /// Delete a previously uploaded asset by its public id
    async fn delete(&self, public_id: &str) -> Option<DeleteOutcome>;

    /// Delete an uploaded video. Hosts that keep videos apart from images override this.
    async fn delete_video(&self, public_id: &str) -> Option<DeleteOutcome> {
        self.delete(public_id).await
    }
}

/// Remove a staged upload, logging instead of failing.
pub(crate) async fn discard_local_file(local_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(local_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %local_path.display(), error = %e, "Failed to remove staged upload");
        }
    }
}
