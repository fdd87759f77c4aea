//! Staging of multipart uploads on local disk before they go to the blob store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::api::error::ApiError;
use crate::blob::discard_local_file;

/// Multipart form with text fields in memory and file fields on disk
#[derive(Debug, Default)]
pub struct StagedForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, PathBuf>,
}

impl StagedForm {
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<PathBuf> {
        self.files.remove(name)
    }

    /// Remove files nobody claimed
    pub async fn discard_remaining(self) {
        for path in self.files.values() {
            discard_local_file(path).await;
        }
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Read every part of `multipart`, writing file parts under `dir`.
///
/// Only the first file for a given field name is kept. On error, files
/// already written are removed.
pub async fn stage_multipart(mut multipart: Multipart, dir: &Path) -> Result<StagedForm, ApiError> {
    let mut form = StagedForm::default();

    let result = async {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ApiError::internal(format!("Upload directory unavailable: {}", e)))?;

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e.body_text())))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match field.file_name().map(sanitize_file_name) {
                Some(file_name) if !form.files.contains_key(&name) => {
                    let path = dir.join(format!("{}-{}", uuid::Uuid::new_v4(), file_name));
                    let mut file = tokio::fs::File::create(&path)
                        .await
                        .map_err(|e| ApiError::internal(format!("Failed to stage upload: {}", e)))?;
                    form.files.insert(name.clone(), path.clone());

                    while let Some(chunk) = field.chunk().await.map_err(|e| {
                        ApiError::bad_request(format!("Malformed multipart body: {}", e.body_text()))
                    })? {
                        file.write_all(&chunk)
                            .await
                            .map_err(|e| ApiError::internal(format!("Failed to stage upload: {}", e)))?;
                    }
                    file.flush()
                        .await
                        .map_err(|e| ApiError::internal(format!("Failed to stage upload: {}", e)))?;

                    debug!(field = %name, path = %path.display(), "staged upload");
                }
                Some(_) => {
                    // Duplicate file field, drain and ignore
                    while field.chunk().await.ok().flatten().is_some() {}
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::bad_request(format!("Malformed multipart body: {}", e.body_text()))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok::<(), ApiError>(())
    }
    .await;

    match result {
        Ok(()) => Ok(form),
        Err(err) => {
            form.discard_remaining().await;
            Err(err)
        }
    }
}
