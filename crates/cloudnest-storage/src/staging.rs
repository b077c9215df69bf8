//! Staging area shared with the resumable-upload collaborator.
//!
//! A completed upload consists of two entries in the staging directory: the
//! blob itself at `<staging id>` and a JSON record at `<staging id>.info`
//! shaped like `{"ID": "...", "Size": 123, "MetaData": {"filename": "...",
//! "filetype": "..."}}`.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cloudnest_core::error::{AppError, ErrorKind};
use cloudnest_core::result::AppResult;
use cloudnest_core::traits::StorageProvider;
use cloudnest_entity::file::DEFAULT_MIME_TYPE;

#[derive(Debug, Default, Serialize, Deserialize)]
struct UploadInfo {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "Size", default)]
    size: Option<i64>,
    #[serde(rename = "MetaData", default)]
    meta_data: HashMap<String, String>,
}

impl UploadInfo {
    fn meta(&self, key: &str) -> Option<&str> {
        self.meta_data
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

/// A completed upload waiting to be finalized into a user's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpload {
    pub staging_id: String,
    /// Provider-relative path of the blob.
    pub blob_path: String,
    pub filename: String,
    pub mime_type: String,
    /// Size of the blob on disk.
    pub size_bytes: i64,
}

/// Reader (and, for tooling, writer) of the staging directory.
#[derive(Debug, Clone)]
pub struct StagingArea {
    provider: Arc<dyn StorageProvider>,
    dir: String,
}

impl StagingArea {
    pub fn new(provider: Arc<dyn StorageProvider>, dir: impl Into<String>) -> Self {
        Self {
            provider,
            dir: dir.into().trim_matches('/').to_string(),
        }
    }

    fn validate_id(staging_id: &str) -> AppResult<()> {
        let ok = !staging_id.is_empty()
            && staging_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'));
        if ok {
            Ok(())
        } else {
            Err(AppError::invalid_argument(format!(
                "Invalid staging id '{staging_id}'"
            )))
        }
    }

    fn blob_path(&self, staging_id: &str) -> String {
        format!("{}/{staging_id}", self.dir)
    }

    fn info_path(&self, staging_id: &str) -> String {
        format!("{}/{staging_id}.info", self.dir)
    }

    /// Read the upload record and blob size for `staging_id`.
    pub async fn load(&self, staging_id: &str) -> AppResult<StagedUpload> {
        Self::validate_id(staging_id)?;

        let raw = self
            .provider
            .read_bytes(&self.info_path(staging_id))
            .await
            .map_err(|e| match e.kind {
                ErrorKind::NotFound => {
                    AppError::not_found(format!("No staged upload with id '{staging_id}'"))
                }
                _ => e,
            })?;
        let info: UploadInfo = serde_json::from_slice(&raw).map_err(|e| {
            AppError::with_source(
                ErrorKind::InvalidArgument,
                format!("Upload record for '{staging_id}' is malformed"),
                e,
            )
        })?;

        let filename = info
            .meta("filename")
            .ok_or_else(|| {
                AppError::invalid_argument(format!(
                    "Upload record for '{staging_id}' has no filename"
                ))
            })?
            .to_string();
        let mime_type = info
            .meta("filetype")
            .map(str::to_string)
            .or_else(|| mime_from_name(&filename))
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        let blob_path = self.blob_path(staging_id);
        let stat = self.provider.stat(&blob_path).await.map_err(|e| match e.kind {
            ErrorKind::NotFound => {
                AppError::not_found(format!("Staged blob '{staging_id}' is missing"))
            }
            _ => e,
        })?;
        let size_bytes = stat.len as i64;
        if let Some(declared) = info.size {
            if declared != size_bytes {
                warn!(
                    staging_id,
                    declared, actual = size_bytes, "Staged blob size differs from upload record"
                );
            }
        }

        Ok(StagedUpload {
            staging_id: staging_id.to_string(),
            blob_path,
            filename,
            mime_type,
            size_bytes,
        })
    }

    /// Remove the `.info` record once the blob has been moved into place.
    pub async fn discard_record(&self, staging_id: &str) {
        if let Err(e) = self.provider.delete(&self.info_path(staging_id)).await {
            warn!(staging_id, error = %e, "Failed to remove staged upload record");
        }
    }

    /// Deposit a completed upload, as the upload collaborator would.
    pub async fn deposit(
        &self,
        staging_id: &str,
        data: Bytes,
        filename: &str,
        mime_type: Option<&str>,
    ) -> AppResult<StagedUpload> {
        Self::validate_id(staging_id)?;
        let mut meta_data = HashMap::new();
        meta_data.insert("filename".to_string(), filename.to_string());
        if let Some(mime) = mime_type {
            meta_data.insert("filetype".to_string(), mime.to_string());
        }
        let info = UploadInfo {
            id: staging_id.to_string(),
            size: Some(data.len() as i64),
            meta_data,
        };

        self.provider.write(&self.blob_path(staging_id), data).await?;
        self.provider
            .write(
                &self.info_path(staging_id),
                Bytes::from(serde_json::to_vec(&info)?),
            )
            .await?;
        debug!(staging_id, filename, "Deposited staged upload");
        self.load(staging_id).await
    }
}

/// Guess a MIME type from a file name extension.
fn mime_from_name(name: &str) -> Option<String> {
    mime_guess::from_path(name).first().map(|mime| mime.to_string())
}
