use std::sync::Arc;

use axum::body::Bytes;
use uuid::Uuid;

use crate::{blob::BlobStore, error::AppError, utils::creator::authorize_creator};

const DEFAULT_EXTENSION: &str = "jpg";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Creator-only pass-through from the HTTP layer to the blob store.
#[derive(Clone)]
pub struct UploadService {
    blobs: Arc<dyn BlobStore>,
    creator_key: Arc<str>,
}

impl UploadService {
    pub fn new(blobs: Arc<dyn BlobStore>, creator_key: &str) -> Self {
        Self {
            blobs,
            creator_key: Arc::from(creator_key),
        }
    }

    /// Checks the creator key without touching any store.
    pub fn authorize(&self, creator_key: Option<&str>) -> Result<(), AppError> {
        authorize_creator(creator_key, &self.creator_key)
    }

    /// Stores the image under a fresh `{uuid}.{ext}` key and returns its public URL.
    pub async fn upload_image(
        &self,
        creator_key: Option<&str>,
        file: Option<IncomingFile>,
    ) -> Result<String, AppError> {
        self.authorize(creator_key)?;

        let file = match file {
            Some(file) if !file.bytes.is_empty() => file,
            _ => return Err(AppError::InvalidArgument("No file uploaded".to_string())),
        };

        let key = format!(
            "{}.{}",
            Uuid::new_v4(),
            extension_of(file.file_name.as_deref())
        );
        let content_type = file
            .content_type
            .as_deref()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);

        let url = self
            .blobs
            .store(&key, file.bytes, content_type)
            .await
            .map_err(|e| AppError::upstream("Upload failed", e))?;

        tracing::info!(%key, %url, "Image uploaded");
        Ok(url)
    }
}

/// Lowercased extension of `file_name`, or `jpg` when absent or unusual.
fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            (1..=10).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
