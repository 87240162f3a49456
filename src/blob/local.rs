// src/blob/local.rs

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;

use super::{BlobError, BlobStore, public_url};

/// Writes blobs into a local directory that the router serves under `/uploads`.
/// Content type is not persisted; `ServeDir` infers it from the extension.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<String, BlobError> {
        let path = self.path_for(key)?;
        let io_err = |source| BlobError::Io {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&path, &bytes).await.map_err(io_err)?;

        tracing::debug!(path = %path.display(), size_bytes = bytes.len(), "Blob written");
        Ok(public_url(&self.public_base_url, key))
    }
}
