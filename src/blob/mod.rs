// src/blob/mod.rs

pub mod local;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("failed to write blob '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("object storage rejected '{key}': {message}")]
    Remote { key: String, message: String },

    #[error("invalid blob key '{0}'")]
    InvalidKey(String),

    /// Object storage credentials could not be resolved.
    #[error("object storage credentials unavailable: {0}")]
    Credentials(String),
}

/// Write-only object storage used for uploaded images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the public URL of the object.
    async fn store(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, BlobError>;
}

/// Joins a public base URL and an object key with exactly one slash.
pub(crate) fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::public_url;

    #[test]
    fn public_url_joins_with_single_slash() {
        assert_eq!(public_url("http://cdn/images/", "a.jpg"), "http://cdn/images/a.jpg");
        assert_eq!(public_url("http://cdn/images", "/a.jpg"), "http://cdn/images/a.jpg");
    }
}
