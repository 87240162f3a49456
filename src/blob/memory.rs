// src/blob/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::sync::RwLock;

use super::{BlobError, BlobStore, public_url};

/// A blob held by [`MemoryBlobStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryBlob {
    pub bytes: Bytes,
    pub content_type: String,
}

/// In-process blob store.
pub struct MemoryBlobStore {
    base_url: String,
    blobs: RwLock<HashMap<String, MemoryBlob>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<MemoryBlob> {
        self.blobs.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, BlobError> {
        self.blobs.write().await.insert(
            key.to_string(),
            MemoryBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(public_url(&self.base_url, key))
    }
}
