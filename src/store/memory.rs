// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContainerName, DocumentStore, QuerySpec, RawDocument, StoreError, document_keys};

type Key = (ContainerName, String, String);

/// In-process document store keyed by (container, partition key, id).
/// Query results are returned in insertion order unless the query sorts.
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    docs: HashMap<Key, (u64, RawDocument)>,
    next_seq: u64,
}

impl Inner {
    fn put(&mut self, key: Key, body: Value) -> RawDocument {
        let doc = RawDocument {
            body,
            etag: Uuid::new_v4().to_string(),
        };
        // Replacing keeps the insertion position.
        let seq = match self.docs.get(&key) {
            Some((seq, _)) => *seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.docs.insert(key, (seq, doc.clone()));
        doc
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `container`.
    pub async fn document_count(&self, container: ContainerName) -> usize {
        self.inner
            .read()
            .await
            .docs
            .keys()
            .filter(|(c, _, _)| *c == container)
            .count()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(
        &self,
        container: ContainerName,
        body: Value,
    ) -> Result<RawDocument, StoreError> {
        let (pk, id) = document_keys(container, &body)?;
        let mut inner = self.inner.write().await;

        let key = (container, pk, id.clone());
        if inner.docs.contains_key(&key) {
            return Err(StoreError::Conflict { container, id });
        }
        Ok(inner.put(key, body))
    }

    async fn upsert(
        &self,
        container: ContainerName,
        body: Value,
    ) -> Result<RawDocument, StoreError> {
        let (pk, id) = document_keys(container, &body)?;
        let mut inner = self.inner.write().await;
        Ok(inner.put((container, pk, id), body))
    }

    async fn replace_if_match(
        &self,
        container: ContainerName,
        body: Value,
        etag: &str,
    ) -> Result<RawDocument, StoreError> {
        let (pk, id) = document_keys(container, &body)?;
        let mut inner = self.inner.write().await;

        let key = (container, pk, id.clone());
        let current = inner.docs.get(&key).map(|(_, doc)| doc.etag.clone());
        match current {
            None => Err(StoreError::NotFound { container, id }),
            Some(current) if current != etag => {
                Err(StoreError::PreconditionFailed { container, id })
            }
            Some(_) => Ok(inner.put(key, body)),
        }
    }

    async fn query(
        &self,
        container: ContainerName,
        spec: &QuerySpec,
    ) -> Result<Vec<RawDocument>, StoreError> {
        let inner = self.inner.read().await;

        let mut hits: Vec<&(u64, RawDocument)> = inner
            .docs
            .iter()
            .filter(|((c, _, _), (_, doc))| *c == container && spec.matches(&doc.body))
            .map(|(_, entry)| entry)
            .collect();
        hits.sort_by_key(|(seq, _)| *seq);

        let mut docs: Vec<RawDocument> = hits.into_iter().map(|(_, doc)| doc.clone()).collect();
        spec.sort(&mut docs);
        Ok(docs)
    }
}
