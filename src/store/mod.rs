// src/store/mod.rs

pub mod memory;
pub mod postgres;

use std::{cmp::Ordering, fmt, sync::Arc};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Errors raised by a document store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A document with the same partition key and id already exists.
    #[error("document '{id}' already exists in '{container}'")]
    Conflict { container: ContainerName, id: String },

    /// The stored entity tag no longer matches the one supplied.
    #[error("document '{id}' in '{container}' was modified concurrently")]
    PreconditionFailed { container: ContainerName, id: String },

    #[error("document '{id}' not found in '{container}'")]
    NotFound { container: ContainerName, id: String },

    /// The document lacks its id or partition key field.
    #[error("invalid document for '{container}': {reason}")]
    InvalidDocument {
        container: ContainerName,
        reason: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Logical container names. Each one maps to a partition key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerName {
    Posts,
    Comments,
    Ratings,
}

impl ContainerName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerName::Posts => "posts",
            ContainerName::Comments => "comments",
            ContainerName::Ratings => "ratings",
        }
    }

    /// Top-level document field holding the partition key.
    pub fn partition_key_path(&self) -> &'static str {
        match self {
            ContainerName::Posts => "id",
            ContainerName::Comments | ContainerName::Ratings => "postId",
        }
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw document as held by the store, with the entity tag of its last write.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub body: Value,
    pub etag: String,
}

/// A typed document together with its entity tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub value: T,
    pub etag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Parameterized query: equality filters on top-level fields plus an optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, SortDirection)>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order_by = Some((field.to_string(), SortDirection::Descending));
        self
    }

    pub fn order_by_asc(mut self, field: &str) -> Self {
        self.order_by = Some((field.to_string(), SortDirection::Ascending));
        self
    }

    /// Whether a document satisfies every equality filter.
    pub fn matches(&self, body: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| body.get(field) == Some(expected))
    }

    /// Sorts documents in place according to `order_by`. Stable.
    pub fn sort(&self, docs: &mut [RawDocument]) {
        if let Some((field, direction)) = &self.order_by {
            docs.sort_by(|a, b| {
                let ord = compare_values(a.body.get(field), b.body.get(field));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
    }
}

/// Orders missing < null < numbers < strings; other types compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Backend contract for a document database.
///
/// Documents are JSON objects with a string `id` and a string partition key
/// at the container's partition key path. Every write assigns a new etag.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document, failing with `Conflict` if it already exists.
    async fn create(&self, container: ContainerName, body: Value)
    -> Result<RawDocument, StoreError>;

    /// Inserts or fully replaces a document.
    async fn upsert(&self, container: ContainerName, body: Value)
    -> Result<RawDocument, StoreError>;

    /// Replaces a document only if its current etag equals `etag`.
    async fn replace_if_match(
        &self,
        container: ContainerName,
        body: Value,
        etag: &str,
    ) -> Result<RawDocument, StoreError>;

    /// Returns the documents matching `spec`, ordered as requested.
    async fn query(
        &self,
        container: ContainerName,
        spec: &QuerySpec,
    ) -> Result<Vec<RawDocument>, StoreError>;
}

/// Extracts `(partition_key, id)` from a document, validating both are strings.
pub fn document_keys(container: ContainerName, body: &Value) -> Result<(String, String), StoreError> {
    let field = |name: &str| {
        body.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::InvalidDocument {
                container,
                reason: format!("missing string field '{}'", name),
            })
    };

    let id = field("id")?;
    let partition_key = field(container.partition_key_path())?;
    Ok((partition_key, id))
}

/// Connection handle shared by every service. Opened once at startup.
#[derive(Clone)]
pub struct DocumentClient {
    store: Arc<dyn DocumentStore>,
}

impl DocumentClient {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn container(&self, name: ContainerName) -> Container {
        Container {
            store: self.store.clone(),
            name,
        }
    }
}

/// Typed access to one named container.
#[derive(Clone)]
pub struct Container {
    store: Arc<dyn DocumentStore>,
    name: ContainerName,
}

impl Container {
    pub fn name(&self) -> ContainerName {
        self.name
    }

    pub async fn create<T>(&self, item: &T) -> Result<Stored<T>, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let raw = self.store.create(self.name, serde_json::to_value(item)?).await?;
        decode(raw)
    }

    pub async fn upsert<T>(&self, item: &T) -> Result<Stored<T>, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let raw = self.store.upsert(self.name, serde_json::to_value(item)?).await?;
        decode(raw)
    }

    pub async fn replace_if_match<T>(&self, item: &T, etag: &str) -> Result<Stored<T>, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let raw = self
            .store
            .replace_if_match(self.name, serde_json::to_value(item)?, etag)
            .await?;
        decode(raw)
    }

    pub async fn query<T>(&self, spec: &QuerySpec) -> Result<Vec<Stored<T>>, StoreError>
    where
        T: DeserializeOwned,
    {
        self.store
            .query(self.name, spec)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }
}

fn decode<T: DeserializeOwned>(raw: RawDocument) -> Result<Stored<T>, StoreError> {
    Ok(Stored {
        value: serde_json::from_value(raw.body)?,
        etag: raw.etag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(body: Value) -> RawDocument {
        RawDocument {
            body,
            etag: String::new(),
        }
    }

    #[test]
    fn filters_require_exact_match() {
        let spec = QuerySpec::new().filter_eq("postId", "p1");
        assert!(spec.matches(&json!({"id": "a", "postId": "p1"})));
        assert!(!spec.matches(&json!({"id": "a", "postId": "p2"})));
        assert!(!spec.matches(&json!({"id": "a"})));
    }

    #[test]
    fn sorts_descending_by_string_field() {
        let spec = QuerySpec::new().order_by_desc("createdAt");
        let mut docs = vec![
            raw(json!({"createdAt": "2024-01-01T00:00:00.000Z"})),
            raw(json!({"createdAt": "2024-03-01T00:00:00.000Z"})),
            raw(json!({"createdAt": "2024-02-01T00:00:00.000Z"})),
        ];
        spec.sort(&mut docs);

        let order: Vec<&str> = docs
            .iter()
            .map(|d| d.body["createdAt"].as_str().unwrap())
            .collect();
        assert_eq!(
            order,
            [
                "2024-03-01T00:00:00.000Z",
                "2024-02-01T00:00:00.000Z",
                "2024-01-01T00:00:00.000Z"
            ]
        );
    }

    #[test]
    fn document_keys_use_partition_key_path() {
        let body = json!({"id": "c1", "postId": "p1"});
        assert_eq!(
            document_keys(ContainerName::Comments, &body).unwrap(),
            ("p1".to_string(), "c1".to_string())
        );
        assert_eq!(
            document_keys(ContainerName::Posts, &body).unwrap(),
            ("c1".to_string(), "c1".to_string())
        );

        let err = document_keys(ContainerName::Ratings, &json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument { .. }));
    }
}
