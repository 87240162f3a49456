// src/store/postgres.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, types::Json};
use uuid::Uuid;

use super::{
    ContainerName, DocumentStore, QuerySpec, RawDocument, SortDirection, StoreError,
    document_keys,
};

/// Document store backed by a single PostgreSQL `documents` table.
///
/// Each row holds one JSON document (`body`, JSONB) addressed by
/// `(container, partition_key, id)`. Filters compare JSONB values and ordering
/// compares the text form of the field with the "C" collation, which keeps
/// ISO-8601 timestamps in chronological order.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct DocumentRow {
    body: Json<Value>,
    etag: String,
}

impl From<DocumentRow> for RawDocument {
    fn from(row: DocumentRow) -> Self {
        RawDocument {
            body: row.body.0,
            etag: row.etag,
        }
    }
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(
        &self,
        container: ContainerName,
        body: Value,
    ) -> Result<RawDocument, StoreError> {
        let (partition_key, id) = document_keys(container, &body)?;
        let etag = Uuid::new_v4().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO documents (container, partition_key, id, body, etag)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (container, partition_key, id) DO NOTHING
            "#,
        )
        .bind(container.as_str())
        .bind(&partition_key)
        .bind(&id)
        .bind(Json(&body))
        .bind(&etag)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict { container, id });
        }

        Ok(RawDocument { body, etag })
    }

    async fn upsert(
        &self,
        container: ContainerName,
        body: Value,
    ) -> Result<RawDocument, StoreError> {
        let (partition_key, id) = document_keys(container, &body)?;
        let etag = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO documents (container, partition_key, id, body, etag)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (container, partition_key, id)
            DO UPDATE SET body = EXCLUDED.body, etag = EXCLUDED.etag, updated_at = NOW()
            "#,
        )
        .bind(container.as_str())
        .bind(&partition_key)
        .bind(&id)
        .bind(Json(&body))
        .bind(&etag)
        .execute(&self.pool)
        .await?;

        Ok(RawDocument { body, etag })
    }

    async fn replace_if_match(
        &self,
        container: ContainerName,
        body: Value,
        etag: &str,
    ) -> Result<RawDocument, StoreError> {
        let (partition_key, id) = document_keys(container, &body)?;
        let new_etag = Uuid::new_v4().to_string();

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = $4, etag = $5, updated_at = NOW()
            WHERE container = $1 AND partition_key = $2 AND id = $3 AND etag = $6
            "#,
        )
        .bind(container.as_str())
        .bind(&partition_key)
        .bind(&id)
        .bind(Json(&body))
        .bind(&new_etag)
        .bind(etag)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a vanished document from a lost race.
            let exists = sqlx::query(
                "SELECT 1 FROM documents WHERE container = $1 AND partition_key = $2 AND id = $3",
            )
            .bind(container.as_str())
            .bind(&partition_key)
            .bind(&id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

            return Err(if exists {
                StoreError::PreconditionFailed { container, id }
            } else {
                StoreError::NotFound { container, id }
            });
        }

        Ok(RawDocument {
            body,
            etag: new_etag,
        })
    }

    async fn query(
        &self,
        container: ContainerName,
        spec: &QuerySpec,
    ) -> Result<Vec<RawDocument>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT body, etag FROM documents WHERE container = ");
        builder.push_bind(container.as_str());

        for (field, value) in &spec.filters {
            builder.push(" AND body -> ");
            builder.push_bind(field.clone());
            builder.push(" = ");
            builder.push_bind(Json(value.clone()));
        }

        match &spec.order_by {
            Some((field, direction)) => {
                builder.push(" ORDER BY (body ->> ");
                builder.push_bind(field.clone());
                builder.push(r#") COLLATE "C""#);
                builder.push(match direction {
                    SortDirection::Ascending => " ASC",
                    SortDirection::Descending => " DESC",
                });
            }
            None => {
                builder.push(" ORDER BY created_at ASC");
            }
        }

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(RawDocument::from).collect())
    }
}
