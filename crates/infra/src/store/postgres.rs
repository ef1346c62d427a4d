//! Postgres-backed document store.
//!
//! All collections share one table; documents are JSONB bodies keyed by
//! `(collection, id)`. The primary key makes `insert` race-free across
//! processes, which the ledger relies on to apply a transition id once.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database / PoolClosed / other | `Backend` |
//! | JSON decode of a stored body | `Corrupt` |

use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::instrument;

use super::{DocumentStore, StoreError, StoreResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body JSONB NOT NULL,
    seq BIGSERIAL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (collection, id)
)
"#;

/// Backs per-user ledger reads (`list_where("user_id", ..)`).
const USER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS documents_user_id_idx
    ON documents (collection, (body->>'user_id'))
"#;

pub async fn connect(url: &str, max_connections: u32) -> StoreResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create the `documents` table and its indexes if they do not exist.
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    for ddl in [SCHEMA, USER_INDEX] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
    }
    Ok(())
}

#[derive(Debug)]
pub struct PostgresDocumentStore<K, V> {
    pool: Arc<PgPool>,
    collection: &'static str,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> PostgresDocumentStore<K, V> {
    pub fn new(pool: PgPool, collection: &'static str) -> Self {
        Self {
            pool: Arc::new(pool),
            collection,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<K, V> DocumentStore<K, V> for PostgresDocumentStore<K, V>
where
    K: Display + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    #[instrument(skip_all, fields(id = %key), err)]
    async fn get(&self, key: &K) -> StoreResult<Option<V>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(self.collection)
            .bind(key.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.map(|r| decode_body(&r)).transpose()
    }

    #[instrument(skip_all, fields(id = %key), err)]
    async fn insert(&self, key: K, value: V) -> StoreResult<bool> {
        let body = encode_body(&value)?;
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(self.collection)
        .bind(key.to_string())
        .bind(body)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip_all, fields(id = %key), err)]
    async fn upsert(&self, key: K, value: V) -> StoreResult<()> {
        let body = encode_body(&value)?;
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET
                body = EXCLUDED.body,
                updated_at = NOW()
            "#,
        )
        .bind(self.collection)
        .bind(key.to_string())
        .bind(body)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert", e))?;
        Ok(())
    }

    #[instrument(skip_all, err)]
    async fn list(&self) -> StoreResult<Vec<V>> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = $1 ORDER BY seq ASC")
            .bind(self.collection)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(decode_body).collect()
    }

    #[instrument(skip_all, fields(field = field, value = %value), err)]
    async fn list_where(&self, field: &'static str, value: &str) -> StoreResult<Vec<V>> {
        let rows = sqlx::query(
            "SELECT body FROM documents WHERE collection = $1 AND body->>$2 = $3 ORDER BY seq ASC",
        )
        .bind(self.collection)
        .bind(field)
        .bind(value)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_where", e))?;

        rows.iter().map(decode_body).collect()
    }

    #[instrument(skip_all, fields(id = %key), err)]
    async fn remove(&self, key: &K) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(self.collection)
            .bind(key.to_string())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn encode_body<V: Serialize>(value: &V) -> StoreResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn decode_body<V: DeserializeOwned>(row: &sqlx::postgres::PgRow) -> StoreResult<V> {
    let body: serde_json::Value = row
        .try_get("body")
        .map_err(|e| map_sqlx_error("decode", e))?;
    serde_json::from_value(body).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Backend(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
