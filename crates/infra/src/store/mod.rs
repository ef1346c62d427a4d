//! Keyed document storage, one store per collection.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use in_memory::InMemoryDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored document could not be decoded: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A collection of documents of type `V` keyed by `K`.
///
/// `list` returns documents in insertion order.
#[async_trait]
pub trait DocumentStore<K, V>: Send + Sync {
    async fn get(&self, key: &K) -> StoreResult<Option<V>>;

    /// Insert unless `key` is taken. Returns `false` (and stores nothing) if it is.
    async fn insert(&self, key: K, value: V) -> StoreResult<bool>;

    async fn upsert(&self, key: K, value: V) -> StoreResult<()>;

    async fn list(&self) -> StoreResult<Vec<V>>;

    /// Documents whose top-level string field `field` equals `value`, in
    /// insertion order.
    async fn list_where(&self, field: &'static str, value: &str) -> StoreResult<Vec<V>>;

    /// Returns `true` if a document was removed.
    async fn remove(&self, key: &K) -> StoreResult<bool>;
}
