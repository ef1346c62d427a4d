use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Serialize;

use super::{DocumentStore, StoreError, StoreResult};

/// In-memory store for tests/dev.
#[derive(Debug)]
pub struct InMemoryDocumentStore<K, V> {
    inner: RwLock<Inner<K, V>>,
}

#[derive(Debug)]
struct Inner<K, V> {
    docs: HashMap<K, (u64, V)>,
    next_seq: u64,
}

impl<K, V> InMemoryDocumentStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                docs: HashMap::new(),
                next_seq: 0,
            }),
        }
    }
}

impl<K, V> Default for InMemoryDocumentStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl<K, V> DocumentStore<K, V> for InMemoryDocumentStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Serialize + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> StoreResult<Option<V>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.docs.get(key).map(|(_, v)| v.clone()))
    }

    async fn insert(&self, key: K, value: V) -> StoreResult<bool> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        if inner.docs.contains_key(&key) {
            return Ok(false);
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.docs.insert(key, (seq, value));
        Ok(true)
    }

    async fn upsert(&self, key: K, value: V) -> StoreResult<()> {
        let mut guard = self.inner.write().map_err(|_| poisoned())?;
        let inner = &mut *guard;
        if let Some(slot) = inner.docs.get_mut(&key) {
            slot.1 = value;
            return Ok(());
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.docs.insert(key, (seq, value));
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<V>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let mut docs: Vec<&(u64, V)> = inner.docs.values().collect();
        docs.sort_by_key(|(seq, _)| *seq);
        Ok(docs.into_iter().map(|(_, v)| v.clone()).collect())
    }

    async fn list_where(&self, field: &'static str, value: &str) -> StoreResult<Vec<V>> {
        let mut matching = Vec::new();
        for doc in self.list().await? {
            let body = serde_json::to_value(&doc).map_err(|e| StoreError::Corrupt(e.to_string()))?;
            if body.get(field).and_then(serde_json::Value::as_str) == Some(value) {
                matching.push(doc);
            }
        }
        Ok(matching)
    }

    async fn remove(&self, key: &K) -> StoreResult<bool> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        Ok(inner.docs.remove(key).is_some())
    }
}
