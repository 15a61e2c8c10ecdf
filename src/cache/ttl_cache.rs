//! Shared TTL cache handle.
//!
//! Wraps a [`CacheStore`] in a tokio mutex so that every operation is atomic
//! with respect to every other one. The lock is never held across an await
//! point other than its own acquisition.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::cache::{CacheStats, CacheStore};

/// Concurrency-safe key/value cache with per-entry expiry.
#[derive(Debug)]
pub struct TtlCache<V> {
    store: Mutex<CacheStore<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            store: Mutex::new(CacheStore::new(max_entries, default_ttl)),
        }
    }

    /// Returns the value if present and unexpired; expired entries are removed.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.lock().await.get(key, Instant::now())
    }

    /// Stores `value`, overwriting any existing entry for `key`.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.store
            .lock()
            .await
            .set(key.into(), value, ttl, Instant::now());
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.lock().await.delete(key)
    }

    pub async fn clear(&self) {
        self.store.lock().await.clear();
    }

    /// Entry count, expired-but-unread entries included.
    pub async fn size(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn purge_expired(&self) -> usize {
        self.store.lock().await.purge_expired(Instant::now())
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }
}
