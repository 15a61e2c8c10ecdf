//! Cache Store Module
//!
//! Single-owner cache engine: HashMap storage, insertion-order tracking and
//! TTL expiry. Every operation takes the current instant explicitly so the
//! eviction rules are deterministic for a given sequence of calls.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, InsertionOrder};

// == Cache Store ==
/// Bounded key/value storage with per-entry expiry.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// First-insertion order of present keys
    order: InsertionOrder,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL applied when `set` is called without one
    default_ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
            default_ttl,
        }
    }

    // == Set ==
    /// Stores `value` under `key`, expiring `ttl` (or the default) after `now`.
    ///
    /// When the store is at capacity, expired entries are purged first; if it
    /// is still full, the oldest tenth of entries by insertion order is
    /// dropped (at least one). Overwriting a key keeps its insertion position.
    pub fn set(&mut self, key: String, value: V, ttl: Option<Duration>, now: Instant) {
        if self.entries.len() >= self.max_entries {
            self.purge_expired(now);

            if self.entries.len() >= self.max_entries {
                let count = (self.max_entries / 10).max(1);
                let evicted = self.order.drain_oldest(count);
                for k in &evicted {
                    self.entries.remove(k);
                }
                self.stats.record_evictions(evicted.len());
                debug!(
                    "Cache at capacity ({}), evicted {} oldest entries",
                    self.max_entries,
                    evicted.len()
                );
            }
        }

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl), now);
        if self.entries.insert(key.clone(), entry).is_none() {
            self.order.push(&key);
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the value for `key` if present and unexpired at `now`.
    ///
    /// An expired entry is removed as a side effect and reported as a miss.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.stats.record_hit();
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
            self.order.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
        }
        self.stats.record_miss();
        None
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Removes every entry. Counters other than `total_entries` are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats.set_total_entries(0);
    }

    // == Purge Expired ==
    /// Removes all entries expired at `now`, returning how many were dropped.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        if expired_keys.is_empty() {
            return 0;
        }

        for key in &expired_keys {
            self.entries.remove(key);
        }
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));

        self.stats.record_expirations(expired_keys.len());
        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the number of entries, expired-but-unread ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
