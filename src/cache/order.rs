//! Insertion Order Module
//!
//! Tracks the order in which keys entered the cache so that capacity
//! pressure can drop the oldest ones first.

use std::collections::VecDeque;

// == Insertion Order ==
/// Keys in first-insertion order.
///
/// - Front = oldest insertion
/// - Back = newest insertion
///
/// Reads never reorder keys; this is not an LRU.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<String>,
}

impl InsertionOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push ==
    /// Records a newly inserted key at the back.
    ///
    /// Callers only push keys that were not already present.
    pub fn push(&mut self, key: &str) {
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Retain ==
    /// Keeps only the keys for which `keep` returns true, in a single pass.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.order.retain(|k| keep(k));
    }

    // == Drain Oldest ==
    /// Removes and returns up to `count` of the oldest keys.
    pub fn drain_oldest(&mut self, count: usize) -> Vec<String> {
        let count = count.min(self.order.len());
        self.order.drain(..count).collect()
    }

    // == Peek Oldest ==
    /// Returns the oldest key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.front()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
