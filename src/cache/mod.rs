//! Cache Module
//!
//! Bounded in-memory caching with TTL expiration and insertion-order
//! eviction under capacity pressure.

mod entry;
mod order;
mod stats;
mod store;
mod ttl_cache;


// Re-export public types
pub use entry::CacheEntry;
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::CacheStore;
pub use ttl_cache::TtlCache;
