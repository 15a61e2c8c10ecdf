//! Market Proxy - a resilient caching proxy for market board data
//!
//! Serves exchange boards from a TTL cache and guards the upstream with
//! retry, exponential backoff and a circuit breaker.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod market;
pub mod models;
pub mod resilience;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::TtlCache;
pub use config::Config;
pub use resilience::{CircuitBreaker, ResilienceError, ResilientFetcher, Retrier, RetryConfig};
pub use tasks::spawn_cleanup_task;
