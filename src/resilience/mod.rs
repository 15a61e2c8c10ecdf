//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! fetch(key):
//!     → TtlCache::get (hit: return, no upstream involvement)
//!     → CircuitBreaker::call (open: fail fast with CircuitOpen)
//!         → Retrier::run (exponential backoff + jitter)
//!             → upstream operation (owns its own timeout)
//!     → TtlCache::set on success; failures are never cached
//! ```
//!
//! Cache and breaker are explicit instances handed around behind `Arc`; there
//! is no process-global state.

mod circuit_breaker;
mod error;
mod facade;
mod retry;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use error::ResilienceError;
pub use facade::ResilientFetcher;
pub use retry::{apply_jitter, retry, Retrier, RetryConfig, DEFAULT_JITTER};
