//! Errors surfaced by the resilience layer.

use std::time::Duration;

use thiserror::Error;

// == Resilience Error ==
/// Failure of a guarded call.
///
/// Either the breaker refused the call, or the upstream failed and its
/// original error is carried through untouched.
#[derive(Error, Debug)]
pub enum ResilienceError<E> {
    /// The circuit is open; no upstream call was made
    #[error("circuit is open, retry after {:.1}s", .retry_after.as_secs_f64())]
    CircuitOpen { retry_after: Duration },

    /// The upstream call failed (after any retries)
    #[error("{0}")]
    Upstream(E),
}

impl<E> ResilienceError<E> {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen { .. })
    }

    /// Returns the upstream error, if this is one.
    pub fn into_upstream(self) -> Option<E> {
        match self {
            ResilienceError::Upstream(err) => Some(err),
            ResilienceError::CircuitOpen { .. } => None,
        }
    }
}
