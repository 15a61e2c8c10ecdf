//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - HalfOpen: one probe call is testing whether the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed   → Open:     failure_count reaches failure_threshold
//! Open     → HalfOpen: first call after recovery_timeout since the last failure
//! HalfOpen → Closed:   probe succeeds (failure_count = 0)
//! HalfOpen → Open:     probe fails (cooldown restarts)
//! ```
//!
//! State lives behind a short-lived mutex. The guarded operation itself runs
//! with the lock released, so a slow upstream never blocks state reads.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::resilience::ResilienceError;

/// State of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - calls pass through
    Closed,
    /// Failing fast until the cooldown elapses
    Open,
    /// A single probe call is in flight
    HalfOpen,
}

/// Point-in-time view of a breaker, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    /// Seconds until an Open circuit admits a probe; zero otherwise
    pub retry_after_secs: f64,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    probe_in_flight: bool,
    /// Bumped by `reset`; outcomes admitted under an older generation
    /// can no longer act as the half-open probe.
    generation: u64,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure: None,
            probe_in_flight: false,
            generation: 0,
        }
    }
}

/// How a call was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Probe,
}

/// Three-state circuit breaker wrapping async operations.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerState>,
    failure_threshold: u32,
    recovery_timeout: Duration,
}

impl CircuitBreaker {
    /// Creates a closed breaker. A threshold of zero is raised to one.
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(BreakerState::closed()),
            failure_threshold: failure_threshold.max(1),
            recovery_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    pub fn is_closed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn recovery_timeout(&self) -> Duration {
        self.recovery_timeout
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        let retry_after = match inner.state {
            CircuitState::Open => self.remaining_cooldown(&inner, Instant::now()),
            _ => Duration::ZERO,
        };
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            retry_after_secs: retry_after.as_secs_f64(),
        }
    }

    /// Runs `operation` through the breaker.
    ///
    /// Returns [`ResilienceError::CircuitOpen`] without invoking `operation`
    /// when the circuit is open (or a half-open probe is already in flight);
    /// otherwise the operation's own error is passed through as
    /// [`ResilienceError::Upstream`].
    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let (admission, generation) = self.admit()?;
        let mut guard = ProbeGuard {
            breaker: self,
            armed: admission == Admission::Probe,
            generation,
        };

        let outcome = operation().await;
        guard.armed = false;

        match outcome {
            Ok(value) => {
                self.record_success(admission, generation);
                Ok(value)
            }
            Err(err) => {
                self.record_failure(admission, generation);
                Err(ResilienceError::Upstream(err))
            }
        }
    }

    /// Forces the breaker back to Closed with a zero failure count.
    pub fn reset(&self) {
        let mut inner = self.lock();
        let generation = inner.generation.wrapping_add(1);
        *inner = BreakerState {
            generation,
            ..BreakerState::closed()
        };
        info!("Circuit breaker manually reset to CLOSED");
    }

    fn admit<E>(&self) -> Result<(Admission, u64), ResilienceError<E>> {
        let mut inner = self.lock();
        let generation = inner.generation;
        let admission = match inner.state {
            CircuitState::Closed => Admission::Normal,
            CircuitState::Open => {
                let remaining = self.remaining_cooldown(&inner, Instant::now());
                if remaining.is_zero() {
                    info!("Circuit breaker transitioning to HALF_OPEN");
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_in_flight = true;
                    Admission::Probe
                } else {
                    return Err(ResilienceError::CircuitOpen {
                        retry_after: remaining,
                    });
                }
            }
            CircuitState::HalfOpen if inner.probe_in_flight => {
                return Err(ResilienceError::CircuitOpen {
                    retry_after: Duration::ZERO,
                })
            }
            CircuitState::HalfOpen => {
                inner.probe_in_flight = true;
                Admission::Probe
            }
        };
        Ok((admission, generation))
    }

    /// A probe admitted before a reset reports as an ordinary call.
    fn current(inner: &BreakerState, admission: Admission, generation: u64) -> Admission {
        if inner.generation == generation {
            admission
        } else {
            Admission::Normal
        }
    }

    fn remaining_cooldown(&self, inner: &BreakerState, now: Instant) -> Duration {
        match inner.last_failure {
            Some(at) => self
                .recovery_timeout
                .saturating_sub(now.saturating_duration_since(at)),
            None => Duration::ZERO,
        }
    }

    fn record_success(&self, admission: Admission, generation: u64) {
        let mut inner = self.lock();
        match (Self::current(&inner, admission, generation), inner.state) {
            (Admission::Probe, _) => {
                info!("Circuit breaker probe succeeded, closing circuit");
                let generation = inner.generation;
                *inner = BreakerState {
                    generation,
                    ..BreakerState::closed()
                };
            }
            (Admission::Normal, CircuitState::Closed) => inner.failure_count = 0,
            // Late success of a call admitted before the circuit opened
            (Admission::Normal, _) => {}
        }
    }

    fn record_failure(&self, admission: Admission, generation: u64) {
        let mut inner = self.lock();
        let admission = Self::current(&inner, admission, generation);
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(Instant::now());

        match (admission, inner.state) {
            (Admission::Probe, _) => {
                warn!("Circuit breaker probe failed, reopening circuit");
                inner.state = CircuitState::Open;
                inner.probe_in_flight = false;
            }
            (Admission::Normal, CircuitState::Closed)
                if inner.failure_count >= self.failure_threshold =>
            {
                warn!(
                    "Circuit breaker failure threshold ({}) reached, opening circuit for {:.1}s",
                    self.failure_threshold,
                    self.recovery_timeout.as_secs_f64()
                );
                inner.state = CircuitState::Open;
            }
            _ => {}
        }
    }
}

/// Frees the half-open probe slot if the probe future is dropped before
/// reporting an outcome.
struct ProbeGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
    generation: u64,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = self.breaker.lock();
            if inner.generation == self.generation {
                inner.probe_in_flight = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    async fn fail(breaker: &CircuitBreaker) -> Result<(), ResilienceError<&'static str>> {
        breaker.call(|| async { Err("upstream down") }).await
    }

    async fn succeed(breaker: &CircuitBreaker) -> Result<u32, ResilienceError<&'static str>> {
        breaker.call(|| async { Ok(7) }).await
    }

    async fn trip(breaker: &CircuitBreaker) {
        for _ in 0..breaker.failure_threshold() {
            let _ = fail(breaker).await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_starts_closed() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(5));
        assert!(breaker.is_closed());
        assert_eq!(breaker.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_original_error_is_passed_through() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(5));
        match fail(&breaker).await {
            Err(ResilienceError::Upstream(err)) => assert_eq!(err, "upstream down"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failures_below_threshold_stay_closed() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(5));

        let _ = fail(&breaker).await;
        let _ = fail(&breaker).await;

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 2);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(5));

        let _ = fail(&breaker).await;
        let _ = fail(&breaker).await;
        assert_eq!(succeed(&breaker).await.unwrap(), 7);

        assert_eq!(breaker.failure_count(), 0);
        let _ = fail(&breaker).await;
        let _ = fail(&breaker).await;
        assert!(breaker.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_on_threshold_and_fails_fast() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(5));
        trip(&breaker).await;

        let invoked = AtomicU32::new(0);
        let result: Result<(), ResilienceError<&str>> = breaker
            .call(|| async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(ResilienceError::CircuitOpen { .. })));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_error_reports_remaining_cooldown() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(5));
        trip(&breaker).await;

        tokio::time::advance(Duration::from_secs(2)).await;

        match succeed(&breaker).await {
            Err(ResilienceError::CircuitOpen { retry_after }) => {
                assert_eq!(retry_after, Duration::from_secs(3));
            }
            other => panic!("expected fail-fast, got {:?}", other),
        }
        assert_eq!(breaker.snapshot().retry_after_secs, 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_probe_success_closes() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(5));
        trip(&breaker).await;

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert!(succeed(&breaker).await.is_err());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(succeed(&breaker).await.unwrap(), 7);

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_probe_failure_reopens_and_restarts_cooldown() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(5));
        trip(&breaker).await;

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(matches!(
            fail(&breaker).await,
            Err(ResilienceError::Upstream(_))
        ));
        assert_eq!(breaker.state(), CircuitState::Open);

        // The window restarts from the probe failure
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(matches!(
            succeed(&breaker).await,
            Err(ResilienceError::CircuitOpen { .. })
        ));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(succeed(&breaker).await.is_ok());
        assert!(breaker.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_one_probe_at_a_time() {
        let breaker = Arc::new(CircuitBreaker::new(1, Duration::from_secs(5)));
        trip(&breaker).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let (release, hold) = oneshot::channel::<()>();
        let probe_breaker = breaker.clone();
        let probe = tokio::spawn(async move {
            probe_breaker
                .call(|| async move {
                    let _ = hold.await;
                    Ok::<_, &str>("recovered")
                })
                .await
        });

        tokio::task::yield_now().await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        match succeed(&breaker).await {
            Err(ResilienceError::CircuitOpen { retry_after }) => {
                assert_eq!(retry_after, Duration::ZERO)
            }
            other => panic!("second probe should be refused, got {:?}", other),
        }

        release.send(()).unwrap();
        assert_eq!(probe.await.unwrap().unwrap(), "recovered");
        assert!(breaker.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_probe_frees_slot() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(5));
        trip(&breaker).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let pending = breaker.call(|| std::future::pending::<Result<(), &str>>());
        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        assert!(succeed(&breaker).await.is_ok());
        assert!(breaker.is_closed());
    }

    #[tokio::test]
    async fn test_state_readable_while_call_in_flight() {
        let breaker = Arc::new(CircuitBreaker::new(3, Duration::from_secs(5)));

        let (release, hold) = oneshot::channel::<()>();
        let slow_breaker = breaker.clone();
        let slow = tokio::spawn(async move {
            slow_breaker
                .call(|| async move {
                    let _ = hold.await;
                    Err::<(), _>("timeout")
                })
                .await
        });

        tokio::task::yield_now().await;
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(succeed(&breaker).await.is_ok());

        release.send(()).unwrap();
        assert!(slow.await.unwrap().is_err());
        assert_eq!(breaker.failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_success_does_not_close_open_circuit() {
        let breaker = Arc::new(CircuitBreaker::new(2, Duration::from_secs(5)));

        let (release, hold) = oneshot::channel::<()>();
        let slow_breaker = breaker.clone();
        let slow = tokio::spawn(async move {
            slow_breaker
                .call(|| async move {
                    let _ = hold.await;
                    Ok::<_, &str>(1)
                })
                .await
        });
        tokio::task::yield_now().await;

        trip(&breaker).await;
        release.send(()).unwrap();
        assert!(slow.await.unwrap().is_ok());

        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_forces_closed() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(30));
        trip(&breaker).await;

        breaker.reset();

        assert!(breaker.is_closed());
        assert_eq!(breaker.failure_count(), 0);
        assert!(succeed(&breaker).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_during_probe_keeps_threshold() {
        let breaker = Arc::new(CircuitBreaker::new(5, Duration::from_secs(5)));
        trip(&breaker).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let (release, hold) = oneshot::channel::<()>();
        let probe_breaker = breaker.clone();
        let probe = tokio::spawn(async move {
            probe_breaker
                .call(|| async move {
                    let _ = hold.await;
                    Err::<(), _>("still down")
                })
                .await
        });
        tokio::task::yield_now().await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.reset();
        release.send(()).unwrap();
        assert!(probe.await.unwrap().is_err());

        // Counted as an ordinary Closed failure, well below the threshold
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_probe_success_does_not_close_new_open_circuit() {
        let breaker = Arc::new(CircuitBreaker::new(1, Duration::from_secs(5)));
        trip(&breaker).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let (release, hold) = oneshot::channel::<()>();
        let probe_breaker = breaker.clone();
        let probe = tokio::spawn(async move {
            probe_breaker
                .call(|| async move {
                    let _ = hold.await;
                    Ok::<_, &str>(1)
                })
                .await
        });
        tokio::task::yield_now().await;

        breaker.reset();
        trip(&breaker).await;

        release.send(()).unwrap();
        assert!(probe.await.unwrap().is_ok());
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_snapshot_serializes_state_names() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(30));
        let json = serde_json::to_value(breaker.snapshot()).unwrap();
        assert_eq!(json["state"], "closed");
        assert_eq!(json["failure_count"], 0);
        assert_eq!(json["retry_after_secs"], 0.0);
    }
}
