//! Retry with exponential backoff and jitter.
//!
//! # Delay schedule
//! ```text
//! wait before attempt i+1 = min(base_delay * 2^i, max_delay) * (1 ± jitter)
//! ```
//! The jittered delay is clamped at zero. Waits use `tokio::time::sleep`, so
//! only the calling task is suspended and dropping the future aborts the wait.

use std::fmt::Display;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

/// Default jitter: delays vary uniformly within ±25%.
pub const DEFAULT_JITTER: f64 = 0.25;

// == Retry Config ==
/// Backoff parameters for one call site.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt (`max_retries + 1` attempts in total)
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap applied before jitter
    pub max_delay: Duration,
    /// Fraction of the delay used as jitter amplitude, in `[0, 1]`
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: DEFAULT_JITTER,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            jitter: DEFAULT_JITTER,
        }
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Un-jittered delay before attempt `attempt + 1`.
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Jittered delay before attempt `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let unit = rand::thread_rng().gen_range(-1.0..=1.0);
        apply_jitter(self.base_backoff(attempt), self.jitter, unit)
    }
}

/// Scales `delay` by `1 + fraction * unit`, where `unit` lies in `[-1, 1]`.
pub fn apply_jitter(delay: Duration, fraction: f64, unit: f64) -> Duration {
    let factor = 1.0 + fraction * unit.clamp(-1.0, 1.0);
    if factor == 1.0 {
        return delay;
    }
    Duration::from_secs_f64((delay.as_secs_f64() * factor).max(0.0))
}

type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type RetryObserver<E> = Arc<dyn Fn(&E, u32) + Send + Sync>;

// == Retrier ==
/// Runs a fallible async operation under a [`RetryConfig`].
///
/// Every error is retried unless a predicate says otherwise. When attempts
/// run out, the last error is returned unchanged.
pub struct Retrier<E> {
    config: RetryConfig,
    retryable: Option<RetryPredicate<E>>,
    on_retry: Option<RetryObserver<E>>,
}

impl<E> Clone for Retrier<E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            retryable: self.retryable.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<E: Display> Retrier<E> {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            retryable: None,
            on_retry: None,
        }
    }

    /// Restricts retries to errors for which `predicate` returns true.
    pub fn retry_if(mut self, predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.retryable = Some(Arc::new(predicate));
        self
    }

    /// Registers a hook called with `(error, attempt)` for every failed
    /// attempt that is about to be retried. A panicking hook is logged and
    /// otherwise ignored.
    pub fn on_retry(mut self, observer: impl Fn(&E, u32) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let total = self.config.max_retries + 1;
        let mut attempt: u32 = 0;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let retryable = self.retryable.as_ref().map_or(true, |pred| pred(&err));
            if !retryable {
                return Err(err);
            }

            if attempt >= self.config.max_retries {
                error!("Retry exhausted after {} attempts: {}", total, err);
                return Err(err);
            }

            let delay = self.config.backoff(attempt);
            warn!(
                "Attempt {}/{} failed: {}. Retrying in {:.2}s",
                attempt + 1,
                total,
                err,
                delay.as_secs_f64()
            );

            if let Some(observer) = &self.on_retry {
                let observed = catch_unwind(AssertUnwindSafe(|| observer(&err, attempt + 1)));
                if observed.is_err() {
                    warn!("Retry observer panicked on attempt {}", attempt + 1);
                }
            }

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Retries `operation` on every error under `config`.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    Retrier::new(config.clone()).run(operation).await
}
