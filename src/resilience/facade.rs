//! Cache → breaker → retry composition around one upstream operation.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::TtlCache;
use crate::resilience::{CircuitBreaker, ResilienceError, Retrier, RetryConfig};

/// Serves values from a [`TtlCache`] and, on a miss, fetches them through a
/// [`CircuitBreaker`] wrapping a [`Retrier`].
///
/// Cache and breaker are shared handles, so several fetchers (one per logical
/// upstream endpoint) may share a single cache or a single breaker.
///
/// Concurrent misses on the same key are not coalesced; each one reaches the
/// upstream independently.
pub struct ResilientFetcher<T> {
    cache: Arc<TtlCache<T>>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
}

impl<T> Clone for ResilientFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            breaker: self.breaker.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<T: Clone> ResilientFetcher<T> {
    pub fn new(cache: Arc<TtlCache<T>>, breaker: Arc<CircuitBreaker>, retry: RetryConfig) -> Self {
        Self {
            cache,
            breaker,
            retry,
        }
    }

    pub fn cache(&self) -> &Arc<TtlCache<T>> {
        &self.cache
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Returns the cached value for `key`, or fetches it with `operation`
    /// and caches it for `ttl` (the cache default when `None`).
    ///
    /// Failures are never cached.
    pub async fn fetch<E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        operation: F,
    ) -> Result<T, ResilienceError<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let retrier = Retrier::new(self.retry.clone());
        self.fetch_with(key, ttl, &retrier, operation).await
    }

    /// Like [`fetch`](Self::fetch), with a caller-supplied retrier (for a
    /// retry predicate or an observer hook).
    pub async fn fetch_with<E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        retrier: &Retrier<E>,
        operation: F,
    ) -> Result<T, ResilienceError<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.cache.get(key).await {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }

        debug!("Cache miss for {}, fetching upstream", key);
        let value = self.breaker.call(|| retrier.run(operation)).await?;

        self.cache.set(key, value.clone(), ttl).await;
        Ok(value)
    }
}
