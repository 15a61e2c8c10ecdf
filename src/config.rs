//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::resilience::{CircuitBreaker, RetryConfig};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Consecutive failures before the breaker opens
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before admitting a probe
    pub recovery_timeout: u64,
    /// Retries after the first upstream attempt
    pub max_retries: u32,
    /// Backoff base delay in milliseconds
    pub base_delay_ms: u64,
    /// Backoff cap in milliseconds
    pub max_delay_ms: u64,
    /// Market data source base URL
    pub upstream_base_url: String,
    /// Per-request upstream timeout in seconds
    pub upstream_timeout: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 500)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 30)
    /// - `BREAKER_FAILURE_THRESHOLD` - Failures before opening (default: 5)
    /// - `BREAKER_RECOVERY_TIMEOUT` - Open-state cooldown in seconds (default: 30)
    /// - `RETRY_MAX_RETRIES` - Retries per upstream call (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - Backoff base in milliseconds (default: 500)
    /// - `RETRY_MAX_DELAY_MS` - Backoff cap in milliseconds (default: 10000)
    /// - `UPSTREAM_BASE_URL` - Market data source (default: `https://iboard-query.ssi.com.vn`)
    /// - `UPSTREAM_TIMEOUT` - Upstream request timeout in seconds (default: 15)
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 5)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("CACHE_MAX_ENTRIES", defaults.max_entries),
            default_ttl: env_or("CACHE_DEFAULT_TTL", defaults.default_ttl),
            failure_threshold: env_or("BREAKER_FAILURE_THRESHOLD", defaults.failure_threshold),
            recovery_timeout: env_or("BREAKER_RECOVERY_TIMEOUT", defaults.recovery_timeout),
            max_retries: env_or("RETRY_MAX_RETRIES", defaults.max_retries),
            base_delay_ms: env_or("RETRY_BASE_DELAY_MS", defaults.base_delay_ms),
            max_delay_ms: env_or("RETRY_MAX_DELAY_MS", defaults.max_delay_ms),
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .unwrap_or(defaults.upstream_base_url),
            upstream_timeout: env_or("UPSTREAM_TIMEOUT", defaults.upstream_timeout),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    pub fn circuit_breaker(&self) -> CircuitBreaker {
        CircuitBreaker::new(
            self.failure_threshold,
            Duration::from_secs(self.recovery_timeout),
        )
    }

    pub fn ttl_cache<V: Clone>(&self) -> TtlCache<V> {
        TtlCache::new(self.max_entries, Duration::from_secs(self.default_ttl))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 500,
            default_ttl: 30,
            failure_threshold: 5,
            recovery_timeout: 30,
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            upstream_base_url: "https://iboard-query.ssi.com.vn".to_string(),
            upstream_timeout: 15,
            server_port: 8000,
            cleanup_interval: 5,
        }
    }
}
