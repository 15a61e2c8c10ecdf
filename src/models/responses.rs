//! Response DTOs for the proxy API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::resilience::BreakerSnapshot;

/// Response body for the market board endpoints
#[derive(Debug, Clone, Serialize)]
pub struct BoardResponse {
    /// Upper-case exchange code
    pub exchange: String,
    /// Upstream payload, passed through
    pub data: Value,
}

impl BoardResponse {
    pub fn new(exchange: impl AsRef<str>, data: Value) -> Self {
        Self {
            exchange: exchange.as_ref().to_uppercase(),
            data,
        }
    }
}

/// Response body for DELETE /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Entries present before the clear
    pub cleared: usize,
}

impl ClearResponse {
    pub fn new(cleared: usize) -> Self {
        Self {
            message: format!("Cleared {} cache entries", cleared),
            cleared,
        }
    }
}

/// Cache section of GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for POST /breaker/reset
#[derive(Debug, Clone, Serialize)]
pub struct BreakerResponse {
    pub message: String,
    pub breaker: BreakerSnapshot,
}

impl BreakerResponse {
    pub fn reset(breaker: BreakerSnapshot) -> Self {
        Self {
            message: "Circuit breaker reset".to_string(),
            breaker,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStatsResponse,
    pub breaker: BreakerSnapshot,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, breaker: BreakerSnapshot) -> Self {
        Self {
            cache: cache.into(),
            breaker,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
