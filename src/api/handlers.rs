//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::market::{Exchange, MarketService, UpstreamClient, UpstreamError};
use crate::models::{
    BoardResponse, BreakerResponse, ClearResponse, DeleteResponse, HealthResponse, StatsResponse,
};
use crate::resilience::{CircuitBreaker, ResilientFetcher, RetryConfig};

/// Application state shared across all handlers.
///
/// `cache` and `breaker` are the same handles the market service uses.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<TtlCache<Value>>,
    pub breaker: Arc<CircuitBreaker>,
    pub market: MarketService,
}

impl AppState {
    /// Creates a new AppState around existing cache and breaker handles.
    pub fn new(
        cache: Arc<TtlCache<Value>>,
        breaker: Arc<CircuitBreaker>,
        retry: RetryConfig,
        upstream: UpstreamClient,
    ) -> Self {
        let fetcher = ResilientFetcher::new(cache.clone(), breaker.clone(), retry);
        Self {
            cache,
            breaker,
            market: MarketService::new(fetcher, upstream),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> std::result::Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(&config.upstream_base_url, config.upstream_timeout())?;
        Ok(Self::new(
            Arc::new(config.ttl_cache()),
            Arc::new(config.circuit_breaker()),
            config.retry_config(),
            upstream,
        ))
    }
}

/// Handler for GET /stocks/exchange/:exchange
pub async fn stocks_handler(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
) -> Result<Json<BoardResponse>> {
    let exchange: Exchange = exchange.parse()?;
    let data = state.market.stocks(exchange).await?;
    Ok(Json(BoardResponse::new(exchange.as_str(), data)))
}

/// Handler for GET /warrants/exchange/:exchange
pub async fn warrants_handler(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
) -> Result<Json<BoardResponse>> {
    let exchange: Exchange = exchange.parse()?;
    let data = state.market.warrants(exchange).await?;
    Ok(Json(BoardResponse::new(exchange.as_str(), data)))
}

/// Handler for DELETE /cache/:key
pub async fn delete_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.delete(&key).await {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(AppError::NotFound(key))
    }
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = state.cache.size().await;
    state.cache.clear().await;
    info!("Cache cleared ({} entries)", cleared);
    Json(ClearResponse::new(cleared))
}

/// Handler for POST /breaker/reset
pub async fn reset_breaker_handler(State(state): State<AppState>) -> Json<BreakerResponse> {
    state.breaker.reset();
    Json(BreakerResponse::reset(state.breaker.snapshot()))
}

/// Handler for GET /stats
///
/// Returns cache statistics and the breaker's current state.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    Json(StatsResponse::new(stats, state.breaker.snapshot()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
