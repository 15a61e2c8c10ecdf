//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, delete_key_handler, health_handler, reset_breaker_handler,
    stats_handler, stocks_handler, warrants_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /stocks/exchange/:exchange` - Stock board (cached, resilient)
/// - `GET /warrants/exchange/:exchange` - Covered warrant board (cached, resilient)
/// - `DELETE /cache` - Drop every cached entry
/// - `DELETE /cache/:key` - Drop one cached entry
/// - `POST /breaker/reset` - Force the circuit breaker closed
/// - `GET /stats` - Cache statistics and breaker state
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/stocks/exchange/:exchange", get(stocks_handler))
        .route("/warrants/exchange/:exchange", get(warrants_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/:key", delete(delete_key_handler))
        .route("/breaker/reset", post(reset_breaker_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
