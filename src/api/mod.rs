//! API Module
//!
//! HTTP handlers and routing for the market data proxy.
//!
//! # Endpoints
//! - `GET /stocks/exchange/:exchange` - Stock board for HOSE, HNX or UPCOM
//! - `GET /warrants/exchange/:exchange` - Covered warrant board for HOSE or HNX
//! - `DELETE /cache`, `DELETE /cache/:key` - Cache administration
//! - `POST /breaker/reset` - Circuit breaker administration
//! - `GET /stats` - Cache statistics and breaker state
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
