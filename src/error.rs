//! Error types for the HTTP surface
//!
//! Maps resilience and upstream failures onto HTTP responses using thiserror.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::market::UpstreamError;
use crate::resilience::ResilienceError;

// == App Error Enum ==
/// Unified error type for the proxy's handlers.
#[derive(Error, Debug)]
pub enum AppError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Circuit breaker is failing fast
    #[error("Upstream temporarily unavailable, retry after {:.1}s", .0.as_secs_f64())]
    CircuitOpen(Duration),

    /// Upstream failed after retries
    #[error("Upstream error: {0}")]
    Upstream(UpstreamError),
}

impl From<ResilienceError<UpstreamError>> for AppError {
    fn from(err: ResilienceError<UpstreamError>) -> Self {
        match err {
            ResilienceError::CircuitOpen { retry_after } => AppError::CircuitOpen(retry_after),
            ResilienceError::Upstream(UpstreamError::InvalidExchange(code)) => {
                AppError::InvalidRequest(format!("Invalid exchange: {}", code))
            }
            ResilienceError::Upstream(err) => AppError::Upstream(err),
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        AppError::from(ResilienceError::Upstream(err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(UpstreamError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        let mut response = (status, body).into_response();
        if let AppError::CircuitOpen(retry_after) = &self {
            // Whole seconds, rounded up
            let secs = retry_after.as_millis().div_ceil(1000);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

// == Result Type Alias ==
/// Convenience Result type for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_open_maps_to_503_with_retry_after() {
        let err = AppError::from(ResilienceError::<UpstreamError>::CircuitOpen {
            retry_after: Duration::from_millis(2100),
        });
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "3");
    }

    #[test]
    fn test_upstream_errors_map_to_gateway_statuses() {
        let timeout = AppError::from(UpstreamError::Timeout).into_response();
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let status = AppError::from(UpstreamError::Status(500)).into_response();
        assert_eq!(status.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invalid_exchange_is_a_bad_request() {
        let err = AppError::from(UpstreamError::InvalidExchange("nyse".into()));
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found() {
        let response = AppError::NotFound("market:VNM".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
