//! Upstream market data client.
//!
//! Thin HTTP transport over the market data source. Payloads are passed
//! through as JSON; no field normalisation happens here.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

// == Upstream Error ==
/// Failure talking to the market data source.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Exchange code not served by the requested board
    #[error("Invalid exchange: {0}")]
    InvalidExchange(String),

    /// Request exceeded the client timeout
    #[error("Upstream request timed out")]
    Timeout,

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {0}")]
    Status(u16),

    /// Connection-level failure
    #[error("Upstream transport error: {0}")]
    Transport(String),

    /// Body was not valid JSON
    #[error("Upstream response could not be decoded: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, UpstreamError::InvalidExchange(_))
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            UpstreamError::Status(status.as_u16())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

// == Exchange ==
/// Exchanges served by the market data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Hose,
    Hnx,
    Upcom,
}

impl Exchange {
    /// Lower-case code used in upstream paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Exchange::Hose => "hose",
            Exchange::Hnx => "hnx",
            Exchange::Upcom => "upcom",
        }
    }

    /// Covered warrants only trade on HOSE and HNX.
    pub fn lists_warrants(self) -> bool {
        matches!(self, Exchange::Hose | Exchange::Hnx)
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = UpstreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hose" => Ok(Exchange::Hose),
            "hnx" => Ok(Exchange::Hnx),
            "upcom" => Ok(Exchange::Upcom),
            _ => Err(UpstreamError::InvalidExchange(s.to_string())),
        }
    }
}

// == Upstream Client ==
/// HTTP client for the market data source.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    /// Builds a client with browser-like headers and a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://iboard.ssi.com.vn"));
        headers.insert(REFERER, HeaderValue::from_static("https://iboard.ssi.com.vn/"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stock board for an exchange.
    pub async fn stocks_by_exchange(&self, exchange: Exchange) -> Result<Value, UpstreamError> {
        let path = format!("/stock/exchange/{}", exchange);
        self.get_json(&path, &[("boardId", "MAIN")]).await
    }

    /// Covered warrant board for an exchange.
    pub async fn warrants_by_exchange(&self, exchange: Exchange) -> Result<Value, UpstreamError> {
        if !exchange.lists_warrants() {
            return Err(UpstreamError::InvalidExchange(exchange.to_string()));
        }
        let path = format!("/stock/cw/{}", exchange);
        self.get_json(&path, &[]).await
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.http.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        Ok(unwrap_envelope(body))
    }
}

/// Returns the `data` member of an upstream envelope, or the body itself.
pub fn unwrap_envelope(mut body: Value) -> Value {
    if let Value::Object(map) = &mut body {
        if let Some(data) = map.remove("data") {
            return data;
        }
    }
    body
}
