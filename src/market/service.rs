//! Market data reads routed through the resilience layer.

use serde_json::Value;

use crate::market::{cache_key, CachePrefix, CacheTtl, Exchange, UpstreamClient, UpstreamError};
use crate::resilience::{ResilienceError, ResilientFetcher, Retrier};

/// Cached, retried and breaker-guarded access to the upstream boards.
#[derive(Clone)]
pub struct MarketService {
    fetcher: ResilientFetcher<Value>,
    upstream: UpstreamClient,
}

impl MarketService {
    pub fn new(fetcher: ResilientFetcher<Value>, upstream: UpstreamClient) -> Self {
        Self { fetcher, upstream }
    }

    pub fn fetcher(&self) -> &ResilientFetcher<Value> {
        &self.fetcher
    }

    /// Stock board for `exchange`, cached under `stock_list:{EXCHANGE}`.
    pub async fn stocks(&self, exchange: Exchange) -> Result<Value, ResilienceError<UpstreamError>> {
        let key = cache_key(CachePrefix::StockList, exchange.as_str());
        self.fetcher
            .fetch_with(
                &key,
                Some(CacheTtl::StockList.duration()),
                &self.retrier(),
                || self.upstream.stocks_by_exchange(exchange),
            )
            .await
    }

    /// Warrant board for `exchange`, cached under `warrant_list:{EXCHANGE}`.
    pub async fn warrants(&self, exchange: Exchange) -> Result<Value, ResilienceError<UpstreamError>> {
        if !exchange.lists_warrants() {
            return Err(ResilienceError::Upstream(UpstreamError::InvalidExchange(
                exchange.to_string(),
            )));
        }

        let key = cache_key(CachePrefix::WarrantList, exchange.as_str());
        self.fetcher
            .fetch_with(
                &key,
                Some(CacheTtl::WarrantList.duration()),
                &self.retrier(),
                || self.upstream.warrants_by_exchange(exchange),
            )
            .await
    }

    fn retrier(&self) -> Retrier<UpstreamError> {
        Retrier::new(self.fetcher.retry_config().clone()).retry_if(UpstreamError::is_retryable)
    }
}
