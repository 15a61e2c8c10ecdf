//! Market data domain: cache policy, upstream transport and the service
//! that ties them to the resilience layer.

mod keys;
mod service;
mod upstream;

pub use keys::{cache_key, CachePrefix, CacheTtl};
pub use service::MarketService;
pub use upstream::{unwrap_envelope, Exchange, UpstreamClient, UpstreamError};
