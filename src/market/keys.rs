//! Cache keys and TTL classes for market data.

use std::time::Duration;

/// How long each kind of market data stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTtl {
    /// Real-time prices and volumes
    MarketData,
    /// Static warrant terms (conversion ratio, exercise price)
    WarrantInfo,
    /// Warrant board for an exchange
    WarrantList,
    /// Stock board for an exchange
    StockList,
}

impl CacheTtl {
    pub fn duration(self) -> Duration {
        match self {
            CacheTtl::MarketData => Duration::from_secs(10),
            CacheTtl::WarrantInfo => Duration::from_secs(60),
            CacheTtl::WarrantList => Duration::from_secs(30),
            CacheTtl::StockList => Duration::from_secs(300),
        }
    }
}

/// Namespaces for cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePrefix {
    MarketData,
    WarrantInfo,
    WarrantList,
    StockList,
}

impl CachePrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            CachePrefix::MarketData => "market",
            CachePrefix::WarrantInfo => "warrant",
            CachePrefix::WarrantList => "warrant_list",
            CachePrefix::StockList => "stock_list",
        }
    }
}

/// Builds `"{prefix}:{SYMBOL}"`, upper-casing the symbol.
pub fn cache_key(prefix: CachePrefix, symbol: &str) -> String {
    format!("{}:{}", prefix.as_str(), symbol.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_uppercases_symbol() {
        assert_eq!(cache_key(CachePrefix::MarketData, "vnm"), "market:VNM");
        assert_eq!(cache_key(CachePrefix::StockList, "hose"), "stock_list:HOSE");
        assert_eq!(cache_key(CachePrefix::WarrantList, "Hnx"), "warrant_list:HNX");
        assert_eq!(cache_key(CachePrefix::WarrantInfo, "cvnm2401"), "warrant:CVNM2401");
    }

    #[test]
    fn test_ttl_classes() {
        assert_eq!(CacheTtl::MarketData.duration(), Duration::from_secs(10));
        assert_eq!(CacheTtl::WarrantInfo.duration(), Duration::from_secs(60));
        assert_eq!(CacheTtl::WarrantList.duration(), Duration::from_secs(30));
        assert_eq!(CacheTtl::StockList.duration(), Duration::from_secs(300));
    }
}
