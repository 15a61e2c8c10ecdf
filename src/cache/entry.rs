//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

/// Expiry used when `now + ttl` is not representable (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

// == Cache Entry ==
/// A single cached value together with its absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant after which the entry must no longer be served
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry that expires `ttl` after `now`.
    ///
    /// TTLs too large for the clock are capped at roughly thirty years.
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so a
    /// lookup landing exactly on the expiry instant is already a miss.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining lifetime at `now`, saturating at zero.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new("quote", Duration::from_secs(10), now);

        assert_eq!(entry.value, "quote");
        assert_eq!(entry.expires_at, now + Duration::from_secs(10));
        assert!(!entry.is_expired_at(now));
    }

    #[test]
    fn test_entry_expiration() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, Duration::from_secs(1), now);

        assert!(!entry.is_expired_at(now + Duration::from_millis(999)));
        assert!(entry.is_expired_at(now + Duration::from_millis(1001)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, Duration::from_secs(5), now);

        // Entry should be expired when current time >= expires_at
        assert!(
            entry.is_expired_at(now + Duration::from_secs(5)),
            "Entry should be expired at boundary"
        );
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, Duration::ZERO, now);
        assert!(entry.is_expired_at(now));
    }

    #[test]
    fn test_huge_ttl_is_capped_instead_of_overflowing() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, Duration::MAX, now);

        assert!(!entry.is_expired_at(now + Duration::from_secs(86_400 * 365)));
        assert!(entry.ttl_remaining(now) >= Duration::from_secs(86_400 * 365 * 29));
    }

    #[test]
    fn test_ttl_remaining() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, Duration::from_secs(10), now);

        assert_eq!(
            entry.ttl_remaining(now + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
        assert_eq!(
            entry.ttl_remaining(now + Duration::from_secs(30)),
            Duration::ZERO
        );
    }
}
