//! Cache Entry Module
//!
//! Defines the values held by the cache and the memory tier entry with TTL support.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

// == Cached Value ==
/// A value stored in the cache.
///
/// Only `Bytes` payloads are mirrored to disk. `Opaque` values live in the
/// memory tier alone and do not survive a restart.
#[derive(Clone)]
pub enum CachedValue {
    /// Raw payload, persisted to the disk tier
    Bytes(Vec<u8>),
    /// Arbitrary in-process value, memory tier only
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl CachedValue {
    /// Wraps any shareable value as an `Opaque` payload.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        CachedValue::Opaque(Arc::new(value))
    }

    /// Returns true if this value is written to the disk tier.
    pub fn is_persistable(&self) -> bool {
        matches!(self, CachedValue::Bytes(_))
    }

    /// Borrows the raw payload, if this is a `Bytes` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CachedValue::Bytes(bytes) => Some(bytes),
            CachedValue::Opaque(_) => None,
        }
    }

    /// Consumes the value, returning the raw payload if there is one.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            CachedValue::Bytes(bytes) => Some(bytes),
            CachedValue::Opaque(_) => None,
        }
    }

    /// Returns the `Opaque` value as `T`, if it is one.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            CachedValue::Opaque(value) => Arc::clone(value).downcast::<T>().ok(),
            CachedValue::Bytes(_) => None,
        }
    }
}

impl From<Vec<u8>> for CachedValue {
    fn from(bytes: Vec<u8>) -> Self {
        CachedValue::Bytes(bytes)
    }
}

impl From<&[u8]> for CachedValue {
    fn from(bytes: &[u8]) -> Self {
        CachedValue::Bytes(bytes.to_vec())
    }
}

impl fmt::Debug for CachedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachedValue::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            CachedValue::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

// == Cache Entry ==
/// Represents a single memory tier entry with value and expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: CachedValue,
    /// Absolute expiration instant
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring at `expires_at`.
    pub fn new(value: CachedValue, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// An entry is still live at exactly `expires_at` and expired one tick later.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL as of `now`, zero once expired.
    pub fn ttl_remaining_at(&self, now: DateTime<Utc>) -> Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}

// == Utility Functions ==
/// Longest TTL honoured; longer TTLs are clamped so the expiry stays a
/// four-digit-year RFC 3339 timestamp on disk.
pub const MAX_TTL: std::time::Duration = std::time::Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Computes `now + ttl`, clamping `ttl` to [`MAX_TTL`].
pub fn expiry_from(now: DateTime<Utc>, ttl: std::time::Duration) -> DateTime<Utc> {
    let ttl = Duration::from_std(ttl.min(MAX_TTL)).unwrap_or_else(|_| Duration::zero());
    now + ttl
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[derive(Debug, PartialEq)]
    struct Forecast {
        high: i32,
    }

    #[test]
    fn test_bytes_value_is_persistable() {
        let value = CachedValue::from(vec![1u8, 2, 3]);
        assert!(value.is_persistable());
        assert_eq!(value.as_bytes(), Some(&[1u8, 2, 3][..]));
        assert!(value.downcast::<Forecast>().is_none());
        assert_eq!(value.into_bytes(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_opaque_value_downcasts() {
        let value = CachedValue::opaque(Forecast { high: 21 });
        assert!(!value.is_persistable());
        assert!(value.as_bytes().is_none());
        assert_eq!(*value.downcast::<Forecast>().unwrap(), Forecast { high: 21 });
        assert!(value.downcast::<String>().is_none());
    }

    #[test]
    fn test_entry_not_expired_before_deadline() {
        let entry = CacheEntry::new(CachedValue::from(&b"x"[..]), t0() + Duration::seconds(60));
        assert!(!entry.is_expired_at(t0()));
        assert_eq!(entry.ttl_remaining_at(t0()), Duration::seconds(60));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(CachedValue::from(&b"x"[..]), t0());

        assert!(!entry.is_expired_at(t0()), "Entry is live at its deadline");
        assert!(entry.is_expired_at(t0() + Duration::milliseconds(1)));
        assert_eq!(entry.ttl_remaining_at(t0() + Duration::seconds(5)), Duration::zero());
    }

    #[test]
    fn test_expiry_from_adds_ttl() {
        let expires = expiry_from(t0(), std::time::Duration::from_secs(300));
        assert_eq!(expires, t0() + Duration::seconds(300));
    }

    #[test]
    fn test_expiry_from_clamps_huge_ttl() {
        let expires = expiry_from(t0(), std::time::Duration::MAX);
        assert_eq!(expires, expiry_from(t0(), MAX_TTL));
        assert!(expires > t0() + Duration::days(365 * 99));
    }

    #[test]
    fn test_debug_hides_payload() {
        let value = CachedValue::from(vec![0u8; 512]);
        assert_eq!(format!("{:?}", value), "Bytes(512)");
        assert_eq!(format!("{:?}", CachedValue::opaque(1u32)), "Opaque(..)");
    }
}
