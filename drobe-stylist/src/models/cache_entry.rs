//! TTL-wrapped cache entry

use chrono::{DateTime, Duration, Utc};

/// A cached value with its creation time and time-to-live.
///
/// An entry is valid iff `now - created_at < ttl`; an expired entry is
/// logically a miss regardless of physical presence and is purged lazily by
/// the owning cache on next access.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            data,
            created_at,
            ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= self.ttl
    }
}
