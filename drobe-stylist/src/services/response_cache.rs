//! In-process response cache with per-entry TTL
//!
//! Sits in front of the marketplace client. Keys are caller-built
//! fingerprints encoding every parameter that affects the result, e.g.
//! `search:blue shirt:top` or `details:B0123`. Expiry is lazy: an expired
//! entry is purged on the access that discovers it; there is no background
//! sweep.

use crate::clock::Clock;
use crate::models::CacheEntry;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct ResponseCache<T: Clone> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Fetch a live entry; an expired entry is deleted and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().unwrap();
        let now = self.clock.now();

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                tracing::debug!(key, "Cache entry expired, purged");
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    pub fn put(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let key = key.into();
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key, CacheEntry::new(value, self.clock.now(), ttl));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
