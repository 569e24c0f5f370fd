//! Short-lived in-memory cache for remote listings and downloads.
//!
//! Keyed by URL. Shared across rebuilds (the HTTP server keeps one for its
//! lifetime) so repeated interactions within the TTL do not hit the remote.
//! Bounded by entry count; the least recently used body is evicted first.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_CAPACITY: usize = 256;

pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<LruCache<String, (Instant, String)>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::with_capacity(Duration::ZERO, 1)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if self.ttl.is_zero() {
            return None;
        }
        // A poisoned lock reads as a miss; the caller refetches.
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: &str, value: String) {
        if self.ttl.is_zero() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            if let Some((evicted, _)) = entries.push(key.to_string(), (Instant::now(), value)) {
                if evicted != key {
                    tracing::debug!(url = %evicted, "cache evicted");
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .finish()
    }
}
