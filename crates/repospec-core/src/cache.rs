//! Shared cache of resolved refs, keyed by API request URL.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

use crate::error::{ProviderError, Result};

/// Default number of API URLs remembered across all GitHub resolutions.
pub const DEFAULT_CAPACITY: usize = 1024;

/// A previously resolved commit together with the validator that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// `ETag` header of the response, if the server sent one
    pub etag: Option<String>,
    /// Resolved commit SHA
    pub sha: String,
}

/// Bounded, recency-ordered cache of resolved refs.
///
/// Lookups and inserts both count as a touch. When an insert would exceed
/// capacity the least recently touched entry is evicted. Entries never expire
/// otherwise.
///
/// Every operation takes the lock once, so a miss followed by a fetch and an
/// insert is not atomic: two concurrent resolutions of the same URL may both
/// miss and both fetch, and the later insert wins.
#[derive(Debug)]
pub struct RefCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl Default for RefCache {
    fn default() -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }
}

impl RefCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if capacity is 0
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| ProviderError::configuration("Cache capacity must be non-zero"))?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Look up an entry, marking it most recently used.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    /// Insert or overwrite an entry, evicting the least recently used one
    /// if the cache is full.
    pub fn set(&self, key: impl Into<String>, value: CacheEntry) {
        self.entries.lock().put(key.into(), value);
    }

    /// Refresh an entry's recency without rewriting it.
    ///
    /// Returns false if the key is not cached (e.g. it was evicted while a
    /// request was in flight).
    pub fn touch(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains(key) {
            entries.promote(key);
            true
        } else {
            false
        }
    }

    /// Check for a key without affecting recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }
}
