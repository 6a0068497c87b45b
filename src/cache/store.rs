//! Cache Store Module
//!
//! Thread-safe wrapper that serializes every access to a group's LRU store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{ByteView, CacheStats, LruCache};

#[derive(Debug)]
struct Inner {
    lru: LruCache<ByteView>,
    hits: u64,
    misses: u64,
}

// == Cache ==
/// A byte-bounded LRU of [`ByteView`]s guarded by a single mutex.
///
/// Reads take the lock exclusively too, since a lookup reorders recency.
/// The lock is never held across an `.await`.
#[derive(Debug)]
pub struct Cache {
    inner: Mutex<Inner>,
    evictions: Arc<AtomicU64>,
}

impl Cache {
    // == Constructor ==
    /// Creates a store holding at most `cache_bytes` bytes (0 = unbounded).
    pub fn new(cache_bytes: usize) -> Self {
        let evictions = Arc::new(AtomicU64::new(0));
        let counter = evictions.clone();
        let lru = LruCache::with_on_evicted(
            cache_bytes,
            Box::new(move |key: &str, _value: &ByteView| {
                counter.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key, "evicted");
            }),
        );

        Self {
            inner: Mutex::new(Inner {
                lru,
                hits: 0,
                misses: 0,
            }),
            evictions,
        }
    }

    // == Get ==
    /// Returns a shared view of the cached value, marking it recently used.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut inner = self.inner.lock();
        let value = inner.lru.get(key).cloned();
        match value {
            Some(_) => inner.hits += 1,
            None => inner.misses += 1,
        }
        value
    }

    // == Add ==
    /// Inserts or replaces a value, evicting older entries as needed.
    pub fn add(&self, key: &str, value: ByteView) {
        self.inner.lock().lru.add(key.to_string(), value);
    }

    /// Checks for a key without affecting recency or statistics.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().lru.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().lru.is_empty()
    }

    /// Returns the resident size in bytes.
    pub fn bytes(&self) -> usize {
        self.inner.lock().lru.bytes()
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: inner.lru.len(),
            bytes: inner.lru.bytes(),
            max_bytes: inner.lru.max_bytes(),
        }
    }
}
