//! Cache Statistics Module
//!
//! Snapshot of a store's lookups, evictions and occupancy.

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time metrics for one [`Cache`](crate::cache::Cache), built by
/// [`Cache::stats`](crate::cache::Cache::stats).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the store
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries dropped to stay under the byte limit
    pub evictions: u64,
    /// Resident entries
    pub entries: usize,
    /// Resident size, keys plus values
    pub bytes: usize,
    /// Configured limit, 0 when unbounded
    pub max_bytes: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    /// How full the store is, or `None` for an unbounded store.
    pub fn fill_ratio(&self) -> Option<f64> {
        (self.max_bytes != 0).then(|| self.bytes as f64 / self.max_bytes as f64)
    }
}
