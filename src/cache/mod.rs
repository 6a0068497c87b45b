//! Cache Module
//!
//! Provides the single-node, size-bounded LRU store that each group owns.

mod byteview;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use byteview::ByteView;
pub use lru::{LruCache, OnEvicted, Weighted};
pub use stats::CacheStats;
pub use store::Cache;
