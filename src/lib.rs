//! geecache - A distributed in-memory cache
//!
//! Each node keeps a byte-bounded LRU store for the keys it owns, picks the
//! owner of other keys with consistent hashing, and fetches them from that
//! peer over HTTP. Concurrent misses for the same key are coalesced into a
//! single load.

pub mod api;
pub mod cache;
pub mod config;
pub mod consistent_hash;
pub mod error;
pub mod group;
pub mod models;
pub mod peers;
pub mod singleflight;

pub use api::AppState;
pub use cache::ByteView;
pub use config::Config;
pub use error::{CacheError, Result};
pub use group::{Getter, GetterFunc, Group, GroupRegistry};
pub use peers::{HttpPool, PeerGetter, PeerPicker};
