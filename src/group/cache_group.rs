//! Group
//!
//! The get pipeline: local store, then (deduplicated) peer fetch, then the
//! local loader with population of the store.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{ByteView, Cache, CacheStats};
use crate::error::{CacheError, Result};
use crate::group::Getter;
use crate::peers::{PeerGetter, PeerPicker};
use crate::singleflight::Flight;

#[derive(Debug, Default)]
struct Counters {
    gets: AtomicU64,
    cache_hits: AtomicU64,
    peer_loads: AtomicU64,
    peer_errors: AtomicU64,
    loads: AtomicU64,
    loads_deduped: AtomicU64,
    local_loads: AtomicU64,
    local_load_errs: AtomicU64,
    server_requests: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

// == Group Stats ==
/// Snapshot of a group's counters.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    /// Get requests with a non-empty key, including those from peers
    pub gets: u64,
    /// Requests answered by the local store
    pub cache_hits: u64,
    /// Values fetched from a remote owner
    pub peer_loads: u64,
    /// Failed remote fetches (each fell back to the local loader)
    pub peer_errors: u64,
    /// Misses that entered the coalescer
    pub loads: u64,
    /// Loads that actually executed after coalescing
    pub loads_deduped: u64,
    /// Loader invocations
    pub local_loads: u64,
    /// Loader invocations that failed
    pub local_load_errs: u64,
    /// Requests received from peers
    pub server_requests: u64,
    /// The group's local store
    pub main_cache: CacheStats,
}

// == Group ==
/// A named cache namespace with its own loader, store and peer view.
pub struct Group {
    name: String,
    getter: Arc<dyn Getter>,
    main_cache: Cache,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    loader: Flight<Result<ByteView>>,
    counters: Counters,
}

impl Group {
    // == Constructor ==
    /// Creates a group whose local store holds at most `cache_bytes` bytes
    /// (0 = unbounded). Most callers go through
    /// [`GroupRegistry::new_group`](crate::group::GroupRegistry::new_group).
    pub fn new(name: impl Into<String>, cache_bytes: usize, getter: Arc<dyn Getter>) -> Self {
        Self {
            name: name.into(),
            getter,
            main_cache: Cache::new(cache_bytes),
            peers: OnceLock::new(),
            loader: Flight::new(),
            counters: Counters::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Register Peers ==
    /// Binds the peer picker used to locate remote owners.
    ///
    /// # Panics
    /// When called more than once for the same group. Swapping pickers while
    /// requests are in flight would race on ownership decisions, so this is
    /// treated as a configuration bug.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) {
        if self.peers.set(peers).is_err() {
            panic!("register_peers called more than once for group {}", self.name);
        }
    }

    // == Get ==
    /// Returns the value for `key` from the local store, the owning peer or
    /// the loader, in that order.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("key is required".to_string()));
        }
        bump(&self.counters.gets);

        if let Some(value) = self.main_cache.get(key) {
            bump(&self.counters.cache_hits);
            debug!(group = %self.name, key, "cache hit");
            return Ok(value);
        }

        self.load(key).await
    }

    async fn load(&self, key: &str) -> Result<ByteView> {
        bump(&self.counters.loads);
        self.loader
            .work(key, || async {
                bump(&self.counters.loads_deduped);

                if let Some(peer) = self.peers.get().and_then(|p| p.pick_peer(key)) {
                    match self.get_from_peer(peer.as_ref(), key).await {
                        Ok(value) => {
                            bump(&self.counters.peer_loads);
                            return Ok(value);
                        }
                        Err(err) => {
                            bump(&self.counters.peer_errors);
                            warn!(group = %self.name, key, error = %err, "failed to get from peer, loading locally");
                        }
                    }
                }

                self.get_locally(key).await
            })
            .await
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView> {
        bump(&self.counters.local_loads);
        let bytes = match self.getter.get(key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                bump(&self.counters.local_load_errs);
                return Err(CacheError::loader(err));
            }
        };

        let value = ByteView::from(bytes);
        self.populate_cache(key, value.clone());
        info!(group = %self.name, key, bytes = value.len(), "loaded locally");
        Ok(value)
    }

    // Values owned by a remote peer are never stored here.
    async fn get_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteView> {
        let bytes = peer.get(&self.name, key).await?;
        Ok(ByteView::from(bytes))
    }

    fn populate_cache(&self, key: &str, value: ByteView) {
        self.main_cache.add(key, value);
    }

    pub(crate) fn record_server_request(&self) {
        bump(&self.counters.server_requests);
    }

    // == Stats ==
    pub fn stats(&self) -> GroupStats {
        let c = &self.counters;
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        GroupStats {
            gets: load(&c.gets),
            cache_hits: load(&c.cache_hits),
            peer_loads: load(&c.peer_loads),
            peer_errors: load(&c.peer_errors),
            loads: load(&c.loads),
            loads_deduped: load(&c.loads_deduped),
            local_loads: load(&c.local_loads),
            local_load_errs: load(&c.local_load_errs),
            server_requests: load(&c.server_requests),
            main_cache: self.main_cache.stats(),
        }
    }

    /// Whether `key` is resident in the local store. Does not affect recency.
    pub fn is_cached(&self, key: &str) -> bool {
        self.main_cache.contains(key)
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("main_cache", &self.main_cache)
            .field("has_peers", &self.peers.get().is_some())
            .finish()
    }
}
