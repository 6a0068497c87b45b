//! HTTP Pool
//!
//! Server half of the peer protocol plus the consistent-hash peer picker.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use parking_lot::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::consistent_hash::{HashRing, DEFAULT_REPLICAS};
use crate::error::{CacheError, Result};
use crate::group::GroupRegistry;
use crate::peers::{HttpGetter, PeerGetter, PeerPicker};

/// Prefix of every peer request path.
pub const DEFAULT_BASE_PATH: &str = "/_geecache/";

struct PoolState {
    ring: HashRing,
    getters: HashMap<String, Arc<HttpGetter>>,
}

// == HTTP Pool ==
/// Answers peer requests for the groups in a registry and picks the peer
/// owning a key.
pub struct HttpPool {
    /// This node's own address, e.g. `http://localhost:8001`
    self_addr: String,
    base_path: String,
    registry: Arc<GroupRegistry>,
    client: reqwest::Client,
    /// Guards the ring and the per-peer clients
    state: Mutex<PoolState>,
}

impl HttpPool {
    // == Constructor ==
    pub fn new(self_addr: impl Into<String>, registry: Arc<GroupRegistry>) -> Self {
        Self {
            self_addr: self_addr.into(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            registry,
            client: reqwest::Client::new(),
            state: Mutex::new(PoolState {
                ring: HashRing::default(),
                getters: HashMap::new(),
            }),
        }
    }

    /// Overrides the path prefix. Leading and trailing slashes are added if
    /// missing.
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        let trimmed = base_path.trim_matches('/');
        self.base_path = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        };
        self
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    // == Set ==
    /// Replaces the peer set, rebuilding the ring and the per-peer clients.
    pub fn set<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: Vec<String> = peers.into_iter().map(|p| p.as_ref().to_string()).collect();

        let mut ring = HashRing::new(DEFAULT_REPLICAS, None);
        ring.add(&peers);
        let getters = peers
            .iter()
            .map(|peer| {
                let getter = HttpGetter::with_client(
                    format!("{peer}{}", self.base_path),
                    self.client.clone(),
                );
                (peer.clone(), Arc::new(getter))
            })
            .collect();

        *self.state.lock() = PoolState { ring, getters };
        info!(server = %self.self_addr, peers = ?peers, "peer set updated");
    }

    // == Router ==
    /// Routes `<base_path>*rest` to the pool.
    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route(&format!("{}*rest", self.base_path), get(peer_handler))
            .fallback(fallback_handler)
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    // == Parse Path ==
    /// Splits `<base_path><group>/<key>` into decoded group and key.
    ///
    /// # Panics
    /// When `path` does not start with the base path; the router only
    /// delivers matching paths here.
    pub fn parse_path(&self, path: &str) -> Result<(String, String)> {
        let Some(rest) = path.strip_prefix(self.base_path.as_str()) else {
            panic!("HttpPool serving unexpected path: {path}");
        };

        let bad_request = || CacheError::InvalidRequest("bad request".to_string());
        let (group, key) = rest.split_once('/').ok_or_else(bad_request)?;
        let group = urlencoding::decode(group).map_err(|_| bad_request())?;
        let key = urlencoding::decode(key).map_err(|_| bad_request())?;
        if key.is_empty() {
            return Err(bad_request());
        }
        Ok((group.into_owned(), key.into_owned()))
    }

    // == Serve ==
    /// Handles one inbound peer request path.
    async fn serve(&self, path: &str) -> Response {
        debug!(server = %self.self_addr, path, "GET");

        let (group_name, key) = match self.parse_path(path) {
            Ok(parts) => parts,
            Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        };

        let Some(group) = self.registry.get_group(&group_name) else {
            return (
                StatusCode::NOT_FOUND,
                format!("no such group: {group_name}"),
            )
                .into_response();
        };
        group.record_server_request();

        match group.get(&key).await {
            Ok(view) => (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                view.to_bytes(),
            )
                .into_response(),
            Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        }
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.lock();
        let peer = state.ring.get(key)?;
        if peer == self.self_addr {
            return None;
        }
        debug!(server = %self.self_addr, peer, key, "pick peer");
        state
            .getters
            .get(peer)
            .map(|getter| getter.clone() as Arc<dyn PeerGetter>)
    }
}

impl fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_addr", &self.self_addr)
            .field("base_path", &self.base_path)
            .field("ring", &self.state.lock().ring)
            .finish()
    }
}

async fn peer_handler(State(pool): State<Arc<HttpPool>>, OriginalUri(uri): OriginalUri) -> Response {
    pool.serve(uri.path()).await
}

async fn fallback_handler(State(pool): State<Arc<HttpPool>>, OriginalUri(uri): OriginalUri) -> Response {
    // `<base_path>` alone has no group or key
    if uri.path().starts_with(pool.base_path()) {
        (StatusCode::BAD_REQUEST, "bad request").into_response()
    } else {
        (StatusCode::NOT_FOUND, "not found").into_response()
    }
}
