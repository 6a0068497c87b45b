//! Capability traits connecting a group to its peers.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

// == Peer Picker ==
/// Decides which peer owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the remote owner of `key`, or None when the key belongs to
    /// this node (or no peers are known).
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

// == Peer Getter ==
/// Fetches a value from one specific peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    async fn get(&self, group: &str, key: &str) -> Result<Bytes>;
}
