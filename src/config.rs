//! Configuration Module
//!
//! Handles loading node configuration from environment variables.

use std::env;

use crate::peers::DEFAULT_BASE_PATH;

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Byte budget of the group's local store (0 = unbounded)
    pub cache_bytes: usize,
    /// Name of the group this node serves
    pub group_name: String,
    /// Port of the peer protocol server
    pub peer_port: u16,
    /// Address other peers use to reach this node
    pub self_addr: String,
    /// Every peer address in the cluster, this node included
    pub peers: Vec<String>,
    /// Path prefix of peer requests
    pub base_path: String,
    /// Whether to start the front API
    pub api_enabled: bool,
    /// Port of the front API
    pub api_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BYTES` - Local store budget in bytes (default: 2048)
    /// - `GROUP_NAME` - Group served by this node (default: scores)
    /// - `PEER_PORT` - Peer protocol port (default: 8001)
    /// - `SELF_ADDR` - This node's peer address (default: http://localhost:<PEER_PORT>)
    /// - `PEERS` - Comma-separated peer addresses (default: SELF_ADDR only)
    /// - `BASE_PATH` - Peer request prefix (default: /_geecache/)
    /// - `API_ENABLED` - Start the front API (default: false)
    /// - `API_PORT` - Front API port (default: 9999)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let peer_port = parse_var("PEER_PORT").unwrap_or(defaults.peer_port);
        let self_addr =
            env::var("SELF_ADDR").unwrap_or_else(|_| format!("http://localhost:{peer_port}"));
        let peers = env::var("PEERS")
            .ok()
            .map(|v| split_peers(&v))
            .filter(|peers| !peers.is_empty())
            .unwrap_or_else(|| vec![self_addr.clone()]);

        Self {
            cache_bytes: parse_var("CACHE_BYTES").unwrap_or(defaults.cache_bytes),
            group_name: env::var("GROUP_NAME").unwrap_or(defaults.group_name),
            peer_port,
            self_addr,
            peers,
            base_path: env::var("BASE_PATH").unwrap_or(defaults.base_path),
            api_enabled: parse_var("API_ENABLED").unwrap_or(defaults.api_enabled),
            api_port: parse_var("API_PORT").unwrap_or(defaults.api_port),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn split_peers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        let self_addr = "http://localhost:8001".to_string();
        Self {
            cache_bytes: 2 << 10,
            group_name: "scores".to_string(),
            peer_port: 8001,
            peers: vec![self_addr.clone()],
            self_addr,
            base_path: DEFAULT_BASE_PATH.to_string(),
            api_enabled: false,
            api_port: 9999,
        }
    }
}
