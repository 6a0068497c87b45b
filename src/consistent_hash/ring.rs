//! Hash Ring
//!
//! Each physical peer is placed on a 32-bit ring `replicas` times. A key is
//! owned by the first virtual node clockwise from the key's hash.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Virtual nodes per physical peer.
pub const DEFAULT_REPLICAS: usize = 50;

/// Hash function placing keys and virtual nodes on the ring.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

// == Hash Ring ==
/// Consistent-hash ring over peer identifiers.
#[derive(Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted virtual node hashes
    keys: Vec<u32>,
    /// Virtual node hash to physical peer
    nodes: HashMap<u32, String>,
    peers: usize,
}

impl HashRing {
    // == Constructor ==
    /// Creates an empty ring. Without a custom hash the ring uses CRC-32 (IEEE).
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or_else(|| Arc::new(crc32fast::hash) as HashFn),
            replicas,
            keys: Vec::new(),
            nodes: HashMap::new(),
            peers: 0,
        }
    }

    // == Add ==
    /// Places every peer on the ring `replicas` times.
    ///
    /// Virtual node `i` of peer `p` sits at `hash(format!("{i}{p}"))`.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let hash = (self.hash)(format!("{i}{peer}").as_bytes());
                self.keys.push(hash);
                self.nodes.insert(hash, peer.to_string());
            }
            self.peers += 1;
        }
        self.keys.sort_unstable();
    }

    // == Get ==
    /// Returns the peer owning `key`, or None when the ring is empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        let idx = self.keys.partition_point(|&k| k < hash);
        let slot = self.keys[idx % self.keys.len()];
        self.nodes.get(&slot).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of physical peers added.
    pub fn len(&self) -> usize {
        self.peers
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS, None)
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("peers", &self.peers)
            .field("virtual_nodes", &self.keys.len())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    /// Interprets the bytes as a decimal number so ring positions are obvious.
    fn numeric_hash() -> HashFn {
        Arc::new(|data: &[u8]| {
            std::str::from_utf8(data)
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(0)
        })
    }

    #[test]
    fn test_ring_empty() {
        let ring = HashRing::default();
        assert!(ring.is_empty());
        assert_eq!(ring.get("Tom"), None);
    }

    #[test]
    fn test_ring_hashing() {
        let mut ring = HashRing::new(3, Some(numeric_hash()));
        // Virtual nodes: 2, 4, 6, 12, 14, 16, 22, 24, 26
        ring.add(["6", "4", "2"]);

        let cases = [("2", "2"), ("11", "2"), ("23", "4"), ("27", "2")];
        for (key, peer) in cases {
            assert_eq!(ring.get(key), Some(peer), "asking for {key}");
        }

        // Adds 8, 18, 28
        ring.add(["8"]);
        assert_eq!(ring.get("27"), Some("8"));
        assert_eq!(ring.get("11"), Some("2"));
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn test_ring_wraps_past_largest() {
        let mut ring = HashRing::new(1, Some(numeric_hash()));
        ring.add(["10", "20"]);

        // Virtual nodes: 010 -> 10, 020 -> 20
        assert_eq!(ring.get("21"), Some("10"));
        assert_eq!(ring.get("20"), Some("20"));
        assert_eq!(ring.get("0"), Some("10"));
    }

    #[test]
    fn test_ring_is_deterministic_with_default_hash() {
        let peers = ["http://localhost:8001", "http://localhost:8002", "http://localhost:8003"];
        let mut a = HashRing::default();
        let mut b = HashRing::default();
        a.add(peers);
        b.add(peers);

        for i in 0..200 {
            let key = format!("key-{i}");
            assert_eq!(a.get(&key), b.get(&key));
            assert_eq!(a.get(&key), a.get(&key));
        }
    }

    #[test]
    fn test_ring_uses_every_peer() {
        let mut ring = HashRing::default();
        ring.add(["http://localhost:8001", "http://localhost:8002", "http://localhost:8003"]);

        let owners: std::collections::HashSet<_> =
            (0..1000).filter_map(|i| ring.get(&format!("key-{i}")).map(str::to_string)).collect();
        assert_eq!(owners.len(), 3);
    }
}
