//! Consistent Hashing Module
//!
//! Maps keys onto a ring of peers with virtual-node replication.

mod ring;


pub use ring::{HashFn, HashRing, DEFAULT_REPLICAS};
