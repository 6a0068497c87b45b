//! Peers Module
//!
//! Peer selection and the HTTP transport used to fetch values owned by
//! other nodes.
//!
//! # Wire Protocol
//! - `GET <base_path><group>/<key>` (both segments percent-encoded)
//! - `200` with the raw value as `application/octet-stream`
//! - `400` for a malformed path, `404` for an unknown group, `500` with the
//!   load error as body

mod client;
mod picker;
mod pool;

pub use client::HttpGetter;
pub use picker::{PeerGetter, PeerPicker};
pub use pool::{HttpPool, DEFAULT_BASE_PATH};
