//! Request DTOs for the front API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query string of `GET /api?key=<key>`
#[derive(Debug, Clone, Deserialize)]
pub struct KeyQuery {
    /// The cache key to look up
    pub key: String,
}
