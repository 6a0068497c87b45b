//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for groups, peers and the HTTP surfaces.
///
/// The type is `Clone` so a single deduplicated load can hand the same
/// outcome to every waiting caller.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Invalid request data (empty key, malformed peer path)
    #[error("{0}")]
    InvalidRequest(String),

    /// Unknown group or missing resource
    #[error("{0}")]
    NotFound(String),

    /// Peer could not be reached or answered with a non-success status
    #[error("{0}")]
    Transport(String),

    /// Error returned by the user-supplied loader, passed through verbatim
    #[error("{0}")]
    Loader(Arc<anyhow::Error>),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Wraps a loader error without altering its message.
    pub fn loader(err: anyhow::Error) -> Self {
        CacheError::Loader(Arc::new(err))
    }

    /// HTTP status used when this error is reported over HTTP.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Transport(_) => StatusCode::BAD_GATEWAY,
            CacheError::Loader(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Transport(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string()
        }));

        (self.status_code(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_error_message_is_verbatim() {
        let err = CacheError::loader(anyhow::anyhow!("Bob not exist"));
        assert_eq!(err.to_string(), "Bob not exist");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CacheError::InvalidRequest("key is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CacheError::NotFound("no such group: x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CacheError::Transport("server returned: 500".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_clone_shares_loader_error() {
        let err = CacheError::loader(anyhow::anyhow!("boom"));
        let copy = err.clone();
        match (err, copy) {
            (CacheError::Loader(a), CacheError::Loader(b)) => assert!(Arc::ptr_eq(&a, &b)),
            _ => panic!("expected loader errors"),
        }
    }
}
