//! API Handlers
//!
//! HTTP request handlers for the front API of a node.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{CacheError, Result};
use crate::group::{Group, GroupRegistry};
use crate::models::{HealthResponse, KeyQuery, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Every group served by this process
    pub registry: Arc<GroupRegistry>,
    /// Group answered by `/api`
    pub group: Arc<Group>,
}

impl AppState {
    /// Creates a new AppState serving `group_name` from the registry.
    pub fn new(registry: Arc<GroupRegistry>, group_name: &str) -> Result<Self> {
        let group = registry
            .get_group(group_name)
            .ok_or_else(|| CacheError::NotFound(format!("no such group: {group_name}")))?;
        Ok(Self { registry, group })
    }
}

/// Handler for GET /api?key=<key>
///
/// Returns the raw value bytes.
pub async fn api_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Response> {
    let view = state.group.get(&query.key).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        view.to_bytes(),
    )
        .into_response())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.group.name(), state.group.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GetterFunc;

    fn state() -> AppState {
        let registry = Arc::new(GroupRegistry::new());
        registry.new_group(
            "scores",
            2 << 10,
            Arc::new(GetterFunc::new(|key: &str| match key {
                "Tom" => Ok(b"630".to_vec()),
                _ => anyhow::bail!("{key} not exist"),
            })),
        );
        AppState::new(registry, "scores").unwrap()
    }

    #[test]
    fn test_state_unknown_group() {
        let registry = Arc::new(GroupRegistry::new());
        let result = AppState::new(registry, "scores");
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_api_handler_hit() {
        let state = state();
        let query = KeyQuery {
            key: "Tom".to_string(),
        };

        let response = api_handler(State(state.clone()), Query(query)).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"630");
    }

    #[tokio::test]
    async fn test_api_handler_loader_error() {
        let query = KeyQuery {
            key: "Bob".to_string(),
        };

        let result = api_handler(State(state()), Query(query)).await;
        assert!(matches!(result, Err(CacheError::Loader(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = state();
        let response = stats_handler(State(state)).await;
        assert_eq!(response.group, "scores");
        assert_eq!(response.stats.gets, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
