//! Response DTOs for the front API
//!
//! Defines the structure of outgoing JSON response bodies.

use serde::Serialize;

use crate::group::GroupStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Group the statistics belong to
    pub group: String,
    /// Group counters, including the local store
    pub stats: GroupStats,
    /// Local store hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Resident bytes over the byte limit, absent when unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_ratio: Option<f64>,
}

impl StatsResponse {
    /// Creates a new StatsResponse from group statistics
    pub fn new(group: impl Into<String>, stats: GroupStats) -> Self {
        let hit_rate = stats.main_cache.hit_rate();
        let fill_ratio = stats.main_cache.fill_ratio();
        Self {
            group: group.into(),
            stats,
            hit_rate,
            fill_ratio,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{GetterFunc, Group};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_stats_response_serialize() {
        let group = Group::new(
            "scores",
            0,
            Arc::new(GetterFunc::new(|key: &str| Ok(key.as_bytes().to_vec()))),
        );
        group.get("Tom").await.unwrap();
        group.get("Tom").await.unwrap();

        let resp = StatsResponse::new(group.name(), group.stats());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["group"], "scores");
        assert_eq!(json["stats"]["local_loads"], 1);
        assert_eq!(json["stats"]["main_cache"]["entries"], 1);
        assert!((resp.hit_rate - 0.5).abs() < 0.001);
        // Unbounded store
        assert!(json.get("fill_ratio").is_none());
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
