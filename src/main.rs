//! geecache node
//!
//! Serves one group over the peer protocol and, optionally, a front API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geecache::api::create_router;
use geecache::{AppState, Config, Getter, GroupRegistry, HttpPool};

/// Stand-in for a slow backing store.
struct SlowDb {
    scores: HashMap<&'static str, &'static str>,
}

impl SlowDb {
    fn new() -> Self {
        Self {
            scores: HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]),
        }
    }
}

#[async_trait]
impl Getter for SlowDb {
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        info!(key, "[SlowDB] search key");
        match self.scores.get(key) {
            Some(v) => Ok(v.as_bytes().to_vec()),
            None => anyhow::bail!("{key} not exist"),
        }
    }
}

/// Main entry point for a cache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the group and the peer pool, and bind them together
/// 4. Optionally start the front API
/// 5. Serve the peer protocol until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geecache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting geecache node");

    let config = Config::from_env();
    info!(
        "Configuration loaded: group={}, cache_bytes={}, self={}, peers={:?}, base_path={}",
        config.group_name, config.cache_bytes, config.self_addr, config.peers, config.base_path
    );

    let registry = Arc::new(GroupRegistry::new());
    let group = registry.new_group(&config.group_name, config.cache_bytes, Arc::new(SlowDb::new()));

    let pool = Arc::new(
        HttpPool::new(&config.self_addr, registry.clone()).with_base_path(&config.base_path),
    );
    pool.set(&config.peers);
    group.register_peers(pool.clone());

    let api_handle = if config.api_enabled {
        let state = AppState::new(registry.clone(), &config.group_name)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Front API listening on http://{}", addr);

        Some(tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, create_router(state)).await {
                warn!(error = %err, "front API stopped");
            }
        }))
    } else {
        None
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.peer_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("geecache is running at {}", config.self_addr);

    axum::serve(listener, pool.router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = api_handle {
        handle.abort();
        warn!("Front API aborted");
    }

    info!("Node shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
