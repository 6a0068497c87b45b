//! HTTP client half of the peer protocol.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::peers::PeerGetter;

// == HTTP Getter ==
/// Fetches values from one peer, e.g. `http://10.0.0.2:8008/_geecache/`.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGetter {
    /// `base_url` is the peer address followed by the pool's base path.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Shares an existing connection pool.
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds `<base_url><escaped group>/<escaped key>`.
    pub fn url_for(&self, group: &str, key: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    /// Single attempt, no retry. Any non-200 answer is a transport error.
    async fn get(&self, group: &str, key: &str) -> Result<Bytes> {
        let url = self.url_for(group, key);
        debug!(%url, "fetching from peer");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(CacheError::Transport(format!("server returned: {status}")));
        }

        response
            .bytes()
            .await
            .map_err(|err| CacheError::Transport(format!("reading response body: {err}")))
    }
}
