//! Leader data fetching and endpoint liveness probes.

use async_trait::async_trait;
use common::{Error, Result};
use leaderwatch::Leader;
use std::time::Duration;
use tracing::{debug, warn};

/// Failure modes for a leader fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure; the cycle may retry against another node.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node replied but not with a leader array; retrying the same
    /// payload is pointless, the cycle just ends.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Source of leader snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaderSource: Send + Sync {
    async fn fetch_leaders(&self) -> std::result::Result<Vec<Leader>, FetchError>;
}

/// Liveness prober for API endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prober: Send + Sync {
    /// Reachable iff the node answers 2xx within the probe timeout.
    async fn probe(&self, node: &str) -> bool;
}

/// Fetches the leader ranking from one API node.
pub struct HttpLeaderSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLeaderSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl LeaderSource for HttpLeaderSource {
    async fn fetch_leaders(&self) -> std::result::Result<Vec<Leader>, FetchError> {
        let url = format!("{}/rank/leaders", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "{url} returned status {status}"
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if !payload.is_array() {
            return Err(FetchError::Malformed(format!(
                "{url} returned a non-array payload"
            )));
        }

        let leaders: Vec<Leader> =
            serde_json::from_value(payload).map_err(|e| FetchError::Malformed(e.to_string()))?;
        debug!(url = %url, count = leaders.len(), "Fetched leader snapshot");
        Ok(leaders)
    }
}

/// Probes the count route of each node with a fixed per-request timeout.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::http)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, node: &str) -> bool {
        match self.client.get(format!("{node}/count")).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    debug!(node = %node, "Probe ok");
                    true
                } else {
                    warn!(node = %node, status = %status, "Probe returned non-success status");
                    false
                }
            }
            Err(e) => {
                warn!(node = %node, error = %e, "Probe failed");
                false
            }
        }
    }
}
