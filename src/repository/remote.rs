//! Client for the external graph query service.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{DegreeRepository, NeighborRepository};
use crate::config::RemoteConfig;
use crate::error::{PathfinderError, Result};
use crate::graph::Node;

/// Request body for the service's neighbor endpoint
#[derive(Serialize)]
struct NeighborQuery<'a> {
    node_ids: Vec<&'a str>,
    limit: usize,
}

#[derive(Deserialize)]
struct NeighborResponse {
    #[serde(default)]
    neighbors: Vec<RemoteNeighbor>,
}

#[derive(Deserialize)]
struct RemoteNeighbor {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    degree: Option<u64>,
}

impl From<RemoteNeighbor> for Node {
    fn from(n: RemoteNeighbor) -> Self {
        Node {
            id: n.id,
            weight: None,
            name: n.name,
            degree: n.degree,
            category: n.category,
        }
    }
}

/// Outcome of one HTTP attempt
enum AttemptError {
    /// 429, 5xx, timeouts and refused connections
    Retryable(PathfinderError),
    Fatal(PathfinderError),
}

/// Neighbor lookups against the remote graph service.
///
/// One batched POST per `get_neighbors` call. The service does not expose
/// degrees cheaply, so degree lookups go to an attached [`DegreeRepository`];
/// without one every degree is unknown.
pub struct RemoteGraphRepository {
    client: Client,
    neighbors_url: Url,
    max_retries: usize,
    retry_delay: Duration,
    degree_index: Option<DegreeRepository>,
}

impl RemoteGraphRepository {
    /// Create a client for the service rooted at `endpoint`
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL, e.g. `https://kg.example.org/api/v1`
    /// * `timeout` - Per-request timeout
    /// * `max_retries` - Retries for rate-limited or failing requests
    pub fn new(endpoint: &str, timeout: Duration, max_retries: usize) -> Result<Self> {
        let mut base = Url::parse(endpoint)
            .map_err(|e| PathfinderError::Config(format!("Invalid graph endpoint {}: {}", endpoint, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let neighbors_url = base
            .join("neighbors")
            .map_err(|e| PathfinderError::Config(format!("Invalid graph endpoint {}: {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PathfinderError::Remote(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            neighbors_url,
            max_retries,
            retry_delay: Duration::from_millis(500),
            degree_index: None,
        })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        Self::new(
            &config.endpoint,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )
    }

    pub fn with_degree_index(mut self, index: DegreeRepository) -> Self {
        self.degree_index = Some(index);
        self
    }

    /// Initial backoff; doubles after each retry.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn neighbors_url(&self) -> &Url {
        &self.neighbors_url
    }

    async fn send_once(&self, query: &NeighborQuery<'_>) -> std::result::Result<NeighborResponse, AttemptError> {
        let response = self
            .client
            .post(self.neighbors_url.clone())
            .json(query)
            .send()
            .await
            .map_err(|e| {
                let err = PathfinderError::Remote(format!("Network error: {}", e));
                if e.is_timeout() || e.is_connect() {
                    AttemptError::Retryable(err)
                } else {
                    AttemptError::Fatal(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            let err = PathfinderError::Remote(format!("Graph service error {}: {}", status, body));
            return Err(if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                AttemptError::Retryable(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        response.json().await.map_err(|e| {
            AttemptError::Fatal(PathfinderError::Remote(format!("Failed to parse response: {}", e)))
        })
    }

    async fn query(&self, query: &NeighborQuery<'_>) -> Result<NeighborResponse> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = self.retry_delay;

        loop {
            match self.send_once(query).await {
                Ok(response) => {
                    log::debug!(
                        "Neighbor query for {:?} took {:?} (attempt {})",
                        query.node_ids,
                        start.elapsed(),
                        attempt + 1
                    );
                    return Ok(response);
                }
                Err(AttemptError::Retryable(e)) if attempt < self.max_retries => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, self.max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(AttemptError::Retryable(e)) | Err(AttemptError::Fatal(e)) => return Err(e),
            }
        }
    }
}

impl NeighborRepository for RemoteGraphRepository {
    async fn get_neighbors(&self, node: &Node, limit: usize) -> Result<Vec<Node>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query = NeighborQuery {
            node_ids: vec![node.id.as_str()],
            limit,
        };
        let response = self.query(&query).await?;

        let mut neighbors: Vec<Node> = response
            .neighbors
            .into_iter()
            .filter(|n| n.id != node.id)
            .map(Node::from)
            .collect();
        neighbors.truncate(limit);
        Ok(neighbors)
    }

    async fn get_node_degree(&self, id: &str) -> Result<Option<u64>> {
        match &self.degree_index {
            Some(index) => index.degree(id).await,
            None => Ok(None),
        }
    }
}
