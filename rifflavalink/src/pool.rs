//! Pool of Lavalink nodes
//!
//! Requests go to the first available node in configuration order. A node
//! that cannot be reached is marked unhealthy and the next one is tried. An
//! unhealthy node is tried again once its retry delay has passed, and comes
//! back as soon as it answers a request or a health check.

use crate::config_ext::LavalinkConfigExt;
use crate::error::{LavalinkError, Result};
use crate::node::{LavalinkNode, NodeConfig};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use riffconfig::Config;
use riffqueue::{BackendError, SearchBackend};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout of one REST call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Delay before an unreachable node is tried again
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Period of the background health check run by the bot
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct NodePool {
    nodes: Vec<Arc<LavalinkNode>>,
    retry_after: Duration,
}

impl NodePool {
    pub fn new(nodes: Vec<LavalinkNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(Arc::new).collect(),
            retry_after: DEFAULT_RETRY_AFTER,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Builds one node per entry, sharing a single HTTP client
    pub fn from_node_configs(configs: Vec<NodeConfig>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let nodes = configs
            .into_iter()
            .map(|config| LavalinkNode::new(config, client.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(nodes))
    }

    /// Builds the pool from `lavalink.*` settings
    pub fn from_config(config: &Config) -> Result<Self> {
        let nodes = config.get_lavalink_nodes()?;
        let timeout = config.get_lavalink_request_timeout();
        info!("Configuring {} Lavalink node(s)", nodes.len());
        Ok(Self::from_node_configs(nodes, timeout)?
            .with_retry_after(config.get_lavalink_retry_after()))
    }

    pub fn nodes(&self) -> &[Arc<LavalinkNode>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn healthy_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_healthy()).count()
    }

    /// Nodes a request may be sent to: healthy ones, plus unhealthy ones
    /// whose retry delay has passed
    pub fn available_count(&self) -> usize {
        self.available().count()
    }

    fn available(&self) -> impl Iterator<Item = &Arc<LavalinkNode>> {
        self.nodes
            .iter()
            .filter(move |n| n.is_available(self.retry_after))
    }

    /// Checks every node concurrently, returning the number of healthy ones
    pub async fn check_health(&self) -> usize {
        let results = join_all(self.nodes.iter().map(|node| node.check_health())).await;
        for (node, result) in self.nodes.iter().zip(&results) {
            match result {
                Ok(version) => info!(node = %node.name(), version = %version, "Lavalink node ready"),
                Err(e) => warn!(node = %node.name(), "Lavalink health check failed: {}", e),
            }
        }
        self.healthy_count()
    }

    /// Loads tracks from the first node able to answer
    ///
    /// Non-success statuses come from a reachable node and are returned as
    /// they are; only transport failures move on to the next node.
    pub async fn load(&self, identifier: &str) -> Result<Value> {
        let mut last_error = None;

        for node in self.available() {
            match node.load_tracks(identifier).await {
                Ok(body) => {
                    node.set_healthy(true);
                    return Ok(body);
                }
                Err(e) if e.is_transport() => {
                    warn!(node = %node.name(), "Lavalink node unreachable: {}", e);
                    node.set_healthy(false);
                    last_error = Some(e);
                }
                Err(e) => {
                    node.set_healthy(true);
                    return Err(e);
                }
            }
        }

        debug!(identifier, "No Lavalink node could serve the request");
        Err(last_error.unwrap_or(LavalinkError::NoNodes))
    }
}

#[async_trait]
impl SearchBackend for NodePool {
    fn available_nodes(&self) -> usize {
        self.available_count()
    }

    async fn load_tracks(&self, identifier: &str) -> std::result::Result<Value, BackendError> {
        Ok(self.load(identifier).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> NodeConfig {
        NodeConfig {
            name: name.into(),
            url: "http://127.0.0.1:2333".into(),
            password: "pw".into(),
        }
    }

    #[test]
    fn test_from_node_configs() {
        let pool =
            NodePool::from_node_configs(vec![node("a"), node("b")], DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.available_nodes(), 2);

        pool.nodes()[0].set_healthy(false);
        assert_eq!(pool.available_nodes(), 1);
        assert_eq!(pool.healthy_count(), 1);

        // retried right away
        let pool = pool.with_retry_after(Duration::ZERO);
        assert_eq!(pool.available_nodes(), 2);
        assert_eq!(pool.healthy_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_pool_is_unavailable() {
        let pool = NodePool::new(Vec::new());
        assert_eq!(pool.available_nodes(), 0);
        assert_eq!(
            pool.load_tracks("ytmsearch:x").await.unwrap_err(),
            BackendError::Unavailable
        );
    }
}
