//! Lavalink settings on top of riffconfig

use crate::node::NodeConfig;
use crate::pool::{DEFAULT_HEALTH_CHECK_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_AFTER};
use anyhow::{Result, anyhow};
use riffconfig::Config;
use riffconfig::encryption;
use std::time::Duration;

/// Extension trait for the `lavalink.*` section
pub trait LavalinkConfigExt {
    /// Configured nodes, in order, passwords decrypted
    ///
    /// # Errors
    ///
    /// Fails when the section is missing, malformed or names no node
    fn get_lavalink_nodes(&self) -> Result<Vec<NodeConfig>>;

    /// Replaces the node list, encrypting passwords
    fn set_lavalink_nodes(&self, nodes: &[NodeConfig]) -> Result<()>;

    /// Timeout of one REST call
    fn get_lavalink_request_timeout(&self) -> Duration;

    /// Delay before an unreachable node is tried again
    fn get_lavalink_retry_after(&self) -> Duration;

    /// Period of the background health check
    fn get_lavalink_health_check_interval(&self) -> Duration;
}

impl LavalinkConfigExt for Config {
    fn get_lavalink_nodes(&self) -> Result<Vec<NodeConfig>> {
        let value = self.get_value(&["lavalink", "nodes"])?;
        let nodes: Vec<NodeConfig> = serde_yaml::from_value(value)
            .map_err(|e| anyhow!("Invalid lavalink.nodes: {}", e))?;
        if nodes.is_empty() {
            return Err(anyhow!("No Lavalink node configured"));
        }

        nodes
            .into_iter()
            .map(|mut node| -> Result<NodeConfig> {
                node.password = encryption::get_password(&node.password)
                    .map_err(|e| anyhow!("Node {}: {}", node.name, e))?;
                Ok(node)
            })
            .collect()
    }

    fn set_lavalink_nodes(&self, nodes: &[NodeConfig]) -> Result<()> {
        let stored = nodes
            .iter()
            .map(|node| -> Result<NodeConfig> {
                Ok(NodeConfig {
                    password: encryption::encrypt_password(&node.password)?,
                    ..node.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.set_value(&["lavalink", "nodes"], serde_yaml::to_value(stored)?)
    }

    fn get_lavalink_request_timeout(&self) -> Duration {
        seconds(self, "request_timeout_secs").unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    fn get_lavalink_retry_after(&self) -> Duration {
        seconds(self, "retry_after_secs").unwrap_or(DEFAULT_RETRY_AFTER)
    }

    fn get_lavalink_health_check_interval(&self) -> Duration {
        seconds(self, "health_check_interval_secs").unwrap_or(DEFAULT_HEALTH_CHECK_INTERVAL)
    }
}

/// Positive number of seconds under `lavalink.<key>`
fn seconds(config: &Config, key: &str) -> Option<Duration> {
    match config.get_value(&["lavalink", key]) {
        Ok(serde_yaml::Value::Number(n)) => n
            .as_u64()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
        _ => None,
    }
}
