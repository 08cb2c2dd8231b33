//! A single Lavalink node reached over its REST API

use crate::error::{LavalinkError, Result};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Node settings as found under `lavalink.nodes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    /// Base URL, e.g. `http://localhost:2333`
    pub url: String,
    /// Sent as is in the `Authorization` header
    pub password: String,
}

/// One Lavalink server
#[derive(Debug)]
pub struct LavalinkNode {
    name: String,
    base: Url,
    password: String,
    client: Client,
    /// Time of the last failure, `None` while healthy
    down_since: Mutex<Option<Instant>>,
}

impl LavalinkNode {
    /// Nodes start healthy until a request or a health check says otherwise
    pub fn new(config: NodeConfig, client: Client) -> Result<Self> {
        let base = Url::parse(&config.url).map_err(|e| LavalinkError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(LavalinkError::InvalidUrl {
                url: config.url,
                reason: "not a base URL".to_string(),
            });
        }

        Ok(Self {
            name: config.name,
            base,
            password: config.password,
            client,
            down_since: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn is_healthy(&self) -> bool {
        self.down_since().is_none()
    }

    /// Healthy, or unhealthy for at least `retry_after` and worth another try
    pub fn is_available(&self, retry_after: Duration) -> bool {
        self.down_since()
            .is_none_or(|since| since.elapsed() >= retry_after)
    }

    /// A failure restarts the retry delay even if the node was already down
    pub fn set_healthy(&self, healthy: bool) {
        let mut down_since = self
            .down_since
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let was = down_since.is_none();
        *down_since = if healthy { None } else { Some(Instant::now()) };
        drop(down_since);

        if was != healthy {
            if healthy {
                info!(node = %self.name, "Lavalink node is back");
            } else {
                warn!(node = %self.name, "Lavalink node marked unhealthy");
            }
        }
    }

    fn down_since(&self) -> Option<Instant> {
        *self
            .down_since
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Asks the node for its version, updating the health flag
    pub async fn check_health(&self) -> Result<String> {
        let result = self.fetch_version().await;
        self.set_healthy(result.is_ok());
        result
    }

    async fn fetch_version(&self) -> Result<String> {
        let response = self
            .client
            .get(self.endpoint("version"))
            .header("Authorization", &self.password)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let version = response.text().await?.trim().to_string();
        debug!(node = %self.name, version = %version, "Lavalink node version");
        Ok(version)
    }

    /// `GET /v4/loadtracks?identifier=...`
    ///
    /// Returns the body untouched; its shape is validated by the resolver.
    pub async fn load_tracks(&self, identifier: &str) -> Result<Value> {
        let mut url = self.endpoint("v4/loadtracks");
        url.query_pairs_mut().append_pair("identifier", identifier);

        debug!(node = %self.name, identifier, "Loading tracks");

        let response = self
            .client
            .get(url)
            .header("Authorization", &self.password)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}/{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        warn!("Lavalink error ({}): {}", status, message);
        Err(LavalinkError::Status {
            code: status.as_u16(),
            message,
        })
    }
}
