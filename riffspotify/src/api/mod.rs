//! Low-level access to the Spotify Web API
//!
//! [`SpotifyApi`] owns the HTTP client and the application access token.
//! Endpoints live in [`auth`] and [`catalog`].

pub mod auth;
pub mod catalog;

use crate::error::{Result, SpotifyError};
use auth::AccessToken;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Web API base URL
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com";

/// Accounts service base URL (token endpoint)
pub const DEFAULT_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Default HTTP timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Low-level API client
pub struct SpotifyApi {
    client: Client,
    api_base: String,
    accounts_base: String,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<AccessToken>>,
}

impl SpotifyApi {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(
            client,
            client_id,
            client_secret,
            DEFAULT_API_BASE,
            DEFAULT_ACCOUNTS_BASE,
        ))
    }

    /// Uses an existing HTTP client and custom base URLs
    pub fn with_client(
        client: Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        api_base: impl Into<String>,
        accounts_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            accounts_base: accounts_base.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: RwLock::new(None),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// GET on a Web API endpoint (`/v1/...`) with the application token
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.api_base, endpoint);

        debug!("GET {} with {} params", url, params.len());

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await?;

        match Self::handle_response(response).await {
            Err(e) if e.is_auth_error() => {
                // the token was revoked or expired early
                self.invalidate_token().await;
                Err(e)
            }
            other => other,
        }
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let status_code = status.as_u16();

        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Spotify API error ({}): {}", status_code, error_text);
            return Err(SpotifyError::from_status_code(status_code, error_text));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            SpotifyError::JsonParse(e)
        })
    }
}
