//! Client credentials flow
//!
//! Playlist and track metadata only need an application token: no user login
//! is involved. The token is cached and requested again shortly before it
//! expires, or after the Web API rejected it.

use super::SpotifyApi;
use crate::error::{Result, SpotifyError};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Margin kept before the announced expiry
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Response of `POST /api/token`
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    expires_in: u64,
}

/// Cached application token
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            value: value.into(),
            expires_at: Instant::now() + expires_in,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Still usable for at least [`TOKEN_EXPIRY_MARGIN`]
    pub fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

impl SpotifyApi {
    /// Returns the cached token, requesting a new one when needed
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        // another task may have refreshed it while we waited
        if let Some(token) = guard.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    /// Whether a fresh token is cached
    pub async fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .await
            .as_ref()
            .is_some_and(AccessToken::is_fresh)
    }

    /// Drops the cached token
    pub async fn invalidate_token(&self) {
        debug!("Invalidating Spotify access token");
        *self.token.write().await = None;
    }

    async fn request_token(&self) -> Result<AccessToken> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(SpotifyError::Configuration(
                "client id and client secret are required".to_string(),
            ));
        }

        let url = format!("{}/api/token", self.accounts_base);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Token request failed ({}): {}", status, error_text);
            // invalid_client comes back as 400
            let code = if status.as_u16() == 400 { 401 } else { status.as_u16() };
            return Err(SpotifyError::from_status_code(code, error_text));
        }

        let body: TokenResponse = serde_json::from_str(&response.text().await?)?;
        info!(
            "Obtained Spotify access token ({}), valid for {}s",
            body.token_type.as_deref().unwrap_or("Bearer"),
            body.expires_in
        );

        Ok(AccessToken::new(
            body.access_token,
            Duration::from_secs(body.expires_in),
        ))
    }
}
