//! High-level Spotify client

use crate::api::{DEFAULT_ACCOUNTS_BASE, DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS, SpotifyApi};
use crate::config_ext::SpotifyConfigExt;
use crate::error::Result;
use crate::models::{PlaylistTracksPage, SpotifyPlaylist, SpotifyTrack};
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use reqwest::Client;
use riffconfig::Config;
use riffqueue::{
    CatalogEntry, CatalogItem, CatalogPage, CatalogProvider, ExternalKind, ExternalRef,
    ProviderError,
};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Time to live of cached track and playlist metadata
const ITEM_TTL: Duration = Duration::from_secs(3600);

/// Spotify client used as playlist provider
///
/// Track and playlist lookups are cached for an hour. Playlist pages are never
/// cached: playlists change.
pub struct SpotifyClient {
    api: SpotifyApi,
    tracks: MokaCache<String, SpotifyTrack>,
    playlists: MokaCache<String, SpotifyPlaylist>,
}

impl SpotifyClient {
    /// Client talking to the public Spotify endpoints
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self> {
        Self::builder()
            .client_id(client_id)
            .client_secret(client_secret)
            .build()
    }

    pub fn builder() -> SpotifyClientBuilder {
        SpotifyClientBuilder::default()
    }

    /// Client built from the process-wide configuration
    pub fn from_config() -> Result<Self> {
        let config = riffconfig::get_config();
        Self::from_config_obj(config.as_ref())
    }

    /// Missing credentials do not prevent building the client: token
    /// requests fail instead, so only Spotify links are affected.
    pub fn from_config_obj(config: &Config) -> Result<Self> {
        let (client_id, client_secret) = match config.get_spotify_credentials() {
            Ok(credentials) => {
                info!("Creating Spotify client for application {}", credentials.0);
                credentials
            }
            Err(e) => {
                warn!("Spotify links will not resolve: {}", e);
                (String::new(), String::new())
            }
        };

        Self::builder()
            .client_id(client_id)
            .client_secret(client_secret)
            .api_base(config.get_spotify_api_base())
            .accounts_base(config.get_spotify_accounts_base())
            .build()
    }

    /// Low-level API access
    pub fn api(&self) -> &SpotifyApi {
        &self.api
    }

    pub async fn get_playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<PlaylistTracksPage> {
        self.retry_on_auth(|| self.api.get_playlist_tracks(playlist_id, offset, limit))
            .await
    }

    pub async fn get_track(&self, track_id: &str) -> Result<SpotifyTrack> {
        if let Some(track) = self.tracks.get(track_id).await {
            debug!("Track {} found in cache", track_id);
            return Ok(track);
        }

        let track = self.retry_on_auth(|| self.api.get_track(track_id)).await?;
        self.tracks
            .insert(track_id.to_string(), track.clone())
            .await;
        Ok(track)
    }

    pub async fn get_playlist(&self, playlist_id: &str) -> Result<SpotifyPlaylist> {
        if let Some(playlist) = self.playlists.get(playlist_id).await {
            debug!("Playlist {} found in cache", playlist_id);
            return Ok(playlist);
        }

        let playlist = self
            .retry_on_auth(|| self.api.get_playlist(playlist_id))
            .await?;
        self.playlists
            .insert(playlist_id.to_string(), playlist.clone())
            .await;
        Ok(playlist)
    }

    /// Runs `call` again once when the token was rejected
    ///
    /// The rejected token has already been dropped by the API layer, so the
    /// second attempt requests a new one.
    async fn retry_on_auth<T, F, Fut>(&self, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match call().await {
            Err(e) if e.is_auth_error() => {
                debug!("Token rejected, retrying with a new one");
                call().await
            }
            other => other,
        }
    }
}

#[async_trait]
impl CatalogProvider for SpotifyClient {
    async fn authorize(&self) -> std::result::Result<(), ProviderError> {
        self.api.access_token().await?;
        Ok(())
    }

    async fn fetch_page(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> std::result::Result<CatalogPage, ProviderError> {
        let page = self.get_playlist_tracks(playlist_id, offset, limit).await?;
        Ok(CatalogPage {
            items: page
                .entries
                .into_iter()
                .map(|entry| match entry {
                    Some(track) => CatalogEntry {
                        name: track.name,
                        artists: track.artists,
                    },
                    None => CatalogEntry::default(),
                })
                .collect(),
            total: page.total,
        })
    }

    async fn fetch_item(
        &self,
        reference: &ExternalRef,
    ) -> std::result::Result<CatalogItem, ProviderError> {
        let item = match reference.kind {
            ExternalKind::Track => {
                let track = self.get_track(&reference.id).await?;
                CatalogItem {
                    kind: ExternalKind::Track,
                    id: track.id.unwrap_or_else(|| reference.id.clone()),
                    name: track.name,
                    artists: track.artists,
                }
            }
            ExternalKind::Playlist => {
                let playlist = self.get_playlist(&reference.id).await?;
                CatalogItem {
                    kind: ExternalKind::Playlist,
                    id: playlist.id,
                    name: Some(playlist.name),
                    artists: Vec::new(),
                }
            }
        };
        Ok(item)
    }
}

/// Builder for [`SpotifyClient`]
///
/// Base URLs can be pointed at a mock server in tests.
pub struct SpotifyClientBuilder {
    client: Option<Client>,
    client_id: String,
    client_secret: String,
    api_base: String,
    accounts_base: String,
    timeout: Duration,
    cache_capacity: u64,
}

impl Default for SpotifyClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            client_id: String::new(),
            client_secret: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            accounts_base: DEFAULT_ACCOUNTS_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_capacity: 1000,
        }
    }
}

impl SpotifyClientBuilder {
    /// Reuses an existing HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = client_secret.into();
        self
    }

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn accounts_base(mut self, url: impl Into<String>) -> Self {
        self.accounts_base = url.into();
        self
    }

    /// HTTP timeout, ignored when a client is supplied
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Empty credentials are accepted; token requests will fail with
    /// [`SpotifyError::Configuration`](crate::SpotifyError::Configuration).
    pub fn build(self) -> Result<SpotifyClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder().timeout(self.timeout).build()?,
        };

        Ok(SpotifyClient {
            api: SpotifyApi::with_client(
                client,
                self.client_id,
                self.client_secret,
                self.api_base,
                self.accounts_base,
            ),
            tracks: MokaCache::builder()
                .max_capacity(self.cache_capacity)
                .time_to_live(ITEM_TTL)
                .build(),
            playlists: MokaCache::builder()
                .max_capacity(self.cache_capacity / 4)
                .time_to_live(ITEM_TTL)
                .build(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpotifyError;

    #[test]
    fn test_builder_overrides_base_urls() {
        let client = SpotifyClient::builder()
            .client_id("id")
            .client_secret("secret")
            .api_base("http://127.0.0.1:1")
            .build()
            .unwrap();
        assert_eq!(client.api().api_base(), "http://127.0.0.1:1");
        assert_eq!(client.api().client_id(), "id");
    }

    #[tokio::test]
    async fn test_from_config_without_credentials() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

        let client = SpotifyClient::from_config_obj(&config).unwrap();
        assert_eq!(client.api().client_id(), "");
        assert!(matches!(
            client.authorize().await,
            Err(ProviderError::Unauthorized(_))
        ));
        assert!(matches!(
            client.get_track("4uLU6hMCjMI75M1A2tKUQC").await,
            Err(SpotifyError::Configuration(_))
        ));
    }
}
