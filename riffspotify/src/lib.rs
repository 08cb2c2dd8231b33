//! # riffspotify - Spotify catalog client for RiffBot
//!
//! Reads public playlist and track metadata from the Spotify Web API with an
//! application token (client credentials flow). The client implements
//! [`riffqueue::CatalogProvider`], which lets the queue orchestrator expand
//! Spotify links into search strings.
//!
//! ## Layout
//!
//! ```text
//! riffspotify/
//! ├── src/
//! │   ├── lib.rs          # This file
//! │   ├── client.rs       # SpotifyClient, builder, CatalogProvider impl
//! │   ├── models.rs       # Tracks, playlists, pages
//! │   ├── config_ext.rs   # SpotifyConfigExt for riffconfig
//! │   ├── api/
//! │   │   ├── mod.rs      # HTTP plumbing
//! │   │   ├── auth.rs     # Token request and cache
//! │   │   └── catalog.rs  # Playlist and track endpoints
//! │   └── error.rs
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use riffspotify::SpotifyClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SpotifyClient::from_config()?;
//!     let page = client.get_playlist_tracks("37i9dQZF1DXcBWIGoYBM5M", 0, 100).await?;
//!     println!("{} of {} entries", page.entries.len(), page.total);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;

pub use client::{SpotifyClient, SpotifyClientBuilder};
pub use config_ext::SpotifyConfigExt;
pub use error::{Result, SpotifyError};
pub use models::{PlaylistTracksPage, SpotifyPlaylist, SpotifyTrack};
