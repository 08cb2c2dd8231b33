//! Spotify catalog data

use serde::{Deserialize, Serialize};

/// A track as far as search strings are concerned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Artist names, in credit order
    pub artists: Vec<String>,
}

/// Playlist header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    /// Number of entries reported by Spotify
    pub total_tracks: u32,
}

/// One page of playlist entries
///
/// Removed or unavailable entries are kept as `None` so that `entries.len()`
/// is the number of items Spotify returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistTracksPage {
    pub entries: Vec<Option<SpotifyTrack>>,
    pub total: u32,
    pub offset: u32,
}
