//! Catalog endpoints: playlists and tracks

use super::SpotifyApi;
use crate::error::Result;
use crate::models::{PlaylistTracksPage, SpotifyPlaylist, SpotifyTrack};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    #[serde(default)]
    name: Option<String>,
}

/// Track object (`/v1/tracks/{id}` or playlist entry)
#[derive(Debug, Deserialize)]
struct TrackResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistResponse>,
}

/// Playlist entry; `track` is null for removed items
#[derive(Debug, Deserialize)]
struct PlaylistItemResponse {
    #[serde(default)]
    track: Option<TrackResponse>,
}

/// Paging object of `/v1/playlists/{id}/tracks`
#[derive(Debug, Deserialize)]
struct PlaylistTracksResponse {
    #[serde(default)]
    items: Vec<PlaylistItemResponse>,
    #[serde(default)]
    total: u32,
    #[serde(default)]
    offset: u32,
}

#[derive(Debug, Deserialize)]
struct PlaylistTracksRef {
    #[serde(default)]
    total: u32,
}

/// Playlist object of `/v1/playlists/{id}`
#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    tracks: Option<PlaylistTracksRef>,
}

impl From<TrackResponse> for SpotifyTrack {
    fn from(track: TrackResponse) -> Self {
        Self {
            id: track.id,
            name: track.name,
            artists: track
                .artists
                .into_iter()
                .filter_map(|a| a.name)
                .filter(|name| !name.trim().is_empty())
                .collect(),
        }
    }
}

impl SpotifyApi {
    /// One page of a playlist's entries
    pub async fn get_playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<PlaylistTracksPage> {
        let endpoint = format!("/v1/playlists/{}/tracks", playlist_id);
        let offset_param = offset.to_string();
        let limit_param = limit.to_string();
        let response: PlaylistTracksResponse = self
            .get(
                &endpoint,
                &[("offset", offset_param.as_str()), ("limit", limit_param.as_str())],
            )
            .await?;

        debug!(
            "Playlist {} page at {}: {} items of {}",
            playlist_id,
            response.offset,
            response.items.len(),
            response.total
        );

        Ok(PlaylistTracksPage {
            entries: response
                .items
                .into_iter()
                .map(|item| item.track.map(SpotifyTrack::from))
                .collect(),
            total: response.total,
            offset: response.offset,
        })
    }

    pub async fn get_track(&self, track_id: &str) -> Result<SpotifyTrack> {
        let response: TrackResponse = self.get(&format!("/v1/tracks/{}", track_id), &[]).await?;
        Ok(response.into())
    }

    pub async fn get_playlist(&self, playlist_id: &str) -> Result<SpotifyPlaylist> {
        let response: PlaylistResponse = self
            .get(
                &format!("/v1/playlists/{}", playlist_id),
                &[("fields", "id,name,tracks.total")],
            )
            .await?;

        Ok(SpotifyPlaylist {
            id: response.id,
            name: response.name,
            total_tracks: response.tracks.map(|t| t.total).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_page_parsing() {
        let json = r#"{
            "items": [
                {"track": {"id": "a", "name": "Song A", "artists": [{"name": "X"}, {"name": "Y"}]}},
                {"track": null},
                {"track": {"id": "c", "name": "Song C", "artists": [{"name": ""}]}}
            ],
            "total": 3,
            "limit": 100,
            "offset": 0
        }"#;

        let response: PlaylistTracksResponse = serde_json::from_str(json).unwrap();
        let entries: Vec<Option<SpotifyTrack>> = response
            .items
            .into_iter()
            .map(|item| item.track.map(SpotifyTrack::from))
            .collect();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].as_ref().unwrap().artists, vec!["X", "Y"]);
        assert!(entries[1].is_none());
        assert!(entries[2].as_ref().unwrap().artists.is_empty());
    }
}
