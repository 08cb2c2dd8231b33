//! Track resolution against the audio search backend
//!
//! The backend speaks either the Lavalink v3 or the v4 REST dialect. Both are
//! normalized here into a [`Resolution`]: a closed [`LoadOutcome`] plus the
//! candidate tracks, stamped with the requester.
//!
//! ```text
//! v3: {"loadType": "SEARCH_RESULT", "tracks": [{"track": "...", "info": {...}}]}
//! v4: {"loadType": "search", "data": [{"encoded": "...", "info": {...}}]}
//! ```

use crate::backend::SearchBackend;
use crate::error::BackendError;
use crate::model::{LoadOutcome, Requester, Resolution, SearchString, TrackInfo};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Search prefix used when none is configured
pub const DEFAULT_SEARCH_SOURCE: &str = "ytmsearch";

/// Backend load types, both dialects folded together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadType {
    Track,
    Playlist,
    Search,
    Empty,
    Error,
}

/// Protocol dialect, told apart by the spelling of the load type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    V3,
    V4,
}

impl LoadType {
    fn parse(tag: &str) -> Option<(Self, Dialect)> {
        let parsed = match tag {
            "TRACK_LOADED" => (Self::Track, Dialect::V3),
            "PLAYLIST_LOADED" => (Self::Playlist, Dialect::V3),
            "SEARCH_RESULT" => (Self::Search, Dialect::V3),
            "NO_MATCHES" => (Self::Empty, Dialect::V3),
            "LOAD_FAILED" => (Self::Error, Dialect::V3),
            "track" => (Self::Track, Dialect::V4),
            "playlist" => (Self::Playlist, Dialect::V4),
            "search" => (Self::Search, Dialect::V4),
            "empty" => (Self::Empty, Dialect::V4),
            "error" => (Self::Error, Dialect::V4),
            _ => return None,
        };
        Some(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    #[serde(default, alias = "track")]
    encoded: Option<String>,
    info: RawTrackInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrackInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    length: u64,
    #[serde(default)]
    is_stream: bool,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    source_name: Option<String>,
}

impl RawTrack {
    fn into_info(self) -> Option<TrackInfo> {
        let uri = self.info.uri.filter(|u| !u.trim().is_empty())?;
        Some(TrackInfo {
            uri,
            title: self.info.title,
            author: self.info.author,
            encoded: self.encoded,
            length_ms: self.info.length,
            is_stream: self.info.is_stream,
            source_name: self.info.source_name,
        })
    }
}

/// Backend response after shape validation
#[derive(Debug)]
struct Normalized {
    outcome: LoadOutcome,
    tracks: Vec<TrackInfo>,
}

/// Resolves search strings and raw queries into tracks
#[derive(Clone)]
pub struct TrackResolver {
    backend: Arc<dyn SearchBackend>,
    search_source: String,
}

impl TrackResolver {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self::with_search_source(backend, DEFAULT_SEARCH_SOURCE)
    }

    /// Uses `source` (e.g. `ytsearch`, `scsearch`) as prefix for text queries
    pub fn with_search_source(backend: Arc<dyn SearchBackend>, source: &str) -> Self {
        Self {
            backend,
            search_source: source.trim_end_matches(':').to_string(),
        }
    }

    /// Builds a resolver using the configured search source
    pub fn from_config(backend: Arc<dyn SearchBackend>, config: &riffconfig::Config) -> Self {
        Self::with_search_source(backend, &config.get_default_search_source())
    }

    /// Number of backend nodes able to serve requests
    pub fn available_nodes(&self) -> usize {
        self.backend.available_nodes()
    }

    /// Turns a query into the identifier sent to the backend
    ///
    /// URLs and queries already carrying a `<source>search:` prefix are kept
    /// as they are.
    pub fn identifier_for(&self, query: &str) -> String {
        let query = query.trim();
        if query.starts_with("http://") || query.starts_with("https://") || has_search_prefix(query)
        {
            query.to_string()
        } else {
            format!("{}:{}", self.search_source, query)
        }
    }

    /// Resolves one query with a single backend call
    ///
    /// Transport failures are returned as errors. Every answer the backend
    /// actually gave, including an unusable one, is a [`Resolution`].
    pub async fn resolve(
        &self,
        query: &SearchString,
        requester: &Requester,
    ) -> Result<Resolution, BackendError> {
        let identifier = self.identifier_for(query.as_str());
        debug!(identifier = %identifier, "Resolving query");

        let raw = self.backend.load_tracks(&identifier).await?;

        let resolution = match normalize(raw) {
            Ok(normalized) => Resolution {
                outcome: normalized.outcome,
                tracks: normalized
                    .tracks
                    .into_iter()
                    .map(|info| info.requested_by(requester.clone()))
                    .collect(),
            },
            Err(reason) => Resolution::empty(LoadOutcome::MalformedResponse { reason }),
        };

        debug!(
            identifier = %identifier,
            outcome = ?resolution.outcome,
            candidates = resolution.tracks.len(),
            "Query resolved"
        );
        Ok(resolution)
    }
}

fn has_search_prefix(query: &str) -> bool {
    match query.split_once(':') {
        Some((prefix, rest)) => {
            prefix.len() > "search".len()
                && prefix.ends_with("search")
                && prefix.chars().all(|c| c.is_ascii_alphanumeric())
                && !rest.is_empty()
        }
        None => false,
    }
}

/// Validates a raw backend body and extracts its tracks
fn normalize(raw: Value) -> Result<Normalized, String> {
    let tag = raw
        .get("loadType")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing loadType".to_string())?;
    let (load_type, dialect) =
        LoadType::parse(tag).ok_or_else(|| format!("unknown loadType '{}'", tag))?;

    match dialect {
        Dialect::V3 => normalize_v3(load_type, &raw),
        Dialect::V4 => normalize_v4(load_type, &raw),
    }
}

fn normalize_v3(load_type: LoadType, raw: &Value) -> Result<Normalized, String> {
    // v3 always carries a track array, even when empty
    let tracks = match raw.get("tracks") {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err("'tracks' is not an array".to_string()),
        None => return Err("missing 'tracks'".to_string()),
    };

    let outcome = match load_type {
        LoadType::Track | LoadType::Search => LoadOutcome::Single,
        LoadType::Playlist => LoadOutcome::Playlist {
            name: raw
                .pointer("/playlistInfo/name")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        LoadType::Empty => return Ok(no_tracks(LoadOutcome::NoMatch)),
        LoadType::Error => {
            return Ok(no_tracks(LoadOutcome::LoadFailed {
                message: raw
                    .pointer("/exception/message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }));
        }
    };

    Ok(Normalized {
        outcome,
        tracks: decode_tracks(tracks)?,
    })
}

fn normalize_v4(load_type: LoadType, raw: &Value) -> Result<Normalized, String> {
    let data = raw.get("data");

    match load_type {
        LoadType::Empty => Ok(no_tracks(LoadOutcome::NoMatch)),
        LoadType::Error => Ok(no_tracks(LoadOutcome::LoadFailed {
            message: data
                .and_then(|d| d.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string),
        })),
        LoadType::Track => match data {
            Some(entry @ Value::Object(_)) => Ok(Normalized {
                outcome: LoadOutcome::Single,
                tracks: decode_tracks(std::slice::from_ref(entry))?,
            }),
            _ => Err("'data' is not a track object".to_string()),
        },
        LoadType::Search => match data {
            Some(Value::Array(entries)) => Ok(Normalized {
                outcome: LoadOutcome::Single,
                tracks: decode_tracks(entries)?,
            }),
            _ => Err("'data' is not an array".to_string()),
        },
        LoadType::Playlist => match data.and_then(|d| d.get("tracks")) {
            Some(Value::Array(entries)) => Ok(Normalized {
                outcome: LoadOutcome::Playlist {
                    name: data
                        .and_then(|d| d.pointer("/info/name"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
                tracks: decode_tracks(entries)?,
            }),
            _ => Err("'data.tracks' is not an array".to_string()),
        },
    }
}

fn no_tracks(outcome: LoadOutcome) -> Normalized {
    Normalized {
        outcome,
        tracks: Vec::new(),
    }
}

fn decode_tracks(entries: &[Value]) -> Result<Vec<TrackInfo>, String> {
    let mut tracks = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let raw: RawTrack = serde_json::from_value(entry.clone())
            .map_err(|e| format!("track #{} is invalid: {}", index, e))?;
        match raw.into_info() {
            Some(info) => tracks.push(info),
            None => debug!(index, "Dropping track without uri"),
        }
    }
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct StaticBackend {
        body: Value,
        identifiers: Mutex<Vec<String>>,
    }

    impl StaticBackend {
        fn new(body: Value) -> Arc<Self> {
            Arc::new(Self {
                body,
                identifiers: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SearchBackend for StaticBackend {
        fn available_nodes(&self) -> usize {
            1
        }

        async fn load_tracks(&self, identifier: &str) -> Result<Value, BackendError> {
            self.identifiers.lock().unwrap().push(identifier.to_string());
            Ok(self.body.clone())
        }
    }

    fn track_json(uri: &str, title: &str) -> Value {
        json!({
            "encoded": format!("enc-{}", title),
            "info": {
                "identifier": title,
                "title": title,
                "author": "Some Artist",
                "length": 212000,
                "isStream": false,
                "uri": uri,
                "sourceName": "youtube"
            }
        })
    }

    fn requester() -> Requester {
        Requester::new("42", "alice")
    }

    async fn resolve(body: Value) -> Resolution {
        TrackResolver::new(StaticBackend::new(body))
            .resolve(&SearchString::new("query"), &requester())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_v4_search_result() {
        let res = resolve(json!({
            "loadType": "search",
            "data": [track_json("https://yt/1", "one"), track_json("https://yt/2", "two")]
        }))
        .await;

        assert_eq!(res.outcome, LoadOutcome::Single);
        assert_eq!(res.tracks.len(), 2);
        assert_eq!(res.tracks[0].uri(), "https://yt/1");
        assert_eq!(res.tracks[0].info().encoded.as_deref(), Some("enc-one"));
        assert!(res.tracks.iter().all(|t| t.requester() == &requester()));
    }

    #[tokio::test]
    async fn test_v4_single_track_and_playlist() {
        let res = resolve(json!({"loadType": "track", "data": track_json("https://yt/1", "one")}))
            .await;
        assert_eq!(res.outcome, LoadOutcome::Single);
        assert_eq!(res.tracks.len(), 1);

        let res = resolve(json!({
            "loadType": "playlist",
            "data": {
                "info": {"name": "Mix", "selectedTrack": -1},
                "tracks": [track_json("https://yt/1", "one"), track_json("https://yt/2", "two")]
            }
        }))
        .await;
        assert_eq!(
            res.outcome,
            LoadOutcome::Playlist {
                name: Some("Mix".into())
            }
        );
        assert_eq!(res.tracks.len(), 2);
    }

    #[tokio::test]
    async fn test_v3_shapes() {
        let res = resolve(json!({
            "loadType": "SEARCH_RESULT",
            "tracks": [{"track": "abc", "info": {"title": "one", "author": "x", "uri": "https://yt/1"}}]
        }))
        .await;
        assert_eq!(res.outcome, LoadOutcome::Single);
        assert_eq!(res.tracks[0].info().encoded.as_deref(), Some("abc"));

        let res = resolve(json!({"loadType": "NO_MATCHES", "tracks": []})).await;
        assert_eq!(res.outcome, LoadOutcome::NoMatch);

        let res = resolve(json!({
            "loadType": "LOAD_FAILED",
            "tracks": [],
            "exception": {"message": "Video unavailable", "severity": "COMMON"}
        }))
        .await;
        assert_eq!(
            res.outcome,
            LoadOutcome::LoadFailed {
                message: Some("Video unavailable".into())
            }
        );
        assert!(res.tracks.is_empty());
    }

    #[tokio::test]
    async fn test_empty_and_error_are_not_malformed() {
        let res = resolve(json!({"loadType": "empty", "data": {}})).await;
        assert_eq!(res.outcome, LoadOutcome::NoMatch);
        assert!(!res.is_malformed());

        let res = resolve(json!({"loadType": "error", "data": {"message": "boom"}})).await;
        assert_eq!(
            res.outcome,
            LoadOutcome::LoadFailed {
                message: Some("boom".into())
            }
        );
    }

    #[tokio::test]
    async fn test_missing_or_invalid_track_list_is_malformed() {
        assert!(resolve(json!({"loadType": "SEARCH_RESULT"})).await.is_malformed());
        assert!(
            resolve(json!({"loadType": "SEARCH_RESULT", "tracks": "nope"}))
                .await
                .is_malformed()
        );
        assert!(
            resolve(json!({"loadType": "NO_MATCHES", "tracks": null}))
                .await
                .is_malformed()
        );
        assert!(resolve(json!({"loadType": "search", "data": {}})).await.is_malformed());
        assert!(resolve(json!({"loadType": "playlist", "data": {}})).await.is_malformed());
    }

    #[tokio::test]
    async fn test_unknown_or_missing_load_type_is_malformed() {
        assert!(resolve(json!({"loadType": "WHATEVER", "tracks": []})).await.is_malformed());
        assert!(resolve(json!({"tracks": []})).await.is_malformed());
        assert!(resolve(json!("not an object")).await.is_malformed());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_malformed() {
        let res = resolve(json!({"loadType": "search", "data": [{"encoded": "x", "info": 3}]})).await;
        assert!(res.is_malformed());
    }

    #[tokio::test]
    async fn test_entries_without_uri_are_dropped() {
        let res = resolve(json!({
            "loadType": "search",
            "data": [
                {"encoded": "x", "info": {"title": "no uri"}},
                track_json("https://yt/2", "two")
            ]
        }))
        .await;
        assert_eq!(res.tracks.len(), 1);
        assert_eq!(res.tracks[0].uri(), "https://yt/2");
    }

    #[tokio::test]
    async fn test_identifier_preparation() {
        let backend = StaticBackend::new(json!({"loadType": "empty"}));
        let resolver = TrackResolver::with_search_source(backend.clone(), "scsearch:");

        assert_eq!(resolver.identifier_for("lofi beats"), "scsearch:lofi beats");
        assert_eq!(
            resolver.identifier_for("https://youtu.be/dQw4w9WgXcQ"),
            "https://youtu.be/dQw4w9WgXcQ"
        );
        assert_eq!(resolver.identifier_for("ytsearch:abc"), "ytsearch:abc");
        assert_eq!(resolver.identifier_for("Artist: Title"), "scsearch:Artist: Title");

        resolver
            .resolve(&SearchString::new("x"), &requester())
            .await
            .unwrap();
        assert_eq!(*backend.identifiers.lock().unwrap(), vec!["scsearch:x"]);
    }
}
