//! Shared data model: requesters, tracks, search strings and load outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// The chat user who asked for a track
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requester {
    /// Platform user id
    pub id: String,
    /// Name shown next to the track ("requested by ...")
    pub display_name: String,
}

impl Requester {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Platform context of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub guild_id: String,
    pub text_channel_id: String,
    /// Voice channel the requester is connected to, if any
    pub voice_channel_id: Option<String>,
    pub requester: Requester,
}

/// Track metadata as normalized from a search backend response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Unique, non-empty URI of the track
    pub uri: String,
    pub title: String,
    /// Artist or uploader display string
    pub author: String,
    /// Opaque playback handle issued by the backend
    pub encoded: Option<String>,
    pub length_ms: u64,
    pub is_stream: bool,
    pub source_name: Option<String>,
}

impl TrackInfo {
    /// Attaches the requester, producing a queueable track
    pub fn requested_by(self, requester: Requester) -> Track {
        Track {
            info: self,
            requester,
        }
    }
}

/// A resolved track attributed to its requester
///
/// The requester is fixed when the track is built and cannot be changed
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    info: TrackInfo,
    requester: Requester,
}

impl Track {
    pub fn info(&self) -> &TrackInfo {
        &self.info
    }

    pub fn uri(&self) -> &str {
        &self.info.uri
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn author(&self) -> &str {
        &self.info.author
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }
}

/// Text query handed to the search backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchString(String);

impl SearchString {
    pub fn new(query: impl Into<String>) -> Self {
        Self(query.into())
    }

    /// Builds `"<name> - <artist1, artist2, ...>"` from catalog metadata
    ///
    /// Returns `None` when the name is missing or blank, or when no artist
    /// has a non-blank name.
    pub fn from_metadata<S: AsRef<str>>(name: Option<&str>, artists: &[S]) -> Option<Self> {
        let name = name.map(str::trim).filter(|n| !n.is_empty())?;
        let artists: Vec<&str> = artists
            .iter()
            .map(|a| a.as_ref().trim())
            .filter(|a| !a.is_empty())
            .collect();
        if artists.is_empty() {
            return None;
        }
        Some(Self(format!("{} - {}", name, artists.join(", "))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SearchString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Classification of one resolution attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// One track, or ranked search candidates (best first)
    Single,
    /// The backend expanded a playlist it understands natively
    Playlist { name: Option<String> },
    /// The backend found nothing
    NoMatch,
    /// The backend could not load the reference
    LoadFailed { message: Option<String> },
    /// The backend answered with a shape that cannot be trusted
    MalformedResponse { reason: String },
}

/// Outcome of [`crate::TrackResolver::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: LoadOutcome,
    /// Candidates in backend order, each stamped with the requester
    pub tracks: Vec<Track>,
}

impl Resolution {
    pub(crate) fn empty(outcome: LoadOutcome) -> Self {
        Self {
            outcome,
            tracks: Vec::new(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.outcome, LoadOutcome::MalformedResponse { .. })
    }

    /// Best candidate, if any
    pub fn into_first(self) -> Option<Track> {
        self.tracks.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_string_from_metadata() {
        let s = SearchString::from_metadata(Some("Giant Steps"), &["John Coltrane"]).unwrap();
        assert_eq!(s.as_str(), "Giant Steps - John Coltrane");

        let s = SearchString::from_metadata(Some("Under Pressure"), &["Queen", "David Bowie"])
            .unwrap();
        assert_eq!(s.to_string(), "Under Pressure - Queen, David Bowie");
    }

    #[test]
    fn test_search_string_requires_name_and_artist() {
        let none: [&str; 0] = [];
        assert!(SearchString::from_metadata(None, &["Queen"]).is_none());
        assert!(SearchString::from_metadata(Some("  "), &["Queen"]).is_none());
        assert!(SearchString::from_metadata(Some("Song"), &none).is_none());
        assert!(SearchString::from_metadata(Some("Song"), &["", " "]).is_none());
    }

    #[test]
    fn test_requester_is_attached() {
        let info = TrackInfo {
            uri: "https://example.com/a".into(),
            title: "A".into(),
            author: "B".into(),
            encoded: None,
            length_ms: 1000,
            is_stream: false,
            source_name: None,
        };
        let track = info.requested_by(Requester::new("1", "alice"));
        assert_eq!(track.requester().display_name, "alice");
        assert_eq!(track.uri(), "https://example.com/a");
    }
}
