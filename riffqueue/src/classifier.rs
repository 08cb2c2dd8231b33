//! Query classification
//!
//! Decides, from the raw text alone, which resolution path a request takes.

use url::Url;

/// Kind of object an external provider reference points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalKind {
    Track,
    Playlist,
}

impl ExternalKind {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "track" => Some(Self::Track),
            "playlist" => Some(Self::Playlist),
            _ => None,
        }
    }
}

/// Reference to an object of the external metadata provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalRef {
    pub kind: ExternalKind,
    pub id: String,
}

impl ExternalRef {
    pub fn playlist(id: impl Into<String>) -> Self {
        Self {
            kind: ExternalKind::Playlist,
            id: id.into(),
        }
    }

    pub fn track(id: impl Into<String>) -> Self {
        Self {
            kind: ExternalKind::Track,
            id: id.into(),
        }
    }
}

/// Resolution path for a raw query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// External playlist, expanded page by page
    Playlist(ExternalRef),
    /// One external item, resolved like a single playlist entry
    SingleExternal(ExternalRef),
    /// Search text or direct media URL, passed to the backend untouched
    Generic(String),
}

impl QueryKind {
    /// Short label used in log fields
    pub fn label(&self) -> &'static str {
        match self {
            QueryKind::Playlist(_) => "playlist",
            QueryKind::SingleExternal(_) => "single-external",
            QueryKind::Generic(_) => "generic",
        }
    }
}

/// Classifies a raw user query
///
/// Recognised external shapes:
/// - `https://open.spotify.com/playlist/<id>?si=...`
/// - `https://open.spotify.com/intl-fr/track/<id>`
/// - `spotify:playlist:<id>` / `spotify:track:<id>`
///
/// Everything else, including other `spotify.com` pages, is generic.
pub fn classify(raw_query: &str) -> QueryKind {
    let query = raw_query.trim();

    let external = if query.starts_with("spotify:") {
        parse_spotify_uri(query)
    } else {
        parse_spotify_url(query)
    };

    match external {
        Some(reference) if reference.kind == ExternalKind::Playlist => {
            QueryKind::Playlist(reference)
        }
        Some(reference) => QueryKind::SingleExternal(reference),
        None => QueryKind::Generic(query.to_string()),
    }
}

fn parse_spotify_uri(query: &str) -> Option<ExternalRef> {
    let mut parts = query.split(':').skip(1);
    let kind = ExternalKind::from_segment(parts.next()?)?;
    let id = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    build_ref(kind, id)
}

fn parse_spotify_url(query: &str) -> Option<ExternalRef> {
    let url = Url::parse(query).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;
    if host != "spotify.com" && !host.ends_with(".spotify.com") {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.collect();
    segments.windows(2).find_map(|pair| {
        let kind = ExternalKind::from_segment(pair[0])?;
        build_ref(kind, pair[1])
    })
}

fn build_ref(kind: ExternalKind, id: &str) -> Option<ExternalRef> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ExternalRef {
        kind,
        id: id.to_string(),
    })
}
