//! Error handling for the Spotify client

use riffqueue::ProviderError;
use thiserror::Error;

/// Result type for riffspotify
pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Errors raised while talking to the Spotify Web API
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Client credentials rejected, or token expired
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Playlist or track does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Client id or secret missing
    #[error("Spotify configuration error: {0}")]
    Configuration(String),

    #[error("Spotify API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Rate limit exceeded, please try again later")]
    RateLimitExceeded,
}

impl SpotifyError {
    /// Builds an error from an HTTP status code and the response body
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            429 => Self::RateLimitExceeded,
            _ => Self::ApiError {
                code,
                message: message.into(),
            },
        }
    }

    /// Whether the token should be dropped and requested again
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SpotifyError::Unauthorized(_))
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SpotifyError::RateLimitExceeded)
    }
}

impl From<SpotifyError> for ProviderError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Unauthorized(msg) => ProviderError::Unauthorized(msg),
            SpotifyError::Configuration(msg) => ProviderError::Unauthorized(msg),
            SpotifyError::NotFound(msg) => ProviderError::NotFound(msg),
            SpotifyError::JsonParse(e) => ProviderError::InvalidResponse(e.to_string()),
            other => ProviderError::Request(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code() {
        assert!(matches!(
            SpotifyError::from_status_code(401, "expired"),
            SpotifyError::Unauthorized(_)
        ));
        assert!(matches!(
            SpotifyError::from_status_code(404, "gone"),
            SpotifyError::NotFound(_)
        ));
        assert!(SpotifyError::from_status_code(429, "").is_rate_limit());
        assert!(matches!(
            SpotifyError::from_status_code(502, "bad gateway"),
            SpotifyError::ApiError { code: 502, .. }
        ));
    }

    #[test]
    fn test_provider_error_mapping() {
        let mapped: ProviderError = SpotifyError::from_status_code(403, "forbidden").into();
        assert_eq!(mapped, ProviderError::Unauthorized("forbidden".into()));

        let mapped: ProviderError = SpotifyError::RateLimitExceeded.into();
        assert!(matches!(mapped, ProviderError::Request(_)));
    }
}
