//! Error handling for the Lavalink client

use riffqueue::BackendError;
use thiserror::Error;

/// Result type for rifflavalink
pub type Result<T> = std::result::Result<T, LavalinkError>;

#[derive(Error, Debug)]
pub enum LavalinkError {
    /// Node unreachable, timed out or connection dropped
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Node answered with a non-success status
    #[error("Lavalink node returned status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid node URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// No healthy node left in the pool
    #[error("No Lavalink node available")]
    NoNodes,
}

impl LavalinkError {
    /// The node could not be reached at all
    pub fn is_transport(&self) -> bool {
        matches!(self, LavalinkError::Http(e) if e.status().is_none())
    }
}

impl From<LavalinkError> for BackendError {
    fn from(err: LavalinkError) -> Self {
        match err {
            LavalinkError::NoNodes => BackendError::Unavailable,
            LavalinkError::Status { code, message } => BackendError::Status {
                status: code,
                message,
            },
            other => BackendError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_mapping() {
        assert_eq!(
            BackendError::from(LavalinkError::NoNodes),
            BackendError::Unavailable
        );
        assert_eq!(
            BackendError::from(LavalinkError::Status {
                code: 401,
                message: "Unauthorized".into()
            }),
            BackendError::Status {
                status: 401,
                message: "Unauthorized".into()
            }
        );
    }
}
