//! Error types for track resolution and queue orchestration

use thiserror::Error;

/// Result type for orchestration internals
pub type Result<T> = std::result::Result<T, QueueError>;

/// Failure of the external playlist/track metadata provider
///
/// Never shown to the end user as such: the expander logs it and keeps what
/// it collected so far.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Credential could not be obtained or was rejected
    #[error("Provider authentication failed: {0}")]
    Unauthorized(String),

    /// Network or HTTP failure
    #[error("Provider request failed: {0}")]
    Request(String),

    /// Reference does not exist at the provider
    #[error("Provider item not found: {0}")]
    NotFound(String),

    /// Response could not be decoded
    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

/// Failure of the audio search backend at the transport level
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No node is currently usable
    #[error("No search backend node available")]
    Unavailable,

    /// Request could not be completed
    #[error("Search backend request failed: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("Search backend returned status {status}: {message}")]
    Status { status: u16, message: String },
}

/// Failure of the playback connection collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Failed to open playback connection: {0}")]
    Connection(String),

    #[error("Failed to append track to queue: {0}")]
    Append(String),

    #[error("Failed to start playback: {0}")]
    Play(String),
}

/// Unexpected failures caught at the orchestrator boundary
#[derive(Error, Debug)]
pub enum QueueError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
