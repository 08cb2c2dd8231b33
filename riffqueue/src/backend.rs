//! Audio search backend seam

use crate::error::BackendError;
use async_trait::async_trait;
use serde_json::Value;

/// Audio search backend (a pool of Lavalink nodes in production)
///
/// The raw JSON body is returned as-is: validating and normalizing its shape
/// is the resolver's job.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Number of nodes currently able to serve requests
    fn available_nodes(&self) -> usize;

    /// Loads tracks for an identifier (`ytmsearch:...` or a media URL)
    async fn load_tracks(&self, identifier: &str) -> Result<Value, BackendError>;
}
