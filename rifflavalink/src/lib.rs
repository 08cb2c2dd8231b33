//! # rifflavalink - Lavalink search backend for RiffBot
//!
//! Minimal REST client for Lavalink v4 nodes: track loading
//! (`/v4/loadtracks`) and health checks (`/version`). [`NodePool`] implements
//! [`riffqueue::SearchBackend`] with ordered failover between nodes.
//!
//! ```rust,no_run
//! use rifflavalink::NodePool;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = NodePool::from_config(&riffconfig::get_config())?;
//!     let healthy = pool.check_health().await;
//!     println!("{} of {} nodes ready", healthy, pool.len());
//!     Ok(())
//! }
//! ```

pub mod config_ext;
pub mod error;
pub mod node;
pub mod pool;

pub use config_ext::LavalinkConfigExt;
pub use error::{LavalinkError, Result};
pub use node::{LavalinkNode, NodeConfig};
pub use pool::{
    DEFAULT_HEALTH_CHECK_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_AFTER, NodePool,
};
