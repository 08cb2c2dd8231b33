//! Requester registry
//!
//! Maps a track URI to the display name of the user who queued it, for
//! "now playing" displays. Entries are bounded: once `capacity` is reached
//! the least recently queued URIs are evicted.

use moka::future::Cache as MokaCache;
use moka::policy::EvictionPolicy;
use std::time::Duration;

/// Default number of entries kept
pub const DEFAULT_REGISTRY_CAPACITY: u64 = 10_000;

/// Track URI → requester display name
#[derive(Clone)]
pub struct RequesterRegistry {
    entries: MokaCache<String, String>,
}

impl RequesterRegistry {
    pub fn new() -> Self {
        Self::with_policy(DEFAULT_REGISTRY_CAPACITY, None)
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self::with_policy(capacity, None)
    }

    /// Capped LRU registry, entries optionally expiring after `idle` without access
    pub fn with_policy(capacity: u64, idle: Option<Duration>) -> Self {
        let mut builder = MokaCache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(idle) = idle {
            builder = builder.time_to_idle(idle);
        }
        Self {
            entries: builder.build(),
        }
    }

    /// Builds the registry from `queue.registry.*` settings
    pub fn from_config(config: &riffconfig::Config) -> Self {
        let capacity = config
            .get_registry_capacity()
            .map(|c| c as u64)
            .unwrap_or(DEFAULT_REGISTRY_CAPACITY);
        let idle = match config.get_registry_idle_secs() {
            Ok(0) | Err(_) => None,
            Ok(secs) => Some(Duration::from_secs(secs as u64)),
        };
        Self::with_policy(capacity, idle)
    }

    /// Records who queued `uri`, replacing any previous requester
    pub async fn record(&self, uri: &str, display_name: &str) {
        self.entries
            .insert(uri.to_string(), display_name.to_string())
            .await;
    }

    /// Display name of the user who last queued `uri`
    pub async fn get(&self, uri: &str) -> Option<String> {
        self.entries.get(uri).await
    }

    /// Number of entries, after pending evictions are applied
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for RequesterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
