//! # riffqueue - Track resolution and queue orchestration
//!
//! Turns a free-form music request into tracks appended to a per-guild
//! playback queue.
//!
//! ## Pipeline
//!
//! ```text
//! raw query ─► classify ─┬─► PlaylistExpander ─► [SearchString] ─┐
//!                        └─► query ───────────────────────────────┤
//!                                                                 ▼
//!                         TrackResolver (one call per query, in order)
//!                                                                 ▼
//!                         Session::append + RequesterRegistry ─► Session::play
//! ```
//!
//! External collaborators are reached through traits:
//! [`CatalogProvider`] for playlist metadata (Spotify), [`SearchBackend`] for
//! audio search (Lavalink) and [`PlaybackProvider`] for voice sessions.
//!
//! ## Example
//!
//! ```rust,ignore
//! use riffqueue::{QueueOrchestrator, RequestContext, Requester};
//!
//! let outcome = orchestrator.handle_request(&ctx, "never gonna give you up").await;
//! println!("{}", outcome.message());
//! ```

pub mod backend;
pub mod classifier;
pub mod error;
pub mod expander;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod session;

pub use backend::SearchBackend;
pub use classifier::{ExternalKind, ExternalRef, QueryKind, classify};
pub use error::{BackendError, ProviderError, QueueError, Result, SessionError};
pub use expander::{PAGE_SIZE, PAGINATION_CAP, PlaylistExpander};
pub use model::{
    LoadOutcome, RequestContext, Requester, Resolution, SearchString, Track, TrackInfo,
};
pub use orchestrator::{Precondition, QueueOrchestrator, QueuedFrom, RequestOutcome};
pub use provider::{CatalogEntry, CatalogItem, CatalogPage, CatalogProvider};
pub use registry::{DEFAULT_REGISTRY_CAPACITY, RequesterRegistry};
pub use resolver::{DEFAULT_SEARCH_SOURCE, TrackResolver};
pub use session::{LocalPlayer, LocalSession, PlaybackProvider, PlaybackState, Session, VoiceTarget};
