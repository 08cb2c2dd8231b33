//! Queue orchestration
//!
//! Drives one user request from raw query to queued tracks: precondition
//! checks, classification, expansion, sequential resolution, enqueueing with
//! requester attribution and the playback trigger.

use crate::classifier::{QueryKind, classify};
use crate::error::Result;
use crate::expander::PlaylistExpander;
use crate::model::{LoadOutcome, RequestContext, SearchString, Track};
use crate::registry::RequesterRegistry;
use crate::resolver::TrackResolver;
use crate::session::{PlaybackProvider, Session, VoiceTarget};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Check failed before any resolution work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The requester is not connected to a voice channel
    NoVoiceChannel,
    /// No search backend node can serve requests
    NoBackendNodes,
}

/// What the queued tracks came from
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedFrom {
    /// One track picked from a search or a direct link
    Track(Track),
    /// A playlist the backend expanded itself
    BackendPlaylist,
    /// An external playlist or track, resolved item by item
    External,
}

/// Summary of one handled request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Queued { count: usize, from: QueuedFrom },
    /// Nothing matched the query
    NoResults,
    /// An external reference produced no playable track
    NoTracksFound,
    /// The backend answered with an unusable response
    ResolutionFailed,
    Precondition(Precondition),
    /// Unexpected error, already logged
    Failed,
}

impl RequestOutcome {
    /// Number of tracks appended to the queue
    pub fn queued(&self) -> usize {
        match self {
            RequestOutcome::Queued { count, .. } => *count,
            _ => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Queued { .. })
    }

    /// Reply shown to the requester
    pub fn message(&self) -> String {
        match self {
            RequestOutcome::Queued {
                from: QueuedFrom::Track(track),
                ..
            } => format!("Now playing: [{}]({})", track.title(), track.uri()),
            RequestOutcome::Queued {
                count,
                from: QueuedFrom::BackendPlaylist,
            } => format!("Added {} tracks from playlist", count),
            RequestOutcome::Queued {
                count,
                from: QueuedFrom::External,
            } => format!("Queued {} tracks from Spotify", count),
            RequestOutcome::NoResults => "No results found for your query.".to_string(),
            RequestOutcome::NoTracksFound => {
                "❌ Failed to process Spotify link. Please try a different source.".to_string()
            }
            RequestOutcome::ResolutionFailed => {
                "❌ Failed to process your request. Please try a different query.".to_string()
            }
            RequestOutcome::Precondition(Precondition::NoVoiceChannel) => {
                "You need to join a voice channel first.".to_string()
            }
            RequestOutcome::Precondition(Precondition::NoBackendNodes) => {
                "No audio node is available right now. Please try again later.".to_string()
            }
            RequestOutcome::Failed => {
                "❌ An unexpected error occurred. Please try again.".to_string()
            }
        }
    }
}

/// End-to-end request handling
#[derive(Clone)]
pub struct QueueOrchestrator {
    expander: PlaylistExpander,
    resolver: TrackResolver,
    playback: Arc<dyn PlaybackProvider>,
    registry: Arc<RequesterRegistry>,
}

impl QueueOrchestrator {
    pub fn new(
        expander: PlaylistExpander,
        resolver: TrackResolver,
        playback: Arc<dyn PlaybackProvider>,
        registry: Arc<RequesterRegistry>,
    ) -> Self {
        Self {
            expander,
            resolver,
            playback,
            registry,
        }
    }

    /// Registry written on every enqueue
    pub fn registry(&self) -> &Arc<RequesterRegistry> {
        &self.registry
    }

    /// Handles one request and never fails: errors and panics become
    /// [`RequestOutcome::Failed`] after being logged.
    pub async fn handle_request(&self, ctx: &RequestContext, raw_query: &str) -> RequestOutcome {
        let kind = classify(raw_query);
        let span = info_span!(
            "request",
            guild_id = %ctx.guild_id,
            requester = %ctx.requester.display_name,
            kind = kind.label(),
        );

        let handled = AssertUnwindSafe(self.dispatch(ctx, kind))
            .catch_unwind()
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        match handled {
            Ok(Ok(outcome)) => {
                info!(queued = outcome.queued(), "Request handled");
                outcome
            }
            Ok(Err(e)) => {
                error!("Request failed: {}", e);
                RequestOutcome::Failed
            }
            Err(_) => {
                error!("Request handling panicked");
                RequestOutcome::Failed
            }
        }
    }

    async fn dispatch(&self, ctx: &RequestContext, kind: QueryKind) -> Result<RequestOutcome> {
        let Some(voice_channel_id) = ctx.voice_channel_id.as_deref() else {
            return Ok(RequestOutcome::Precondition(Precondition::NoVoiceChannel));
        };
        if self.resolver.available_nodes() == 0 {
            return Ok(RequestOutcome::Precondition(Precondition::NoBackendNodes));
        }

        let session = self
            .playback
            .create_or_get_connection(&VoiceTarget {
                guild_id: ctx.guild_id.clone(),
                voice_channel_id: voice_channel_id.to_string(),
                text_channel_id: ctx.text_channel_id.clone(),
            })
            .await?;

        match kind {
            QueryKind::Generic(query) => self.queue_generic(ctx, session.as_ref(), &query).await,
            QueryKind::Playlist(reference) => {
                let queries = self.expander.expand(&reference.id).await;
                let count = self.queue_batch(ctx, session.as_ref(), &queries).await?;
                if count == 0 {
                    return Ok(RequestOutcome::NoTracksFound);
                }
                Ok(RequestOutcome::Queued {
                    count,
                    from: QueuedFrom::External,
                })
            }
            QueryKind::SingleExternal(reference) => {
                let queries = self.expander.expand_item(&reference).await;
                let count = self.queue_batch(ctx, session.as_ref(), &queries).await?;
                if count == 0 {
                    return Ok(RequestOutcome::NoResults);
                }
                Ok(RequestOutcome::Queued {
                    count,
                    from: QueuedFrom::External,
                })
            }
        }
    }

    async fn queue_generic(
        &self,
        ctx: &RequestContext,
        session: &dyn Session,
        query: &str,
    ) -> Result<RequestOutcome> {
        let resolution = self
            .resolver
            .resolve(&SearchString::new(query), &ctx.requester)
            .await?;

        match resolution.outcome {
            LoadOutcome::NoMatch => Ok(RequestOutcome::NoResults),
            LoadOutcome::LoadFailed { ref message } => {
                debug!(message = ?message, "Backend could not load query");
                Ok(RequestOutcome::NoResults)
            }
            LoadOutcome::MalformedResponse { ref reason } => {
                warn!(reason = %reason, "Malformed backend response");
                Ok(RequestOutcome::ResolutionFailed)
            }
            LoadOutcome::Playlist { ref name } => {
                let count = resolution.tracks.len();
                if count == 0 {
                    return Ok(RequestOutcome::NoResults);
                }
                debug!(playlist = ?name, count, "Queueing backend playlist");
                for track in resolution.tracks {
                    self.enqueue(session, track).await?;
                }
                self.start_if_idle(session).await?;
                Ok(RequestOutcome::Queued {
                    count,
                    from: QueuedFrom::BackendPlaylist,
                })
            }
            LoadOutcome::Single => {
                let Some(track) = resolution.into_first() else {
                    return Ok(RequestOutcome::NoResults);
                };
                self.enqueue(session, track.clone()).await?;
                self.start_if_idle(session).await?;
                Ok(RequestOutcome::Queued {
                    count: 1,
                    from: QueuedFrom::Track(track),
                })
            }
        }
    }

    /// Resolves `queries` one at a time, in order, queueing the best match of
    /// each. Items without a usable match are skipped.
    async fn queue_batch(
        &self,
        ctx: &RequestContext,
        session: &dyn Session,
        queries: &[SearchString],
    ) -> Result<usize> {
        let mut queued = 0;

        for query in queries {
            let resolution = match self.resolver.resolve(query, &ctx.requester).await {
                Ok(resolution) => resolution,
                Err(e) => {
                    warn!(query = %query, "Skipping item: {}", e);
                    continue;
                }
            };
            if let LoadOutcome::MalformedResponse { reason } = &resolution.outcome {
                warn!(query = %query, reason = %reason, "Skipping item: malformed response");
                continue;
            }
            match resolution.into_first() {
                Some(track) => {
                    if let Err(e) = self.enqueue(session, track).await {
                        // tracks appended so far still get played
                        if queued > 0 {
                            if let Err(play_err) = self.start_if_idle(session).await {
                                warn!("Could not start playback after partial batch: {}", play_err);
                            }
                        }
                        return Err(e);
                    }
                    queued += 1;
                }
                None => debug!(query = %query, "No match for item"),
            }
        }

        if queued > 0 {
            self.start_if_idle(session).await?;
        }
        debug!(requested = queries.len(), queued, "Batch resolved");
        Ok(queued)
    }

    async fn enqueue(&self, session: &dyn Session, track: Track) -> Result<()> {
        let uri = track.uri().to_string();
        let requester = track.requester().display_name.clone();
        session.append(track).await?;
        self.registry.record(&uri, &requester).await;
        Ok(())
    }

    async fn start_if_idle(&self, session: &dyn Session) -> Result<()> {
        if !session.is_playing().await && !session.is_paused().await {
            session.play().await?;
        }
        Ok(())
    }
}
