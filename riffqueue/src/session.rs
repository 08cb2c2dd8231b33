//! Playback connection seam and an in-memory implementation
//!
//! The orchestrator only ever appends tracks and asks an idle session to
//! start playing. Queue internals belong to the session implementation.

use crate::error::SessionError;
use crate::model::Track;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Playback state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Where a session plays and reports
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceTarget {
    pub guild_id: String,
    pub voice_channel_id: String,
    pub text_channel_id: String,
}

/// One guild's playback queue
#[async_trait]
pub trait Session: Send + Sync {
    /// Appends a track at the end of the queue
    async fn append(&self, track: Track) -> Result<(), SessionError>;

    /// Starts playing the queue
    async fn play(&self) -> Result<(), SessionError>;

    async fn state(&self) -> PlaybackState;

    async fn is_playing(&self) -> bool {
        self.state().await == PlaybackState::Playing
    }

    async fn is_paused(&self) -> bool {
        self.state().await == PlaybackState::Paused
    }
}

/// Opens or reuses the session bound to a guild
#[async_trait]
pub trait PlaybackProvider: Send + Sync {
    async fn create_or_get_connection(
        &self,
        target: &VoiceTarget,
    ) -> Result<Arc<dyn Session>, SessionError>;
}

#[derive(Debug, Default)]
struct LocalQueue {
    current: Option<Track>,
    upcoming: VecDeque<Track>,
    state: PlaybackState,
}

/// In-memory session: keeps the queue and state, plays nothing
#[derive(Debug)]
pub struct LocalSession {
    target: RwLock<VoiceTarget>,
    queue: Mutex<LocalQueue>,
}

impl LocalSession {
    pub fn new(target: VoiceTarget) -> Self {
        Self {
            target: RwLock::new(target),
            queue: Mutex::new(LocalQueue::default()),
        }
    }

    pub async fn target(&self) -> VoiceTarget {
        self.target.read().await.clone()
    }

    /// Track currently loaded in the player
    pub async fn now_playing(&self) -> Option<Track> {
        self.queue.lock().await.current.clone()
    }

    /// Tracks waiting after the current one, in order
    pub async fn upcoming(&self) -> Vec<Track> {
        self.queue.lock().await.upcoming.iter().cloned().collect()
    }

    pub async fn pause(&self) {
        let mut queue = self.queue.lock().await;
        if queue.state == PlaybackState::Playing {
            queue.state = PlaybackState::Paused;
        }
    }

    pub async fn resume(&self) {
        let mut queue = self.queue.lock().await;
        if queue.state == PlaybackState::Paused {
            queue.state = PlaybackState::Playing;
        }
    }

    /// Moves to the next queued track, going idle when none is left
    pub async fn skip(&self) -> Option<Track> {
        let mut queue = self.queue.lock().await;
        queue.current = queue.upcoming.pop_front();
        if queue.current.is_none() {
            queue.state = PlaybackState::Idle;
        }
        queue.current.clone()
    }
}

#[async_trait]
impl Session for LocalSession {
    async fn append(&self, track: Track) -> Result<(), SessionError> {
        let mut queue = self.queue.lock().await;
        debug!(uri = %track.uri(), position = queue.upcoming.len(), "Track queued");
        queue.upcoming.push_back(track);
        Ok(())
    }

    async fn play(&self) -> Result<(), SessionError> {
        let mut queue = self.queue.lock().await;
        if queue.current.is_none() {
            queue.current = queue.upcoming.pop_front();
        }
        match &queue.current {
            Some(track) => {
                info!(title = %track.title(), uri = %track.uri(), "Playback started");
                queue.state = PlaybackState::Playing;
                Ok(())
            }
            None => Err(SessionError::Play("queue is empty".to_string())),
        }
    }

    async fn state(&self) -> PlaybackState {
        self.queue.lock().await.state
    }
}

/// Registry of in-memory sessions, one per guild
#[derive(Debug, Default)]
pub struct LocalPlayer {
    sessions: RwLock<HashMap<String, Arc<LocalSession>>>,
}

impl LocalPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session(&self, guild_id: &str) -> Option<Arc<LocalSession>> {
        self.sessions.read().await.get(guild_id).cloned()
    }
}

#[async_trait]
impl PlaybackProvider for LocalPlayer {
    async fn create_or_get_connection(
        &self,
        target: &VoiceTarget,
    ) -> Result<Arc<dyn Session>, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = match sessions.get(&target.guild_id) {
            Some(existing) => {
                // follow the requester to another channel of the same guild
                *existing.target.write().await = target.clone();
                existing.clone()
            }
            None => {
                info!(guild_id = %target.guild_id, "Opening session");
                let created = Arc::new(LocalSession::new(target.clone()));
                sessions.insert(target.guild_id.clone(), created.clone());
                created
            }
        };
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Requester, TrackInfo};

    fn track(uri: &str) -> Track {
        TrackInfo {
            uri: uri.to_string(),
            title: uri.to_string(),
            author: "artist".into(),
            encoded: None,
            length_ms: 0,
            is_stream: false,
            source_name: None,
        }
        .requested_by(Requester::new("1", "alice"))
    }

    fn target(guild: &str) -> VoiceTarget {
        VoiceTarget {
            guild_id: guild.into(),
            voice_channel_id: "voice".into(),
            text_channel_id: "text".into(),
        }
    }

    #[tokio::test]
    async fn test_play_takes_first_queued_track() {
        let session = LocalSession::new(target("g"));
        assert!(session.play().await.is_err());
        assert_eq!(session.state().await, PlaybackState::Idle);

        session.append(track("a")).await.unwrap();
        session.append(track("b")).await.unwrap();
        session.play().await.unwrap();

        assert!(session.is_playing().await);
        assert_eq!(session.now_playing().await.unwrap().uri(), "a");
        assert_eq!(session.upcoming().await.len(), 1);
    }

    #[tokio::test]
    async fn test_pause_resume_skip() {
        let session = LocalSession::new(target("g"));
        session.append(track("a")).await.unwrap();
        session.play().await.unwrap();

        session.pause().await;
        assert!(session.is_paused().await);
        session.resume().await;
        assert!(session.is_playing().await);

        assert!(session.skip().await.is_none());
        assert_eq!(session.state().await, PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_connection_is_reused_per_guild() {
        let player = LocalPlayer::new();
        let first = player.create_or_get_connection(&target("g1")).await.unwrap();
        first.append(track("a")).await.unwrap();

        let mut moved = target("g1");
        moved.voice_channel_id = "other".into();
        player.create_or_get_connection(&moved).await.unwrap();
        player.create_or_get_connection(&target("g2")).await.unwrap();

        let session = player.session("g1").await.unwrap();
        assert_eq!(session.upcoming().await.len(), 1);
        assert_eq!(session.target().await.voice_channel_id, "other");
        assert!(player.session("g2").await.is_some());
    }
}
