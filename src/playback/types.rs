//! Value types shared by the playback session.
//!
//! `Track` describes one playable item, `PlaybackState` is the single piece of
//! state published to observers, and `PlaybackError` is everything the session
//! can report back to its callers.

use std::time::Duration;

use serde::Deserialize;

/// One playable item.
///
/// Only `audio_url` matters to the controller. The remaining fields are labels
/// and identifiers for the views; the controller never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Track {
    /// Directly fetchable location of the audio resource.
    #[serde(default)]
    pub audio_url: String,
    pub title: Option<String>,
    pub reciter_name: Option<String>,
    /// Chapter number, used for the derived title when `title` is missing.
    pub chapter: Option<u32>,
    /// Opaque identifier such as `"2:255"`.
    pub key: Option<String>,
}

impl Track {
    pub fn new(audio_url: impl Into<String>) -> Self {
        Self {
            audio_url: audio_url.into(),
            title: None,
            reciter_name: None,
            chapter: None,
            key: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_reciter(mut self, reciter: impl Into<String>) -> Self {
        self.reciter_name = Some(reciter.into());
        self
    }

    pub fn with_chapter(mut self, chapter: u32) -> Self {
        self.chapter = Some(chapter);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Whether this track can be handed to the controller at all.
    pub fn has_audio_url(&self) -> bool {
        !self.audio_url.trim().is_empty()
    }

    /// Whether `self` and `other` name the same item.
    ///
    /// Keys win when both sides carry one; otherwise the audio location is compared.
    pub fn same_item(&self, other: &Track) -> bool {
        match (self.key.as_deref(), other.key.as_deref()) {
            (Some(a), Some(b)) => a == b,
            _ => self.audio_url == other.audio_url,
        }
    }
}

/// Per-track lifecycle phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing loaded.
    #[default]
    Idle,
    /// A start was requested and has not settled yet.
    ///
    /// `autoplay` is false when the user paused before the start settled.
    Loading { autoplay: bool },
    Playing,
    Paused,
}

/// Published playback state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub phase: Phase,
    /// Known once the output reports metadata.
    pub duration: Option<Duration>,
    pub position: Duration,
    /// Always within `0.0..=1.0`.
    pub volume: f32,
}

impl PlaybackState {
    pub fn idle(volume: f32) -> Self {
        Self {
            current_track: None,
            phase: Phase::Idle,
            duration: None,
            position: Duration::ZERO,
            volume,
        }
    }

    /// True between a successful (or speculative) start/resume and the next
    /// pause, stop, end or error.
    pub fn is_playing(&self) -> bool {
        matches!(
            self.phase,
            Phase::Playing | Phase::Loading { autoplay: true }
        )
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Whether `track` is the one currently loaded.
    pub fn is_current(&self, track: &Track) -> bool {
        self.current_track
            .as_ref()
            .is_some_and(|current| current.same_item(track))
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::idle(1.0)
    }
}

/// Sequence number attached to every load of the output.
///
/// A new `play_track` or `stop_track` advances it; anything reported for an older
/// value is stale and must not touch the published state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The track has an empty audio location. Rejected before touching the output.
    #[error("track has no audio url")]
    InvalidInput,
    #[error("failed to start playback: {0}")]
    StartFailure(String),
    #[error("failed to resume playback: {0}")]
    ResumeFailure(String),
    /// The output failed while a track was loaded.
    #[error("playback error: {0}")]
    Runtime(String),
    /// A newer request took over before this one settled.
    #[error("superseded by a newer request")]
    Superseded,
    #[error("audio output unavailable: {0}")]
    OutputUnavailable(String),
    #[error("playback controller has shut down")]
    Disconnected,
}

/// Notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Changed(PlaybackState),
    Failed(PlaybackError),
}
