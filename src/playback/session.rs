//! Playback state machine.
//!
//! `Session` holds the published `PlaybackState` plus the bookkeeping needed to
//! order asynchronous results: the current `Generation` and whether a resume is
//! in flight. It performs no I/O. The controller feeds it commands and output
//! events and turns the returned `Step`s into output calls and notifications.
//!
//! Lifecycle per track:
//!
//! ```text
//! Idle --play--> Loading --Started--> Playing <--> Paused
//!                   |                    |           |
//!                   +--StartFailed-------+--Ended----+--> Idle
//! ```
//!
//! `stop` and errors force `Idle` from any phase.

use std::time::Duration;

use super::output::OutputEvent;
use super::types::{Generation, Phase, PlaybackError, PlaybackState, Track};

/// Result of feeding one output event into the session.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Step {
    /// Published state changed and must be re-broadcast.
    pub changed: bool,
    /// Failure to report to observers.
    pub failure: Option<PlaybackError>,
    /// Settlement for the pending `play_track` caller.
    pub start: Option<Result<(), PlaybackError>>,
    /// Settlement for the pending `resume_track` caller.
    pub resume: Option<Result<(), PlaybackError>>,
}

#[derive(Debug)]
pub(crate) struct Session {
    state: PlaybackState,
    generation: Generation,
    resume_pending: bool,
}

impl Session {
    pub fn new(volume: f32) -> Self {
        Self {
            state: PlaybackState::idle(clamp_volume(volume).unwrap_or(1.0)),
            generation: Generation::default(),
            resume_pending: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn resume_pending(&self) -> bool {
        self.resume_pending
    }

    /// Make `track` current and enter `Loading` speculatively playing.
    ///
    /// Everything issued under earlier generations becomes stale.
    pub fn begin_play(&mut self, track: Track) -> Result<Generation, PlaybackError> {
        if !track.has_audio_url() {
            return Err(PlaybackError::InvalidInput);
        }

        self.generation = self.generation.next();
        self.resume_pending = false;
        self.state = PlaybackState {
            current_track: Some(track),
            phase: Phase::Loading { autoplay: true },
            duration: None,
            position: Duration::ZERO,
            volume: self.state.volume,
        };
        log::trace!("session: loading under generation {}", self.generation.value());
        Ok(self.generation)
    }

    /// Returns true when the output must be paused.
    pub fn pause(&mut self) -> bool {
        match self.state.phase {
            Phase::Playing => {
                self.state.phase = Phase::Paused;
                true
            }
            Phase::Loading { autoplay: true } => {
                self.state.phase = Phase::Loading { autoplay: false };
                true
            }
            _ => false,
        }
    }

    /// Returns the generation to resume under, or `None` when resuming is a no-op.
    pub fn begin_resume(&mut self) -> Option<Generation> {
        if self.state.current_track.is_none() || self.state.is_playing() || self.resume_pending {
            return None;
        }
        self.resume_pending = true;
        Some(self.generation)
    }

    /// Reset to idle and invalidate everything in flight. Returns true when the
    /// published state changed.
    pub fn stop(&mut self) -> bool {
        self.generation = self.generation.next();
        self.resume_pending = false;
        self.reset_idle()
    }

    /// Clamp `seconds` into `[0, duration]` (or `[0, inf)` while the duration is
    /// unknown) and make it the current position. No-op without a track.
    pub fn seek(&mut self, seconds: f64) -> Option<Duration> {
        self.state.current_track.as_ref()?;
        let target = clamp_position(seconds, self.state.duration);
        self.state.position = target;
        Some(target)
    }

    /// Seek relative to the current position.
    pub fn seek_by(&mut self, delta_seconds: f64) -> Option<Duration> {
        let from = self.state.position.as_secs_f64();
        self.seek(from + delta_seconds)
    }

    /// Clamp `level` into `[0, 1]` and keep it for this and later tracks.
    pub fn set_volume(&mut self, level: f32) -> Option<f32> {
        let volume = clamp_volume(level)?;
        self.state.volume = volume;
        Some(volume)
    }

    pub fn apply(&mut self, event: OutputEvent) -> Step {
        if event.generation() != self.generation {
            log::debug!(
                "session: dropping stale {:?} (current generation {})",
                event,
                self.generation.value()
            );
            return Step::default();
        }

        let mut step = Step::default();
        match event {
            OutputEvent::Started { .. } => {
                if let Phase::Loading { autoplay } = self.state.phase {
                    self.state.phase = if autoplay {
                        Phase::Playing
                    } else {
                        Phase::Paused
                    };
                    step.changed = true;
                    step.start = Some(Ok(()));
                }
            }
            OutputEvent::StartFailed { error, .. } => {
                if matches!(self.state.phase, Phase::Loading { .. }) {
                    step.changed = self.reset_idle();
                    if std::mem::take(&mut self.resume_pending) {
                        step.resume = Some(Err(error.clone()));
                    }
                    step.start = Some(Err(error.clone()));
                    step.failure = Some(error);
                }
            }
            OutputEvent::Resumed { .. } => {
                if std::mem::take(&mut self.resume_pending) {
                    match self.state.phase {
                        Phase::Paused => self.state.phase = Phase::Playing,
                        Phase::Loading { autoplay: false } => {
                            self.state.phase = Phase::Loading { autoplay: true }
                        }
                        _ => {}
                    }
                    step.changed = true;
                    step.resume = Some(Ok(()));
                }
            }
            OutputEvent::ResumeFailed { error, .. } => {
                if std::mem::take(&mut self.resume_pending) {
                    step.resume = Some(Err(error.clone()));
                    step.failure = Some(error);
                }
            }
            OutputEvent::MetadataReady { duration, .. } => {
                if self.state.current_track.is_some() {
                    self.state.duration = Some(duration);
                    self.state.position = self.state.position.min(duration);
                    step.changed = true;
                }
            }
            OutputEvent::PositionAdvanced { position, .. } => {
                if matches!(self.state.phase, Phase::Playing | Phase::Paused) {
                    let position = match self.state.duration {
                        Some(duration) => position.min(duration),
                        None => position,
                    };
                    if position != self.state.position {
                        self.state.position = position;
                        step.changed = true;
                    }
                }
            }
            OutputEvent::Ended { .. } => {
                if self.state.current_track.is_some() {
                    // Bump so late position reports for the finished source are dropped.
                    self.generation = self.generation.next();
                    if std::mem::take(&mut self.resume_pending) {
                        step.resume = Some(Err(PlaybackError::Superseded));
                    }
                    step.changed = self.reset_idle();
                }
            }
            OutputEvent::ErrorOccurred { error, .. } => {
                if self.state.current_track.is_some() {
                    if matches!(self.state.phase, Phase::Loading { .. }) {
                        step.start = Some(Err(error.clone()));
                    }
                    if std::mem::take(&mut self.resume_pending) {
                        step.resume = Some(Err(error.clone()));
                    }
                    self.generation = self.generation.next();
                    step.changed = self.reset_idle();
                    step.failure = Some(error);
                }
            }
        }

        if step.changed {
            log::trace!("session: {:?}", self.state.phase);
        }
        step
    }

    fn reset_idle(&mut self) -> bool {
        let idle = PlaybackState::idle(self.state.volume);
        if self.state == idle {
            return false;
        }
        self.state = idle;
        true
    }
}

/// Clamp a requested position. Negative and NaN inputs map to zero; values past a
/// known duration map to the duration.
pub(crate) fn clamp_position(seconds: f64, duration: Option<Duration>) -> Duration {
    let seconds = seconds.max(0.0);
    let target = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX);
    match duration {
        Some(duration) => target.min(duration),
        None => target,
    }
}

/// Clamp a requested volume into `[0, 1]`. NaN is rejected.
pub(crate) fn clamp_volume(level: f32) -> Option<f32> {
    if level.is_nan() {
        return None;
    }
    Some(level.clamp(0.0, 1.0))
}
