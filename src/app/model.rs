//! Application model: `App` and the `Intent` it derives from key presses.
//!
//! `App` never drives playback itself. It mirrors the controller's published
//! `PlaybackState` and turns user input into intents for the runtime to act on.

use crate::playback::{Phase, PlaybackEvent, PlaybackError, PlaybackState, Track};
use crate::playlist;

/// What a play/pause toggle should do given the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Pause,
    Resume,
    Play(Track),
    Nothing,
}

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,
    /// Latest state received from the controller.
    pub playback: PlaybackState,
    /// Last reported failure, shown until the next successful start.
    pub last_error: Option<String>,
    pub details_window: bool,
}

impl App {
    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            selected: 0,
            playback: PlaybackState::default(),
            last_error: None,
            details_window: false,
        }
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    /// Index of the loaded track in the list, if it is one of ours.
    pub fn now_playing_index(&self) -> Option<usize> {
        self.tracks.iter().position(|t| self.playback.is_current(t))
    }

    pub fn toggle_details_window(&mut self) {
        self.details_window = !self.details_window;
    }

    /// Move selection to the next track, wrapping to the first.
    pub fn next(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + 1) % self.tracks.len();
        }
    }

    /// Move selection to the previous track, wrapping to the last.
    pub fn prev(&mut self) {
        if self.has_tracks() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.tracks.len() - 1);
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.tracks.len().saturating_sub(1);
    }

    /// Fold a controller notification into the model.
    pub fn apply_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Changed(state) => self.sync_playback(state),
            PlaybackEvent::Failed(error) => self.record_failure(&error),
        }
    }

    pub fn sync_playback(&mut self, state: PlaybackState) {
        let started = matches!(self.playback.phase, Phase::Loading { .. })
            && matches!(state.phase, Phase::Playing | Phase::Paused);
        if started {
            self.last_error = None;
        }
        self.playback = state;
    }

    pub fn record_failure(&mut self, error: &PlaybackError) {
        if *error != PlaybackError::Superseded {
            self.last_error = Some(error.to_string());
        }
    }

    /// Intent for `Enter`: start the selection unless it is already what's playing.
    pub fn play_selected_intent(&self) -> Intent {
        match self.selected_track() {
            Some(track) if self.playback.is_current(track) && self.playback.is_playing() => {
                Intent::Nothing
            }
            Some(track) if self.playback.is_current(track) => Intent::Resume,
            Some(track) => Intent::Play(track.clone()),
            None => Intent::Nothing,
        }
    }

    /// Intent for a play/pause toggle.
    pub fn toggle_intent(&self) -> Intent {
        if self.playback.is_playing() {
            Intent::Pause
        } else if self.playback.current_track.is_some() {
            Intent::Resume
        } else {
            match self.selected_track() {
                Some(track) => Intent::Play(track.clone()),
                None => Intent::Nothing,
            }
        }
    }

    /// Seek target for digit `n` (`0..=9`): that tenth of the loaded track.
    pub fn digit_seek_target(&self, n: u32) -> Option<f64> {
        self.playback.current_track.as_ref()?;
        playlist::fraction_position(f64::from(n.min(9)) / 10.0, self.playback.duration)
    }

    pub fn status_word(&self) -> &'static str {
        playlist::phase_label(self.playback.phase)
    }
}
