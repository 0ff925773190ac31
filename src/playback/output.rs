//! The audio output seam.
//!
//! An `AudioOutput` is the one hardware-backed resource owned by the controller.
//! Every method returns immediately; anything that completes later (a start, a
//! resume, metadata, position, end of track, errors) comes back as an
//! `OutputEvent` tagged with the generation it belongs to.

use std::sync::mpsc::Sender;
use std::time::Duration;

use super::controller::Msg;
use super::types::{Generation, PlaybackError};

/// Notification from the output back into the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    Started {
        generation: Generation,
    },
    StartFailed {
        generation: Generation,
        error: PlaybackError,
    },
    Resumed {
        generation: Generation,
    },
    ResumeFailed {
        generation: Generation,
        error: PlaybackError,
    },
    MetadataReady {
        generation: Generation,
        duration: Duration,
    },
    PositionAdvanced {
        generation: Generation,
        position: Duration,
    },
    Ended {
        generation: Generation,
    },
    ErrorOccurred {
        generation: Generation,
        error: PlaybackError,
    },
}

impl OutputEvent {
    pub fn generation(&self) -> Generation {
        match self {
            OutputEvent::Started { generation }
            | OutputEvent::StartFailed { generation, .. }
            | OutputEvent::Resumed { generation }
            | OutputEvent::ResumeFailed { generation, .. }
            | OutputEvent::MetadataReady { generation, .. }
            | OutputEvent::PositionAdvanced { generation, .. }
            | OutputEvent::Ended { generation }
            | OutputEvent::ErrorOccurred { generation, .. } => *generation,
        }
    }
}

/// Sending half handed to an output when it is created.
///
/// Cloneable so loader threads can report back on their own timeline.
#[derive(Clone)]
pub struct OutputEvents {
    tx: Sender<Msg>,
}

impl OutputEvents {
    pub(super) fn new(tx: Sender<Msg>) -> Self {
        Self { tx }
    }

    /// Deliver `event` to the controller. Returns false once the controller is gone.
    pub fn emit(&self, event: OutputEvent) -> bool {
        self.tx.send(Msg::Output(event)).is_ok()
    }
}

pub trait AudioOutput {
    /// Drop whatever is loaded, prepare `url` at `volume`, and request a start.
    ///
    /// Must settle with `Started` or `StartFailed` for `generation`, unless a later
    /// `load`/`unload` supersedes it first.
    fn load(&mut self, generation: Generation, url: &str, volume: f32, autoplay: bool);

    fn pause(&mut self);

    /// Must settle with `Resumed` or `ResumeFailed` for `generation`.
    fn resume(&mut self, generation: Generation);

    fn seek(&mut self, position: Duration);

    fn set_volume(&mut self, volume: f32);

    /// Stop output and detach the loaded source.
    fn unload(&mut self);

    /// Called periodically by the controller; reports position and end of track.
    fn poll(&mut self);

    /// Release the device. Called once, when the controller shuts down.
    fn release(&mut self) {
        self.unload();
    }
}
