//! Single-track playback session.
//!
//! One `PlaybackController` per application session owns the audio output and
//! publishes `PlaybackState` to any number of observers. Starting a track
//! supersedes whatever was loaded before; results of superseded requests are
//! recognised by their `Generation` and ignored.

mod controller;
mod fetch;
mod observers;
mod output;
mod rodio_output;
mod session;
mod types;

pub use controller::{PendingStart, PlaybackController};
pub use output::{AudioOutput, OutputEvent, OutputEvents};
pub use rodio_output::RodioOutput;
pub use types::*;
