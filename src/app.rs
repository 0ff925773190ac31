//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the track list, the
//! selection and the last playback state received from the controller.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
