//! The list of tracks the user can choose from.
//!
//! Tracks come from TOML playlist files or straight from command-line
//! arguments. The display helpers turn a `Track` and a `PlaybackState` into
//! the labels the views render.

mod display;
mod load;

pub use display::*;
pub use load::{PlaylistError, load_playlist, tracks_from_args};

#[cfg(test)]
mod tests;
