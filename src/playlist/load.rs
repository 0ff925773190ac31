use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::playback::Track;

#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("failed to read playlist {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse playlist {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// `index` is 1-based, matching the order of `[[track]]` tables in the file.
    #[error("playlist {} entry {index} has no audio_url", path.display())]
    MissingUrl { path: PathBuf, index: usize },
}

/// On-disk playlist: a list of `[[track]]` tables.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlaylistFile {
    #[serde(rename = "track")]
    tracks: Vec<Track>,
}

/// Load every `[[track]]` from the TOML file at `path`.
///
/// Relative file paths in `audio_url` are resolved against the playlist's
/// directory. Fails on the first entry without a usable `audio_url`.
pub fn load_playlist(path: &Path) -> Result<Vec<Track>, PlaylistError> {
    let text = std::fs::read_to_string(path).map_err(|source| PlaylistError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: PlaylistFile = toml::from_str(&text).map_err(|source| PlaylistError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let base = path.parent().unwrap_or(Path::new(""));
    let mut tracks = Vec::with_capacity(file.tracks.len());
    for (i, mut track) in file.tracks.into_iter().enumerate() {
        if !track.has_audio_url() {
            return Err(PlaylistError::MissingUrl {
                path: path.to_path_buf(),
                index: i + 1,
            });
        }
        track.audio_url = resolve_location(base, track.audio_url.trim());
        tracks.push(track);
    }

    log::info!("playlist: {} track(s) from {}", tracks.len(), path.display());
    Ok(tracks)
}

/// Turn command-line arguments into tracks.
///
/// `*.toml` arguments are playlists; anything else is a single URL or path.
pub fn tracks_from_args<I, S>(args: I) -> Result<Vec<Track>, PlaylistError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tracks = Vec::new();
    for arg in args {
        let arg = arg.as_ref().trim();
        if arg.is_empty() {
            continue;
        }
        if is_playlist_file(arg) {
            tracks.extend(load_playlist(Path::new(arg))?);
        } else {
            tracks.push(Track::new(arg));
        }
    }
    Ok(tracks)
}

fn is_playlist_file(arg: &str) -> bool {
    !arg.contains("://")
        && Path::new(arg)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

fn resolve_location(base: &Path, location: &str) -> String {
    if location.contains("://") {
        return location.to_string();
    }
    let path = Path::new(location);
    if path.is_absolute() || base.as_os_str().is_empty() {
        location.to_string()
    } else {
        base.join(path).to_string_lossy().into_owned()
    }
}
