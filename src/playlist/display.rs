use std::time::Duration;

use crate::config::TimeField;
use crate::playback::{Phase, PlaybackState, Track};

/// Title shown for `track`.
///
/// Falls back to `Surah {chapter}`, then to the last segment of the audio location.
pub fn title_label(track: &Track) -> String {
    if let Some(title) = track.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    if let Some(chapter) = track.chapter {
        return format!("Surah {chapter}");
    }
    location_stem(&track.audio_url).to_string()
}

/// Reciter shown for `track`, or `fallback` when it has none.
pub fn reciter_label<'a>(track: &'a Track, fallback: &'a str) -> &'a str {
    track
        .reciter_name
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(fallback)
}

/// One line in the track list: `Title - Reciter`, or just the title.
pub fn list_label(track: &Track) -> String {
    let title = title_label(track);
    match track
        .reciter_name
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
    {
        Some(reciter) => format!("{title} - {reciter}"),
        None => title,
    }
}

fn location_stem(url: &str) -> &str {
    let url = url.trim();
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url)
}

/// `m:ss`, with unknown or zero rendering as `0:00`.
pub fn format_clock(d: Option<Duration>) -> String {
    let secs = d.map(|d| d.as_secs()).unwrap_or(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Elapsed share of the track in percent, `0.0` while the duration is unknown.
pub fn progress_percent(position: Duration, duration: Option<Duration>) -> f64 {
    match duration {
        Some(d) if !d.is_zero() => {
            (position.as_secs_f64() / d.as_secs_f64() * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

/// Seconds at `fraction` (`0.0..=1.0`) of the track, if the duration is known.
pub fn fraction_position(fraction: f64, duration: Option<Duration>) -> Option<f64> {
    let duration = duration?;
    Some(fraction.clamp(0.0, 1.0) * duration.as_secs_f64())
}

pub fn volume_percent(volume: f32) -> u8 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u8
}

pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Idle",
        Phase::Loading { .. } => "Loading",
        Phase::Playing => "Playing",
        Phase::Paused => "Paused",
    }
}

/// Elapsed/total/remaining text for the now-playing panel.
///
/// Total and remaining are skipped while the duration is unknown.
pub fn time_text(state: &PlaybackState, fields: &[TimeField], sep: &str) -> Option<String> {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_clock(Some(state.position))),
            TimeField::Total => state.duration.map(|d| format_clock(Some(d))),
            TimeField::Remaining => state
                .duration
                .map(|d| format!("-{}", format_clock(Some(d.saturating_sub(state.position))))),
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(sep))
    }
}
