use std::fs;
use std::time::Duration;

use tempfile::tempdir;

use super::*;
use crate::config::TimeField;
use crate::playback::{Phase, PlaybackState, Track};

#[test]
fn load_playlist_reads_track_tables() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("morning.toml");
    fs::write(
        &path,
        r#"
[[track]]
audio_url = "https://cdn.example.org/mishary/001.mp3"
title = "Al-Fatiha"
reciter_name = "Mishary Alafasy"
chapter = 1
key = "1"

[[track]]
audio_url = "audio/002.mp3"
chapter = 2
"#,
    )
    .unwrap();

    let tracks = load_playlist(&path).unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title.as_deref(), Some("Al-Fatiha"));
    assert_eq!(tracks[0].reciter_name.as_deref(), Some("Mishary Alafasy"));
    assert_eq!(tracks[0].key.as_deref(), Some("1"));
    assert_eq!(tracks[0].audio_url, "https://cdn.example.org/mishary/001.mp3");

    // Relative paths are anchored at the playlist's directory.
    assert_eq!(
        tracks[1].audio_url,
        dir.path().join("audio/002.mp3").to_string_lossy()
    );
    assert_eq!(tracks[1].chapter, Some(2));
}

#[test]
fn load_playlist_rejects_entries_without_url() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(
        &path,
        r#"
[[track]]
audio_url = "a.mp3"

[[track]]
title = "No audio"

[[track]]
audio_url = "  "
"#,
    )
    .unwrap();

    match load_playlist(&path) {
        Err(PlaylistError::MissingUrl { index, .. }) => assert_eq!(index, 2),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn load_playlist_reports_read_and_parse_errors() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_playlist(&dir.path().join("missing.toml")),
        Err(PlaylistError::Read { .. })
    ));

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "[[track]\naudio_url = ").unwrap();
    assert!(matches!(
        load_playlist(&bad),
        Err(PlaylistError::Parse { .. })
    ));
}

#[test]
fn empty_playlist_file_is_an_empty_list() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").unwrap();
    assert!(load_playlist(&path).unwrap().is_empty());
}

#[test]
fn tracks_from_args_mixes_playlists_and_bare_locations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("list.TOML");
    fs::write(&path, "[[track]]\naudio_url = \"https://x.org/1.mp3\"\n").unwrap();

    let args = vec![
        "https://x.org/36.mp3".to_string(),
        path.to_string_lossy().into_owned(),
        "".to_string(),
        "/srv/quran/112.mp3".to_string(),
    ];
    let tracks = tracks_from_args(&args).unwrap();
    let urls: Vec<&str> = tracks.iter().map(|t| t.audio_url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://x.org/36.mp3",
            "https://x.org/1.mp3",
            "/srv/quran/112.mp3"
        ]
    );
}

#[test]
fn remote_toml_url_is_not_treated_as_playlist() {
    let tracks = tracks_from_args(["https://x.org/list.toml"]).unwrap();
    assert_eq!(tracks, vec![Track::new("https://x.org/list.toml")]);
}

#[test]
fn title_label_falls_back_to_chapter_then_location() {
    assert_eq!(
        title_label(&Track::new("a.mp3").with_title("Ya-Sin").with_chapter(36)),
        "Ya-Sin"
    );
    assert_eq!(
        title_label(&Track::new("a.mp3").with_title("  ").with_chapter(36)),
        "Surah 36"
    );
    assert_eq!(
        title_label(&Track::new("https://x.org/audio/036.mp3?token=abc")),
        "036.mp3"
    );
    assert_eq!(title_label(&Track::new("036.mp3")), "036.mp3");
}

#[test]
fn reciter_and_list_labels() {
    let track = Track::new("a.mp3").with_title("Al-Mulk");
    assert_eq!(reciter_label(&track, "Quran Recitation"), "Quran Recitation");
    assert_eq!(list_label(&track), "Al-Mulk");

    let track = track.with_reciter(" Al-Husary ");
    assert_eq!(reciter_label(&track, "Quran Recitation"), "Al-Husary");
    assert_eq!(list_label(&track), "Al-Mulk - Al-Husary");
}

#[test]
fn format_clock_renders_minutes_and_padded_seconds() {
    assert_eq!(format_clock(None), "0:00");
    assert_eq!(format_clock(Some(Duration::ZERO)), "0:00");
    assert_eq!(format_clock(Some(Duration::from_millis(59_900))), "0:59");
    assert_eq!(format_clock(Some(Duration::from_secs(65))), "1:05");
    assert_eq!(format_clock(Some(Duration::from_secs(3725))), "62:05");
}

#[test]
fn progress_and_fraction_helpers() {
    let d = Some(Duration::from_secs(200));
    assert_eq!(progress_percent(Duration::from_secs(50), d), 25.0);
    assert_eq!(progress_percent(Duration::from_secs(50), None), 0.0);
    assert_eq!(progress_percent(Duration::from_secs(1), Some(Duration::ZERO)), 0.0);

    assert_eq!(fraction_position(0.25, d), Some(50.0));
    assert_eq!(fraction_position(1.5, d), Some(200.0));
    assert_eq!(fraction_position(0.3, None), None);

    assert_eq!(volume_percent(0.456), 46);
    assert_eq!(volume_percent(2.0), 100);
}

#[test]
fn time_text_skips_unknown_totals() {
    let mut state = PlaybackState::idle(1.0);
    state.current_track = Some(Track::new("a.mp3"));
    state.phase = Phase::Playing;
    state.position = Duration::from_secs(70);

    let fields = [TimeField::Elapsed, TimeField::Total, TimeField::Remaining];
    assert_eq!(time_text(&state, &fields, " / ").as_deref(), Some("1:10"));

    state.duration = Some(Duration::from_secs(100));
    assert_eq!(
        time_text(&state, &fields, " / ").as_deref(),
        Some("1:10 / 1:40 / -0:30")
    );
    assert_eq!(time_text(&state, &[], " / "), None);
}

#[test]
fn phase_labels() {
    assert_eq!(phase_label(Phase::Idle), "Idle");
    assert_eq!(phase_label(Phase::Loading { autoplay: false }), "Loading");
    assert_eq!(phase_label(Phase::Playing), "Playing");
    assert_eq!(phase_label(Phase::Paused), "Paused");
}
