use std::time::Duration;

use super::*;
use crate::playback::{Phase, PlaybackError, PlaybackEvent, PlaybackState, Track};

fn t(chapter: u32) -> Track {
    Track::new(format!("https://cdn.example.org/{chapter:03}.mp3"))
        .with_chapter(chapter)
        .with_key(chapter.to_string())
}

fn state(track: Option<Track>, phase: Phase) -> PlaybackState {
    PlaybackState {
        current_track: track,
        phase,
        ..PlaybackState::default()
    }
}

#[test]
fn next_prev_wrap_around() {
    let mut app = App::new(vec![t(1), t(2), t(3)]);
    app.prev();
    assert_eq!(app.selected, 2);
    app.next();
    assert_eq!(app.selected, 0);
    app.next();
    assert_eq!(app.selected, 1);

    app.select_last();
    assert_eq!(app.selected, 2);
    app.select_first();
    assert_eq!(app.selected, 0);
}

#[test]
fn navigation_on_empty_list_is_harmless() {
    let mut app = App::new(Vec::new());
    app.next();
    app.prev();
    app.select_last();
    assert_eq!(app.selected, 0);
    assert!(app.selected_track().is_none());
    assert_eq!(app.toggle_intent(), Intent::Nothing);
    assert_eq!(app.play_selected_intent(), Intent::Nothing);
}

#[test]
fn toggle_intent_follows_playback_state() {
    let mut app = App::new(vec![t(1), t(2)]);
    assert_eq!(app.toggle_intent(), Intent::Play(t(1)));

    app.sync_playback(state(Some(t(2)), Phase::Playing));
    assert_eq!(app.toggle_intent(), Intent::Pause);

    app.sync_playback(state(Some(t(2)), Phase::Loading { autoplay: true }));
    assert_eq!(app.toggle_intent(), Intent::Pause);

    app.sync_playback(state(Some(t(2)), Phase::Paused));
    assert_eq!(app.toggle_intent(), Intent::Resume);
}

#[test]
fn enter_does_not_restart_the_playing_track() {
    let mut app = App::new(vec![t(1), t(2)]);
    app.sync_playback(state(Some(t(1)), Phase::Playing));
    assert_eq!(app.play_selected_intent(), Intent::Nothing);

    app.sync_playback(state(Some(t(1)), Phase::Paused));
    assert_eq!(app.play_selected_intent(), Intent::Resume);

    app.next();
    assert_eq!(app.play_selected_intent(), Intent::Play(t(2)));
}

#[test]
fn now_playing_index_matches_by_key() {
    let mut app = App::new(vec![t(1), t(2), t(3)]);
    assert_eq!(app.now_playing_index(), None);
    app.sync_playback(state(Some(t(3)), Phase::Playing));
    assert_eq!(app.now_playing_index(), Some(2));
}

#[test]
fn failure_is_shown_until_next_successful_start() {
    let mut app = App::new(vec![t(1)]);
    app.apply_event(PlaybackEvent::Changed(state(
        Some(t(1)),
        Phase::Loading { autoplay: true },
    )));
    app.apply_event(PlaybackEvent::Changed(PlaybackState::default()));
    app.apply_event(PlaybackEvent::Failed(PlaybackError::StartFailure(
        "404".to_string(),
    )));
    assert_eq!(
        app.last_error.as_deref(),
        Some("failed to start playback: 404")
    );

    // Still shown while the retry is loading.
    app.apply_event(PlaybackEvent::Changed(state(
        Some(t(1)),
        Phase::Loading { autoplay: true },
    )));
    assert!(app.last_error.is_some());

    app.apply_event(PlaybackEvent::Changed(state(Some(t(1)), Phase::Playing)));
    assert!(app.last_error.is_none());
    assert_eq!(app.status_word(), "Playing");
}

#[test]
fn superseded_requests_are_not_errors() {
    let mut app = App::new(vec![t(1)]);
    app.record_failure(&PlaybackError::Superseded);
    assert!(app.last_error.is_none());
}

#[test]
fn digit_seek_needs_a_known_duration() {
    let mut app = App::new(vec![t(1)]);
    assert_eq!(app.digit_seek_target(5), None);

    let mut playing = state(Some(t(1)), Phase::Playing);
    app.sync_playback(playing.clone());
    assert_eq!(app.digit_seek_target(5), None);

    playing.duration = Some(Duration::from_secs(300));
    app.sync_playback(playing);
    assert_eq!(app.digit_seek_target(0), Some(0.0));
    assert_eq!(app.digit_seek_target(5), Some(150.0));
    assert_eq!(app.digit_seek_target(9), Some(270.0));
}

#[test]
fn details_window_toggles() {
    let mut app = App::new(vec![t(1)]);
    assert!(!app.details_window);
    app.toggle_details_window();
    assert!(app.details_window);
}
