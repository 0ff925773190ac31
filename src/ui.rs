//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::App;
use crate::config::{ControlsSettings, UiSettings};
use crate::playlist;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play selected");
    map.insert("space/p", "pause/resume");
    map.insert("x", "stop");
    map.insert("0-9", "jump to 0%-90%");
    map.insert("K", "details");
    map.insert("q", "quit");
    // h/l and -/+ are filled from config.
    map
});

/// Render the controls help text, incorporating seek and volume steps.
fn controls_text(controls: &ControlsSettings) -> String {
    let order = [
        "j/k", "enter", "space/p", "x", "h/l", "-/+", "0-9", "gg/G", "K", "q",
    ];
    order
        .iter()
        .filter_map(|k| match *k {
            "h/l" => Some(format!("[h/l] seek -/+{}s", controls.seek_seconds)),
            "-/+" => Some(format!(
                "[-/+] volume -/+{}%",
                playlist::volume_percent(controls.volume_step)
            )),
            _ => CONTROLS_MAP.get(k).map(|v| format!("[{k}] {v}")),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn left_padded() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

/// Lines of the now-playing panel above the progress gauge.
fn now_playing_lines(app: &App, ui: &UiSettings) -> Vec<Line<'static>> {
    let state = &app.playback;
    let mut lines = Vec::new();

    match state.current_track.as_ref() {
        Some(track) => {
            lines.push(Line::from(playlist::title_label(track)).bold());
            lines.push(Line::from(
                playlist::reciter_label(track, &ui.reciter_fallback).to_string(),
            ));
        }
        None => {
            lines.push(Line::from("Nothing playing").italic());
            lines.push(Line::from(""));
        }
    }

    let mut status = vec![app.status_word().to_string()];
    if let Some(time) = playlist::time_text(
        state,
        &ui.now_playing_time_fields,
        &ui.now_playing_time_separator,
    ) {
        if state.current_track.is_some() {
            status.push(time);
        }
    }
    status.push(format!("Vol {}%", playlist::volume_percent(state.volume)));
    lines.push(Line::from(status.join(" • ")));

    if let Some(err) = app.last_error.as_deref() {
        lines.push(Line::from(format!("Error: {err}")).fg(Color::Red));
    }
    lines
}

fn details_text(app: &App, ui: &UiSettings) -> String {
    match app.selected_track() {
        Some(track) => format!(
            "Title: {}\nReciter: {}\nChapter: {}\nKey: {}\nAudio: {}",
            playlist::title_label(track),
            playlist::reciter_label(track, &ui.reciter_fallback),
            track
                .chapter
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            track.key.as_deref().unwrap_or("-"),
            track.audio_url
        ),
        None => "No track selected".to_string(),
    }
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" tilawa ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Now playing: text lines plus a one-line progress gauge at the bottom.
    {
        let block = Block::bordered()
            .padding(left_padded())
            .title(" now playing ");
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        let info = Paragraph::new(now_playing_lines(app, ui_settings)).wrap(Wrap { trim: true });
        frame.render_widget(info, parts[0]);

        let percent =
            playlist::progress_percent(app.playback.position, app.playback.duration);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(percent / 100.0)
            .label(format!("{percent:.0}%"));
        frame.render_widget(gauge, parts[1]);
    }

    // Track list, centered on the selection when it does not fit.
    {
        let now_playing = app.now_playing_index();
        let total = app.tracks.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = app.tracks[start..end]
            .iter()
            .enumerate()
            .map(|(offset, track)| {
                let label = playlist::list_label(track);
                if now_playing == Some(start + offset) {
                    ListItem::new(format!("♪ {label}"))
                        .style(Style::default().add_modifier(Modifier::BOLD))
                } else {
                    ListItem::new(format!("  {label}"))
                }
            })
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    if app.details_window {
        let popup_area = centered_rect_sized(72, 9, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let details = Paragraph::new(details_text(app, ui_settings))
            .block(
                Block::default()
                    .padding(left_padded())
                    .borders(Borders::ALL)
                    .title(" details (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(details, popup_area);
    }

    let footer = Paragraph::new(controls_text(controls_settings))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_padded()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{Phase, PlaybackState, Track};
    use ratatui::{Terminal, backend::TestBackend};

    fn rendered(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                draw(
                    f,
                    app,
                    &UiSettings::default(),
                    &ControlsSettings::default(),
                )
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn controls_text_uses_configured_steps() {
        let text = controls_text(&ControlsSettings {
            seek_seconds: 15,
            volume_step: 0.05,
        });
        assert!(text.contains("[h/l] seek -/+15s"));
        assert!(text.contains("[-/+] volume -/+5%"));
        assert!(text.contains("[x] stop"));
    }

    #[test]
    fn draw_shows_track_reciter_fallback_and_error() {
        let track = Track::new("https://x.org/067.mp3").with_title("Al-Mulk");
        let mut app = App::new(vec![track.clone()]);
        app.sync_playback(PlaybackState {
            current_track: Some(track),
            phase: Phase::Paused,
            ..PlaybackState::default()
        });
        app.last_error = Some("failed to resume playback: busy".to_string());

        let screen = rendered(&app);
        assert!(screen.contains("Al-Mulk"));
        assert!(screen.contains("Quran Recitation"));
        assert!(screen.contains("Paused"));
        assert!(screen.contains("Error: failed to resume playback: busy"));
    }

    #[test]
    fn draw_handles_empty_list() {
        let screen = rendered(&App::new(Vec::new()));
        assert!(screen.contains("Nothing playing"));
        assert!(screen.contains("Idle"));
    }
}
