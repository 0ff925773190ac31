use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, Intent};
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::playback::{PlaybackController, PlaybackEvent};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: handles input, UI drawing, sync with the playback
/// controller and MPRIS. Returns `Ok(())` when shutdown is requested.
#[allow(clippy::too_many_arguments)]
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    controller: &PlaybackController,
    updates: &mpsc::Receiver<PlaybackEvent>,
    mpris: &MprisHandle,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let mut changed = false;
        while let Ok(event) = updates.try_recv() {
            app.apply_event(event);
            changed = true;
        }
        if changed {
            update_mpris(mpris, app, &settings.ui);
        }

        terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, app, controller) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, controller, control_tx, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Hand an intent to the controller. Start results come back as events.
fn apply_intent(intent: Intent, app: &mut App, controller: &PlaybackController) {
    match intent {
        Intent::Pause => controller.pause_track(),
        Intent::Resume => {
            let _ = controller.resume_track();
        }
        Intent::Play(track) => {
            if let Err(e) = controller.play_track(track) {
                log::warn!("runtime: cannot play: {e}");
                app.record_failure(&e);
            }
        }
        Intent::Nothing => {}
    }
}

/// Returns true when the app should quit.
fn handle_control_cmd(cmd: ControlCmd, app: &mut App, controller: &PlaybackController) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => {
            if !app.playback.is_playing() {
                apply_intent(app.toggle_intent(), app, controller);
            }
        }
        ControlCmd::Pause => {
            if app.playback.is_playing() {
                controller.pause_track();
            }
        }
        ControlCmd::PlayPause => apply_intent(app.toggle_intent(), app, controller),
        ControlCmd::Stop => controller.stop_track(),
        ControlCmd::Seek(offset_us) => controller.seek_by(offset_us as f64 / 1_000_000.0),
        ControlCmd::SetPosition(position_us) => {
            controller.seek_to(position_us as f64 / 1_000_000.0)
        }
        ControlCmd::SetVolume(volume) => controller.change_volume(volume as f32),
    }
    false
}

/// Returns true when the app should quit.
fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    controller: &PlaybackController,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> bool {
    let was_pending_gg = std::mem::take(&mut state.pending_gg);

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('g') => {
            if was_pending_gg {
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => apply_intent(app.play_selected_intent(), app, controller),
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('x') => {
            let _ = control_tx.send(ControlCmd::Stop);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            controller.seek_by(settings.controls.seek_seconds as f64);
        }
        KeyCode::Char('h') | KeyCode::Left => {
            controller.seek_by(-(settings.controls.seek_seconds as f64));
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            controller.change_volume(app.playback.volume + settings.controls.volume_step);
        }
        KeyCode::Char('-') => {
            controller.change_volume(app.playback.volume - settings.controls.volume_step);
        }
        KeyCode::Char(c @ '0'..='9') => {
            if let Some(target) = c.to_digit(10).and_then(|n| app.digit_seek_target(n)) {
                controller.seek_to(target);
            }
        }
        KeyCode::Char('K') => app.toggle_details_window(),
        _ => {}
    }

    false
}
