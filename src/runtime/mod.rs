use std::env;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::playback::{PlaybackController, RodioOutput};
use crate::playlist;

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;

const USAGE: &str = "usage: tilawa <playlist.toml | audio url | audio file>...";

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let loaded = settings::load_settings();
    let log_path = logging::init(&loaded.settings.log);
    if let Some(path) = log_path.as_ref() {
        log::info!("tilawa {} logging to {}", env!("CARGO_PKG_VERSION"), path.display());
    }
    settings::report(&loaded, log_path.is_some());
    let settings = loaded.settings;

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        return Err(USAGE.into());
    }
    let tracks = playlist::tracks_from_args(&args)?;
    if tracks.is_empty() {
        return Err(USAGE.into());
    }

    let fetch_settings = settings.fetch.clone();
    let controller = PlaybackController::spawn(&settings.audio, move |events| {
        RodioOutput::open(events, &fetch_settings)
    })?;
    let updates = controller.subscribe();
    let mut app = App::new(tracks);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = if settings.mpris.enabled {
        crate::mpris::spawn_mpris(control_tx.clone())
    } else {
        MprisHandle::disabled()
    };
    mpris_sync::update_mpris(&mpris, &app, &settings.ui);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &controller,
        &updates,
        &mpris,
        &control_tx,
        &control_rx,
        &mut state,
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    controller.shutdown();
    log::info!("tilawa exiting");
    run_result
}
