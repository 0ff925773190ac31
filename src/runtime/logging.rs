use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use env_logger::Target;

use crate::config::{self, LogSettings};

/// Route `log` records into the log file.
///
/// The terminal belongs to the UI, so nothing is written to stderr once the
/// TUI is up. `RUST_LOG` overrides the configured level. Returns the file in use.
pub fn init(settings: &LogSettings) -> Option<PathBuf> {
    let path = settings.file.clone().or_else(config::default_log_path)?;

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("tilawa: cannot create log directory {}: {e}", dir.display());
            return None;
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("tilawa: cannot open log file {}: {e}", path.display());
            return None;
        }
    };

    let initialised = env_logger::builder()
        .filter_level(settings.level.into())
        .parse_default_env()
        .format_timestamp_millis()
        .target(Target::Pipe(Box::new(file)))
        .try_init();
    match initialised {
        Ok(()) => Some(path),
        Err(_) => None,
    }
}
