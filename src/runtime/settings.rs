use crate::config::{self, Settings};

/// Settings the session runs with.
pub struct LoadedSettings {
    pub settings: Settings,
    /// Why the config file was ignored, if it was. Logged once logging is up,
    /// since logging itself is configured from these settings.
    pub fallback_reason: Option<String>,
}

pub fn load_settings() -> LoadedSettings {
    from_result(Settings::load())
}

fn from_result(result: Result<Settings, ::config::ConfigError>) -> LoadedSettings {
    let reason = match result {
        Ok(settings) => match settings.validate() {
            Ok(()) => {
                return LoadedSettings {
                    settings,
                    fallback_reason: None,
                };
            }
            Err(msg) => format!("invalid config: {msg}"),
        },
        Err(e) => format!("failed to load config: {e}"),
    };
    LoadedSettings {
        settings: Settings::default(),
        fallback_reason: Some(reason),
    }
}

/// Report where settings came from. Falls back to stderr when there is no log file.
pub fn report(loaded: &LoadedSettings, logging: bool) {
    let source = config::resolve_config_path()
        .filter(|p| p.exists())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());

    match (&loaded.fallback_reason, logging) {
        (Some(reason), true) => log::warn!("{reason}; using defaults"),
        (Some(reason), false) => eprintln!("tilawa: {reason}; using defaults"),
        (None, _) => log::info!("settings loaded from {source}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_settings_are_kept() {
        let mut settings = Settings::default();
        settings.controls.seek_seconds = 30;
        let loaded = from_result(Ok(settings));
        assert!(loaded.fallback_reason.is_none());
        assert_eq!(loaded.settings.controls.seek_seconds, 30);
    }

    #[test]
    fn invalid_settings_fall_back_to_defaults_with_a_reason() {
        let mut settings = Settings::default();
        settings.audio.initial_volume = 3.0;
        let loaded = from_result(Ok(settings));
        assert_eq!(loaded.settings.audio.initial_volume, 1.0);
        assert!(
            loaded
                .fallback_reason
                .is_some_and(|r| r.starts_with("invalid config"))
        );
    }

    #[test]
    fn load_errors_fall_back_to_defaults_with_a_reason() {
        let loaded = from_result(Err(::config::ConfigError::Message("bad toml".to_string())));
        assert_eq!(
            loaded.fallback_reason.as_deref(),
            Some("failed to load config: bad toml")
        );
    }
}
