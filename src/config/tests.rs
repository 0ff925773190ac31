use super::load::{default_config_path, default_log_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_tilawa_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("TILAWA_CONFIG_PATH", "/tmp/tilawa-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/tilawa-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("tilawa")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("tilawa")
            .join("config.toml")
    );
}

#[test]
fn default_log_path_uses_state_dirs() {
    let _lock = env_lock();
    {
        let _g1 = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg-state");
        assert_eq!(
            default_log_path().unwrap(),
            std::path::PathBuf::from("/tmp/xdg-state/tilawa/tilawa.log")
        );
    }

    let _g1 = EnvGuard::remove("XDG_STATE_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        default_log_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/state/tilawa/tilawa.log")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
initial_volume = 0.4
tick_ms = 100

[fetch]
connect_timeout_secs = 3
read_timeout_secs = 9
max_bytes = 1024
user_agent = "test-agent"
redirects = 0

[ui]
header_text = "hello"
reciter_fallback = "Unknown reciter"
now_playing_time_fields = ["elapsed", "remaining"]
now_playing_time_separator = " | "

[controls]
seek_seconds = 9
volume_step = 0.05

[log]
level = "warning"
file = "/tmp/tilawa-test.log"

[mpris]
enabled = false
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("TILAWA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("TILAWA__AUDIO__INITIAL_VOLUME");

    let s = Settings::load().unwrap();
    assert!((s.audio.initial_volume - 0.4).abs() < f32::EPSILON);
    assert_eq!(s.audio.tick_ms, 100);
    assert_eq!(s.fetch.connect_timeout_secs, 3);
    assert_eq!(s.fetch.read_timeout_secs, 9);
    assert_eq!(s.fetch.max_bytes, 1024);
    assert_eq!(s.fetch.user_agent, "test-agent");
    assert_eq!(s.fetch.redirects, 0);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.reciter_fallback, "Unknown reciter");
    assert_eq!(
        s.ui.now_playing_time_fields,
        vec![TimeField::Elapsed, TimeField::Remaining]
    );
    assert_eq!(s.ui.now_playing_time_separator, " | ");
    assert_eq!(s.controls.seek_seconds, 9);
    assert!((s.controls.volume_step - 0.05).abs() < f32::EPSILON);
    assert_eq!(s.log.level, LogLevelSetting::Warn);
    assert_eq!(
        s.log.file.as_deref(),
        Some(std::path::Path::new("/tmp/tilawa-test.log"))
    );
    assert!(!s.mpris.enabled);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_missing_file_falls_back_to_defaults() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("does-not-exist.toml");
    let _g1 = EnvGuard::set("TILAWA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("TILAWA__AUDIO__INITIAL_VOLUME");

    let s = Settings::load().unwrap();
    assert!((s.audio.initial_volume - 1.0).abs() < f32::EPSILON);
    assert_eq!(s.controls.seek_seconds, 5);
    assert_eq!(s.ui.reciter_fallback, "Quran Recitation");
    assert_eq!(s.log.level, LogLevelSetting::Info);
    assert!(s.mpris.enabled);
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
initial_volume = 0.9
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("TILAWA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("TILAWA__AUDIO__INITIAL_VOLUME", "0.25");

    let s = Settings::load().unwrap();
    assert!((s.audio.initial_volume - 0.25).abs() < f32::EPSILON);
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.audio.initial_volume = 1.5;
    assert!(s.validate().is_err());
    s.audio.initial_volume = 1.0;

    s.audio.tick_ms = 0;
    assert!(s.validate().is_err());
    s.audio.tick_ms = 200;

    s.controls.volume_step = 0.0;
    assert!(s.validate().is_err());
    s.controls.volume_step = 0.1;

    s.fetch.max_bytes = 0;
    assert!(s.validate().is_err());
}

#[test]
fn log_level_setting_maps_to_level_filter() {
    assert_eq!(
        log::LevelFilter::from(LogLevelSetting::Off),
        log::LevelFilter::Off
    );
    assert_eq!(
        log::LevelFilter::from(LogLevelSetting::Debug),
        log::LevelFilter::Debug
    );
}
