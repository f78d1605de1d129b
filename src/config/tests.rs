use super::load::{default_config_path, default_log_path, resolve_config_path};
use super::schema::*;
use crate::error::Error;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
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
fn resolve_config_path_prefers_cadenza_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", "/tmp/cadenza-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        PathBuf::from("/tmp/cadenza-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/xdg-config-home")
            .join("cadenza")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("cadenza")
            .join("config.toml")
    );
}

#[test]
fn default_log_path_uses_xdg_state_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg-state");

    assert_eq!(
        default_log_path().unwrap(),
        PathBuf::from("/tmp/xdg-state")
            .join("cadenza")
            .join("cadenza.log")
    );
}

#[test]
fn default_roots_point_at_home_music() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("HOME", "/tmp/home-dir");

    let s = LibrarySettings::default();
    assert_eq!(s.roots, vec![PathBuf::from("/tmp/home-dir/Music")]);
    assert!(s.extensions.iter().any(|e| e == "m4a"));
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[library]
roots = ["/srv/music", "/mnt/usb"]
extensions = ["mp3"]
include_hidden = true
read_tags = false

[playback]
volume = 0.8
autoplay = false
repeat = true

[audio]
sample_rate = 48000

[controls]
seek_seconds = 10
volume_step = 0.1

[engine]
progress_interval_ms = 250

[ui]
header_text = "hello"

[log]
level = "debug"
file = "/tmp/cadenza.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("CADENZA__PLAYBACK__VOLUME");

    let s = Settings::load().unwrap();
    assert_eq!(
        s.library.roots,
        vec![PathBuf::from("/srv/music"), PathBuf::from("/mnt/usb")]
    );
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(s.library.include_hidden);
    assert!(!s.library.read_tags);
    assert!((s.playback.volume - 0.8).abs() < f64::EPSILON);
    assert!(!s.playback.autoplay);
    assert!(s.playback.repeat);
    assert_eq!(s.audio.sample_rate, 48_000);
    assert_eq!(s.controls.seek_seconds, 10);
    assert_eq!(s.engine.progress_interval_ms, 250);
    // untouched keys keep their defaults
    assert_eq!(s.engine.command_capacity, 10);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.log.level, "debug");
    assert_eq!(s.log.file, Some(PathBuf::from("/tmp/cadenza.log")));
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
volume = 0.9
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("CADENZA__PLAYBACK__VOLUME", "0.25");

    let s = Settings::load().unwrap();
    assert!((s.playback.volume - 0.25).abs() < f64::EPSILON);
}

#[test]
fn missing_config_file_yields_defaults() {
    let _lock = env_lock();
    let dir = tempfile::tempdir().unwrap();
    let _g1 = EnvGuard::set(
        "CADENZA_CONFIG_PATH",
        dir.path().join("absent.toml").to_str().unwrap(),
    );

    let s = Settings::load().unwrap();
    assert_eq!(s.controls.seek_seconds, 5);
    assert!(s.playback.autoplay);
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut s = Settings::default();
    s.playback.volume = 1.5;
    assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));

    let mut s = Settings::default();
    s.controls.seek_seconds = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.controls.volume_step = 0.0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.engine.event_capacity = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.engine.progress_interval_ms = 1;
    assert!(s.validate().is_err());
}
