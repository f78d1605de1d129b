use std::{env, path::PathBuf};

use crate::error::Error;

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `CADENZA__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("CADENZA")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if !(0.0..=1.0).contains(&self.playback.volume) {
            return invalid("playback.volume must be within 0.0..=1.0");
        }
        if self.controls.seek_seconds == 0 {
            return invalid("controls.seek_seconds must be >= 1");
        }
        if !(self.controls.volume_step > 0.0 && self.controls.volume_step <= 1.0) {
            return invalid("controls.volume_step must be within (0.0, 1.0]");
        }
        if self.engine.command_capacity == 0
            || self.engine.event_capacity == 0
            || self.engine.song_ended_capacity == 0
        {
            return invalid("engine capacities must be >= 1");
        }
        if self.engine.progress_interval_ms < 10 {
            return invalid("engine.progress_interval_ms must be >= 10");
        }
        if self.audio.sample_rate == 0 {
            return invalid("audio.sample_rate must be > 0");
        }
        Ok(())
    }
}

/// Resolve the config path from `CADENZA_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("CADENZA_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/cadenza/config.toml`
/// or `~/.config/cadenza/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("cadenza").join("config.toml"))
}

/// Compute the default log path under `$XDG_STATE_HOME/cadenza/cadenza.log`
/// or `~/.local/state/cadenza/cadenza.log`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("cadenza").join("cadenza.log"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
