use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cadenza/config.toml` or `~/.config/cadenza/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CADENZA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
///
/// Settings are read once at startup and never written back.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub audio: AudioSettings,
    pub controls: ControlsSettings,
    pub engine: EngineSettings,
    pub ui: UiSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directories to scan, in the order they appear in the sidebar.
    pub roots: Vec<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Optional cap on directory recursion depth (the root itself is depth 0).
    pub max_depth: Option<usize>,
    /// Read artist/album/duration tags while scanning.
    pub read_tags: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            roots: default_music_dir().into_iter().collect(),
            extensions: vec![
                "mp3".into(),
                "wav".into(),
                "flac".into(),
                "ogg".into(),
                "m4a".into(),
            ],
            follow_links: true,
            include_hidden: false,
            max_depth: None,
            read_tags: true,
        }
    }
}

/// `~/Music`, when a home directory is known.
fn default_music_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join("Music"))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Initial volume level in `[0.0, 1.0]`.
    pub volume: f64,
    /// Advance to the next song in the directory when one ends.
    pub autoplay: bool,
    /// Replay the current song when it ends (wins over autoplay).
    pub repeat: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume: 0.5,
            autoplay: true,
            repeat: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Sample rate the output device is opened with.
    pub sample_rate: u32,
    /// Device buffer length in milliseconds.
    pub buffer_ms: u32,
    /// Quality hint handed to the resampler.
    pub resample_quality: u8,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            buffer_ms: 100,
            resample_quality: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to seek when pressing `H` / `L`.
    pub seek_seconds: u64,
    /// Volume change applied by `+` / `-`.
    pub volume_step: f64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            seek_seconds: 5,
            volume_step: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Capacity of the engine's command mailbox.
    pub command_capacity: usize,
    /// Interval between progress reports (milliseconds).
    pub progress_interval_ms: u64,
    /// Mailbox capacity of each event subscription.
    pub event_capacity: usize,
    /// Mailbox capacity of `SongEnded` subscriptions.
    pub song_ended_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            command_capacity: 10,
            progress_interval_ms: 1000,
            event_capacity: 100,
            song_ended_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ cadenza ~ ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/cadenza/cadenza.log`.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
