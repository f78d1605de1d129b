//! Error types shared across the player.
//!
//! Only startup concerns (configuration, the audio device, the terminal) are
//! allowed to surface as fatal errors. Everything the engine does at runtime is
//! logged and absorbed instead.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by the decode, output and resample collaborators.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The file could not be opened.
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The container or codec was not understood, or the data is corrupt.
    #[error("failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// The audio device could not be opened or driven.
    #[error("audio device error: {0}")]
    Device(String),

    /// The stream was closed or handed off and can no longer be used.
    #[error("stream is closed")]
    Closed,
}

/// Failures of the engine command surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The command mailbox is at capacity; the request was not queued.
    #[error("command mailbox is full")]
    MailboxFull,

    /// The engine's lifecycle has ended and it no longer accepts commands.
    #[error("playback engine has stopped")]
    Stopped,
}

/// Top-level error type for process startup and the terminal loop.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
