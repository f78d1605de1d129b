use std::sync::Arc;
use std::time::Duration;

use crate::library::Song;

/// Topic a subscription listens on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    SongChanged,
    PlaybackResumed,
    PlaybackPaused,
    SongEnded,
    ProgressUpdated,
    VolumeChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::SongChanged,
        EventKind::PlaybackResumed,
        EventKind::PlaybackPaused,
        EventKind::SongEnded,
        EventKind::ProgressUpdated,
        EventKind::VolumeChanged,
    ];
}

/// An observable change of engine state.
///
/// Events are snapshots: the songs they carry stay valid after the engine has
/// moved on or stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new song started playing.
    SongChanged { song: Arc<Song> },
    /// Output is running.
    PlaybackResumed,
    /// Output is halted. `stopped` marks that nothing is loaded any more.
    PlaybackPaused { stopped: bool },
    /// The loaded song reached its end. Sent once per arrival at the end.
    SongEnded { song: Arc<Song> },
    /// Periodic position report for the loaded song.
    ProgressUpdated {
        current: Duration,
        total: Duration,
        song: Arc<Song>,
    },
    /// Volume level after clamping to `[0.0, 1.0]`.
    VolumeChanged { level: f64 },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::SongChanged { .. } => EventKind::SongChanged,
            Event::PlaybackResumed => EventKind::PlaybackResumed,
            Event::PlaybackPaused { .. } => EventKind::PlaybackPaused,
            Event::SongEnded { .. } => EventKind::SongEnded,
            Event::ProgressUpdated { .. } => EventKind::ProgressUpdated,
            Event::VolumeChanged { .. } => EventKind::VolumeChanged,
        }
    }
}
