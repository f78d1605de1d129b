use std::sync::Arc;
use std::time::Duration;

use crate::audio::{FrameStream, Output, StreamFormat};
use crate::library::Song;

/// Volume the engine starts at until told otherwise.
pub const DEFAULT_VOLUME: f64 = 0.5;

/// The stream the engine currently owns.
pub(super) struct LoadedStream {
    pub stream: Box<dyn FrameStream>,
    pub format: StreamFormat,
    /// Bumped on every successful `Play`, so the progress loop can tell a
    /// replayed song from the one it already saw end.
    pub generation: u64,
}

/// Engine-private playback state. Only the command loop writes it.
pub(super) struct PlaybackState {
    pub song: Option<Arc<Song>>,
    /// Only ever true while `stream` is loaded and not paused.
    pub playing: bool,
    pub volume: f64,
    pub stream: Option<LoadedStream>,
    pub generation: u64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            song: None,
            playing: false,
            volume: DEFAULT_VOLUME,
            stream: None,
            generation: 0,
        }
    }
}

impl PlaybackState {
    /// Halt output and close the loaded stream, if any. Returns whether a
    /// stream was released.
    pub fn release(&mut self, output: &dyn Output) -> bool {
        self.song = None;
        self.playing = false;
        let Some(mut loaded) = self.stream.take() else {
            return false;
        };
        output.clear();
        loaded.stream.close();
        true
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let (position, total) = match &self.stream {
            Some(loaded) => (
                loaded.format.frames_to_duration(loaded.stream.position()),
                loaded.format.frames_to_duration(loaded.stream.len()),
            ),
            None => (Duration::ZERO, Duration::ZERO),
        };
        StatusSnapshot {
            song: self.song.clone(),
            playing: self.playing,
            volume: self.volume,
            position,
            total,
        }
    }
}

/// A consistent view of the engine taken under one lock.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub song: Option<Arc<Song>>,
    pub playing: bool,
    pub volume: f64,
    pub position: Duration,
    pub total: Duration,
}
