//! The serialized command loop and the periodic progress loop.
//!
//! Both loops share one [`Core`]. Only the command loop takes the write
//! lock; the progress loop and status queries read. Events are published
//! while the lock is held so a subscriber never sees a progress report for a
//! song after the `SongChanged` that replaced it.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crossbeam_channel::{Receiver, select, tick};
use tracing::{debug, info, warn};

use super::lifecycle::Lifecycle;
use super::state::{LoadedStream, PlaybackState, StatusSnapshot};
use crate::audio::{Decode, Decoded, Output, Resample, volume_to_gain};
use crate::events::{Event, EventBus};
use crate::library::Song;

/// A stream within this many frames of its end counts as finished.
pub const END_TOLERANCE_FRAMES: u64 = 1000;

#[derive(Debug, Clone)]
pub enum Command {
    Play(Arc<Song>),
    TogglePause,
    Stop,
    /// Relative seek in milliseconds, negative for backwards.
    SeekBy(i64),
    SetVolume(f64),
    AdjustVolume(f64),
}

/// The collaborators the engine drives.
#[derive(Clone)]
pub struct Backend {
    pub decoder: Arc<dyn Decode>,
    pub output: Arc<dyn Output>,
    pub resampler: Arc<dyn Resample>,
    pub resample_quality: u8,
}

/// End-of-song edge detection, owned by the progress loop.
#[derive(Debug, Default)]
pub(super) struct EndTracker {
    generation: u64,
    at_end: bool,
}

pub(super) struct Core {
    backend: Backend,
    bus: EventBus,
    state: RwLock<PlaybackState>,
}

impl Core {
    pub fn new(backend: Backend, bus: EventBus) -> Self {
        Self {
            backend,
            bus,
            state: RwLock::new(PlaybackState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, PlaybackState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PlaybackState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.read().snapshot()
    }

    pub fn current_song(&self) -> Option<Arc<Song>> {
        self.read().song.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.read().playing
    }

    pub fn volume(&self) -> f64 {
        self.read().volume
    }

    pub fn handle(&self, command: Command) {
        debug!(?command, "command");
        match command {
            Command::Play(song) => self.play(song),
            Command::TogglePause => self.toggle_pause(),
            Command::Stop => self.stop(),
            Command::SeekBy(millis) => self.seek_by(millis),
            Command::SetVolume(level) => self.set_volume(level),
            Command::AdjustVolume(delta) => {
                let mut state = self.write();
                let level = state.volume + delta;
                self.apply_volume(&mut state, level);
            }
        }
    }

    fn play(&self, song: Arc<Song>) {
        // Stop before start, even if the new song turns out to be undecodable.
        let released = self.write().release(self.backend.output.as_ref());

        let Decoded {
            mut stream,
            source,
            format,
        } = match self.backend.decoder.decode(&song.path) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(song = %song.path.display(), error = %err, "cannot play song");
                if released {
                    self.bus.publish(Event::PlaybackPaused { stopped: true });
                }
                return;
            }
        };

        let device_rate = self.backend.output.sample_rate();
        let source = if format.sample_rate != device_rate {
            self.backend.resampler.resample(
                self.backend.resample_quality,
                format.sample_rate,
                device_rate,
                source,
            )
        } else {
            source
        };

        let mut state = self.write();
        self.backend.output.set_gain(volume_to_gain(state.volume));
        if let Err(err) = self.backend.output.play(source) {
            warn!(song = %song.path.display(), error = %err, "output rejected stream");
            stream.close();
            if released {
                self.bus.publish(Event::PlaybackPaused { stopped: true });
            }
            return;
        }

        state.generation += 1;
        let generation = state.generation;
        state.stream = Some(LoadedStream {
            stream,
            format,
            generation,
        });
        state.song = Some(song.clone());
        state.playing = true;
        info!(song = %song.name, sample_rate = format.sample_rate, "now playing");

        self.bus.publish(Event::SongChanged { song });
        self.bus.publish(Event::PlaybackResumed);
    }

    fn toggle_pause(&self) {
        let mut state = self.write();
        if state.stream.is_none() {
            debug!("toggle ignored, nothing loaded");
            return;
        }
        state.playing = !state.playing;
        self.backend.output.set_paused(!state.playing);
        if state.playing {
            self.bus.publish(Event::PlaybackResumed);
        } else {
            self.bus.publish(Event::PlaybackPaused { stopped: false });
        }
    }

    fn stop(&self) {
        let mut state = self.write();
        if !state.release(self.backend.output.as_ref()) {
            debug!("stop ignored, nothing loaded");
            return;
        }
        info!("playback stopped");
        self.bus.publish(Event::PlaybackPaused { stopped: true });
    }

    fn seek_by(&self, millis: i64) {
        let mut state = self.write();
        let Some(loaded) = state.stream.as_mut() else {
            debug!("seek ignored, nothing loaded");
            return;
        };

        let rate = i128::from(loaded.format.sample_rate);
        let current = i128::from(loaded.stream.position());
        let len = loaded.stream.len();
        let last = if len == 0 { u64::MAX } else { len - 1 };
        let target = (current + i128::from(millis) * rate / 1000).clamp(0, i128::from(last)) as u64;

        if let Err(err) = loaded.stream.seek(target) {
            warn!(error = %err, target, "seek failed");
        }
    }

    fn set_volume(&self, level: f64) {
        let mut state = self.write();
        self.apply_volume(&mut state, level);
    }

    fn apply_volume(&self, state: &mut PlaybackState, level: f64) {
        if level.is_nan() {
            debug!("volume ignored, not a number");
            return;
        }
        let level = level.clamp(0.0, 1.0);
        state.volume = level;
        self.backend.output.set_gain(volume_to_gain(level));
        self.bus.publish(Event::VolumeChanged { level });
    }

    /// Publish progress for the loaded stream and detect its end.
    pub fn report_progress(&self, tracker: &mut EndTracker) {
        let state = self.read();
        let (Some(loaded), Some(song)) = (&state.stream, &state.song) else {
            return;
        };

        let len = loaded.stream.len();
        let position = loaded.stream.position();
        let shown = if len == 0 { position } else { position.min(len) };
        self.bus.publish(Event::ProgressUpdated {
            current: loaded.format.frames_to_duration(shown),
            total: loaded.format.frames_to_duration(len),
            song: song.clone(),
        });

        if tracker.generation != loaded.generation {
            *tracker = EndTracker {
                generation: loaded.generation,
                at_end: false,
            };
        }
        if !state.playing {
            return;
        }

        let at_end = loaded.stream.is_finished()
            || (len > 0 && position.saturating_add(END_TOLERANCE_FRAMES) >= len);
        if at_end && !tracker.at_end {
            info!(song = %song.name, "song ended");
            self.bus.publish(Event::SongEnded { song: song.clone() });
        }
        tracker.at_end = at_end;
    }

    /// Release whatever is loaded. Called once the command loop exits.
    pub fn shut_down(&self) {
        if self.write().release(self.backend.output.as_ref()) {
            debug!("released stream on shutdown");
        }
    }
}

pub(super) fn run_commands(core: Arc<Core>, mailbox: Receiver<Command>, lifecycle: Lifecycle) {
    debug!("command loop started");
    while !lifecycle.is_cancelled() {
        select! {
            recv(mailbox) -> command => match command {
                Ok(command) => core.handle(command),
                Err(_) => break,
            },
            recv(lifecycle.done()) -> _ => break,
        }
    }
    core.shut_down();
    debug!("command loop exited");
}

pub(super) fn run_progress(core: Arc<Core>, interval: Duration, lifecycle: Lifecycle) {
    debug!(?interval, "progress loop started");
    let ticker = tick(interval);
    let mut tracker = EndTracker::default();
    while !lifecycle.is_cancelled() {
        select! {
            recv(ticker) -> _ => core.report_progress(&mut tracker),
            recv(lifecycle.done()) -> _ => break,
        }
    }
    debug!("progress loop exited");
}
