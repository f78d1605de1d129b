use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError, bounded};
use tracing::{info, warn};

use super::lifecycle::Lifecycle;
use super::state::StatusSnapshot;
use super::worker::{Backend, Command, Core, run_commands, run_progress};
use crate::config::Settings;
use crate::error::{EngineError, Error};
use crate::events::EventBus;
use crate::library::Song;

/// Handle to a running playback engine.
///
/// Commands are queued on a bounded mailbox and never block the caller.
/// Queries read the engine state directly. Dropping the handle cancels the
/// engine's lifecycle; [`Player::shutdown`] also waits for both loops.
pub struct Player {
    mailbox: Sender<Command>,
    core: Arc<Core>,
    bus: EventBus,
    lifecycle: Lifecycle,
    seek_step: Duration,
    volume_step: f64,
    threads: Vec<JoinHandle<()>>,
}

impl Player {
    pub fn start(
        backend: Backend,
        bus: EventBus,
        settings: &Settings,
        lifecycle: Lifecycle,
    ) -> Result<Self, Error> {
        let (mailbox, inbox) = bounded(settings.engine.command_capacity.max(1));
        let core = Arc::new(Core::new(backend, bus.clone()));
        let interval = Duration::from_millis(settings.engine.progress_interval_ms);

        let mut player = Self {
            mailbox,
            core: core.clone(),
            bus,
            lifecycle: lifecycle.clone(),
            seek_step: Duration::from_secs(settings.controls.seek_seconds),
            volume_step: settings.controls.volume_step,
            threads: Vec::with_capacity(2),
        };

        let commands = {
            let core = core.clone();
            let lifecycle = lifecycle.clone();
            thread::Builder::new()
                .name("cadenza-commands".into())
                .spawn(move || run_commands(core, inbox, lifecycle))?
        };
        player.threads.push(commands);

        // On failure `player` drops here, cancelling the command loop.
        let progress = thread::Builder::new()
            .name("cadenza-progress".into())
            .spawn(move || run_progress(core, interval, lifecycle))?;
        player.threads.push(progress);

        info!(?interval, "playback engine started");
        Ok(player)
    }

    fn send(&self, command: Command) -> Result<(), EngineError> {
        if self.lifecycle.is_cancelled() {
            return Err(EngineError::Stopped);
        }
        self.mailbox.try_send(command).map_err(|err| match err {
            TrySendError::Full(command) => {
                warn!(?command, "command mailbox full, request dropped");
                EngineError::MailboxFull
            }
            TrySendError::Disconnected(_) => EngineError::Stopped,
        })
    }

    pub fn play(&self, song: Arc<Song>) -> Result<(), EngineError> {
        self.send(Command::Play(song))
    }

    pub fn toggle_play_pause(&self) -> Result<(), EngineError> {
        self.send(Command::TogglePause)
    }

    pub fn stop(&self) -> Result<(), EngineError> {
        self.send(Command::Stop)
    }

    pub fn seek_forward(&self) -> Result<(), EngineError> {
        self.send(Command::SeekBy(millis(self.seek_step)))
    }

    pub fn seek_backward(&self) -> Result<(), EngineError> {
        self.send(Command::SeekBy(-millis(self.seek_step)))
    }

    pub fn volume_up(&self) -> Result<(), EngineError> {
        self.send(Command::AdjustVolume(self.volume_step))
    }

    pub fn volume_down(&self) -> Result<(), EngineError> {
        self.send(Command::AdjustVolume(-self.volume_step))
    }

    pub fn set_volume(&self, level: f64) -> Result<(), EngineError> {
        self.send(Command::SetVolume(level))
    }

    pub fn current_song(&self) -> Option<Arc<Song>> {
        self.core.current_song()
    }

    pub fn is_playing(&self) -> bool {
        self.core.is_playing()
    }

    pub fn volume(&self) -> f64 {
        self.core.volume()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.core.snapshot()
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Cancel the lifecycle and wait for both loops to exit. The loaded
    /// stream, if any, is released before this returns.
    pub fn shutdown(mut self) {
        self.lifecycle.cancel();
        for handle in self.threads.drain(..) {
            let name = handle.thread().name().map(str::to_owned);
            if handle.join().is_err() {
                warn!(thread = ?name, "engine thread panicked");
            }
        }
        info!("playback engine stopped");
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.lifecycle.cancel();
    }
}

fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
