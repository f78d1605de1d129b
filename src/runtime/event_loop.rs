use std::time::Duration;

use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info, warn};

use crate::app::{App, Focus, Transport};
use crate::config;
use crate::engine::Player;
use crate::error::{EngineError, Error};
use crate::events::{Event, EventBus, EventKind, Subscription};
use crate::library::{LibraryManager, Song};
use crate::ui;

/// One subscription per event kind, held for the lifetime of the terminal loop.
pub struct EngineEvents {
    subscriptions: Vec<Subscription>,
}

impl EngineEvents {
    pub fn subscribe(bus: &EventBus) -> Self {
        Self {
            subscriptions: EventKind::ALL.iter().map(|&k| bus.subscribe(k)).collect(),
        }
    }

    /// Everything queued, grouped by kind. Order within a kind is publish order.
    fn drain(&self) -> Vec<Event> {
        self.subscriptions.iter().flat_map(Subscription::drain).collect()
    }

    /// Detach from the bus. Anything still queued is discarded.
    pub fn close(self, bus: &EventBus) {
        for subscription in self.subscriptions {
            let kind = subscription.kind();
            bus.unsubscribe(subscription);
            debug!(?kind, remaining = bus.subscriber_count(kind), "unsubscribed");
        }
    }
}

/// Main terminal event loop: handles input, folds engine events into the
/// model and draws. Returns `Ok(())` when the user quits.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &Player,
    library: &mut LibraryManager,
    events: &EngineEvents,
) -> Result<(), Error> {
    loop {
        if player.lifecycle().is_cancelled() {
            return Ok(());
        }

        for event in events.drain() {
            match &event {
                Event::SongEnded { song } => {
                    // Ignore an end that was overtaken by a user action.
                    let current = player.current_song();
                    if current.is_some_and(|c| c.path == song.path) {
                        if let Some(next) = app.on_song_ended(song) {
                            submit(app, player.play(next));
                        }
                    }
                }
                other => app.apply_event(other),
            }
        }
        // Kinds arrive on separate mailboxes, so settle transport state from
        // the engine itself.
        reconcile(app, player);

        terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;

        if event::poll(Duration::from_millis(50))? {
            if let TermEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, app, player, library) {
                    player.lifecycle().cancel();
                    return Ok(());
                }
            }
        }
    }
}

fn reconcile(app: &mut App, player: &Player) {
    let snapshot = player.snapshot();
    match snapshot.song {
        None => {
            if app.now_playing.is_some() {
                app.apply_event(&Event::PlaybackPaused { stopped: true });
            }
        }
        Some(song) => {
            let same = app.now_playing.as_ref().is_some_and(|s| s.path == song.path);
            if !same {
                app.apply_event(&Event::SongChanged { song });
            }
            app.transport = if snapshot.playing {
                Transport::Playing
            } else {
                Transport::Paused
            };
        }
    }
    app.volume = snapshot.volume;
}

/// Report a rejected command in the status bar.
fn submit(app: &mut App, result: Result<(), EngineError>) {
    if let Err(err) = result {
        warn!(error = %err, "command rejected");
        app.set_status(err.to_string());
    }
}

/// Returns `true` when the user asked to quit.
fn handle_key_event(
    key: KeyEvent,
    app: &mut App,
    player: &Player,
    library: &mut LibraryManager,
) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            info!("quit requested");
            return true;
        }
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('h') | KeyCode::Left => app.focus_sidebar(),
        KeyCode::Char('l') | KeyCode::Right => app.focus_songs(),
        KeyCode::Enter => {
            if let Some(song) = app.activate() {
                submit(app, player.play(song));
            }
        }
        KeyCode::Char(' ') => {
            // Nothing loaded: start the highlighted song instead.
            if app.transport == Transport::Stopped && app.focus == Focus::Songs {
                if let Some(song) = app.activate() {
                    submit(app, player.play(song));
                }
            } else {
                submit(app, player.toggle_play_pause());
            }
        }
        KeyCode::Char('s') => submit(app, player.stop()),
        KeyCode::Char('n') => {
            if let Some(song) = app.next_song() {
                submit(app, player.play(song));
            }
        }
        KeyCode::Char('N') => {
            if let Some(song) = app.prev_song() {
                submit(app, player.play(song));
            }
        }
        KeyCode::Char('L') => submit(app, player.seek_forward()),
        KeyCode::Char('H') => submit(app, player.seek_backward()),
        KeyCode::Char('+') | KeyCode::Char('=') => submit(app, player.volume_up()),
        KeyCode::Char('-') => submit(app, player.volume_down()),
        KeyCode::Char('r') => app.toggle_repeat(),
        KeyCode::Char('a') => app.toggle_autoplay(),
        KeyCode::Char('u') => {
            library.rescan();
            adopt_rescan(app, library, player.current_song().as_deref());
        }
        other => debug!(?other, "unbound key"),
    }
    false
}

/// Swap a freshly scanned library into the model. Playback is left alone;
/// the playing song picks up re-read tags when it is still in the library.
pub(super) fn adopt_rescan(app: &mut App, library: &LibraryManager, current: Option<&Song>) {
    app.set_library(library.library().clone());
    let mut status = format!("rescanned: {} songs", library.all_songs().len());
    if let Some(current) = current {
        match library.find_song(&current.path) {
            Some(fresh) => app.now_playing = Some(fresh),
            None => status.push_str(", current song no longer in library"),
        }
    }
    app.set_status(status);
}
