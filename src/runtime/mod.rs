use std::env;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{AudioDevice, RodioDecoder, RodioResampler};
use crate::engine::{Backend, Lifecycle, Player};
use crate::error::Error;
use crate::events::EventBus;
use crate::library::LibraryManager;

mod event_loop;
mod logging;
mod settings;

#[cfg(test)]
mod tests;

/// Wire everything up and run the terminal loop until the user quits.
///
/// Scan roots come from the command line when given, else from config.
pub fn run() -> Result<(), Error> {
    let (settings, config_warning) = settings::load_settings();
    let log_path = logging::init(&settings.log);
    if let Some(msg) = config_warning {
        warn!("{msg}");
    }
    info!(log = ?log_path, "cadenza starting");

    let cli_roots: Vec<PathBuf> = env::args_os().skip(1).map(PathBuf::from).collect();
    let mut library = LibraryManager::new(settings.library.clone());
    if cli_roots.is_empty() {
        library.rescan();
    } else {
        library.scan(&cli_roots);
    }
    info!(
        roots = ?library.roots(),
        top_level = library.directories().len(),
        "library ready"
    );

    // Must outlive the player: dropping it closes the device.
    let device = AudioDevice::open(&settings.audio)?;
    let backend = Backend {
        decoder: Arc::new(RodioDecoder),
        output: Arc::new(device.output()),
        resampler: Arc::new(RodioResampler),
        resample_quality: settings.audio.resample_quality,
    };
    let bus = EventBus::with_capacity(
        settings.engine.event_capacity,
        settings.engine.song_ended_capacity,
    );
    let events = event_loop::EngineEvents::subscribe(&bus);
    let player = Player::start(backend, bus, &settings, Lifecycle::new())?;
    player.set_volume(settings.playback.volume)?;

    let mut app = App::new(library.library().clone(), &settings.playback);

    let mut terminal = with_raw_mode(enable_raw_mode, open_terminal, disable_raw_mode)?;

    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &player,
        &mut library,
        &events,
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    events.close(player.events());
    info!(
        playing = player.is_playing(),
        volume = player.volume(),
        "shutting down playback"
    );
    player.shutdown();
    drop(device);
    info!("cadenza exited");
    run_result
}

/// Turn raw mode on and run `enter`. Raw mode is switched back off when
/// `enter` fails so the shell is left usable.
fn with_raw_mode<T>(
    enable: impl FnOnce() -> io::Result<()>,
    enter: impl FnOnce() -> io::Result<T>,
    disable: impl FnOnce() -> io::Result<()>,
) -> io::Result<T> {
    enable()?;
    enter().inspect_err(|_| {
        if let Err(err) = disable() {
            warn!(error = %err, "cannot leave raw mode");
        }
    })
}

fn open_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    })
}
