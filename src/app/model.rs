//! Presentation model: what the terminal shows and which song to play next.
//!
//! The model never talks to the engine. Methods that imply playback return
//! the song to play and the runtime forwards it as a `Play` command; engine
//! events flow back in through [`App::apply_event`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PlaybackSettings;
use crate::engine::DEFAULT_VOLUME;
use crate::events::Event;
use crate::library::{Directory, Library, Song};

/// Transport state as last reported by the engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Transport {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Which pane receives movement keys.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Sidebar,
    Songs,
}

/// One line of the flattened directory tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidebarRow {
    pub depth: usize,
    pub name: String,
    pub path: PathBuf,
    pub song_count: usize,
}

/// The directory a song was started from. Next/previous move within it.
#[derive(Clone, Debug)]
struct Queue {
    songs: Vec<Arc<Song>>,
    index: usize,
}

impl Queue {
    fn step(&mut self, forward: bool) -> Option<Arc<Song>> {
        let len = self.songs.len();
        if len == 0 {
            return None;
        }
        self.index = if forward {
            (self.index + 1) % len
        } else {
            (self.index + len - 1) % len
        };
        self.songs.get(self.index).cloned()
    }
}

/// The main application model.
pub struct App {
    library: Library,
    sidebar: Vec<SidebarRow>,
    pub sidebar_selected: usize,
    pub song_selected: usize,
    pub focus: Focus,

    pub transport: Transport,
    pub now_playing: Option<Arc<Song>>,
    pub elapsed: Duration,
    pub total: Duration,
    pub volume: f64,

    pub autoplay: bool,
    pub repeat: bool,
    queue: Option<Queue>,

    /// One-line message for the status bar, e.g. a rejected command.
    pub status: Option<String>,
}

impl App {
    pub fn new(library: Library, playback: &PlaybackSettings) -> Self {
        let mut app = Self {
            library: Library::default(),
            sidebar: Vec::new(),
            sidebar_selected: 0,
            song_selected: 0,
            focus: Focus::Sidebar,
            transport: Transport::Stopped,
            now_playing: None,
            elapsed: Duration::ZERO,
            total: Duration::ZERO,
            volume: DEFAULT_VOLUME,
            autoplay: playback.autoplay,
            repeat: playback.repeat,
            queue: None,
            status: None,
        };
        app.set_library(library);
        app
    }

    /// Replace the library and rebuild the sidebar. The selected directory is
    /// kept when it survived the rescan. Playback and the queue are untouched.
    pub fn set_library(&mut self, library: Library) {
        let previous = self.sidebar.get(self.sidebar_selected).map(|r| r.path.clone());

        self.sidebar.clear();
        for dir in library.directories() {
            flatten(dir, 0, &mut self.sidebar);
        }
        self.library = library;

        self.sidebar_selected = previous
            .and_then(|p| self.sidebar.iter().position(|r| r.path == p))
            .unwrap_or(0);
        let songs = self.shown_songs().len();
        if self.song_selected >= songs {
            self.song_selected = 0;
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn sidebar(&self) -> &[SidebarRow] {
        &self.sidebar
    }

    /// The directory highlighted in the sidebar.
    pub fn shown_directory(&self) -> Option<&Directory> {
        let row = self.sidebar.get(self.sidebar_selected)?;
        self.library.find_directory(&row.path)
    }

    /// Songs directly inside the highlighted directory.
    pub fn shown_songs(&self) -> &[Arc<Song>] {
        self.shown_directory().map_or(&[], |d| d.songs.as_slice())
    }

    #[cfg(test)]
    pub fn selected_song(&self) -> Option<&Arc<Song>> {
        self.shown_songs().get(self.song_selected)
    }

    pub fn move_down(&mut self) {
        match self.focus {
            Focus::Sidebar => {
                if let Some(next) = wrap_next(self.sidebar_selected, self.sidebar.len()) {
                    self.sidebar_selected = next;
                    self.song_selected = 0;
                }
            }
            Focus::Songs => {
                if let Some(next) = wrap_next(self.song_selected, self.shown_songs().len()) {
                    self.song_selected = next;
                }
            }
        }
    }

    pub fn move_up(&mut self) {
        match self.focus {
            Focus::Sidebar => {
                if let Some(prev) = wrap_prev(self.sidebar_selected, self.sidebar.len()) {
                    self.sidebar_selected = prev;
                    self.song_selected = 0;
                }
            }
            Focus::Songs => {
                if let Some(prev) = wrap_prev(self.song_selected, self.shown_songs().len()) {
                    self.song_selected = prev;
                }
            }
        }
    }

    pub fn focus_sidebar(&mut self) {
        self.focus = Focus::Sidebar;
    }

    pub fn focus_songs(&mut self) {
        if !self.shown_songs().is_empty() {
            self.focus = Focus::Songs;
        }
    }

    /// `Enter`: open the highlighted directory, or play the highlighted song
    /// and make its directory the queue.
    pub fn activate(&mut self) -> Option<Arc<Song>> {
        match self.focus {
            Focus::Sidebar => {
                self.song_selected = 0;
                self.focus_songs();
                None
            }
            Focus::Songs => {
                let songs = self.shown_songs().to_vec();
                let song = songs.get(self.song_selected)?.clone();
                self.queue = Some(Queue {
                    songs,
                    index: self.song_selected,
                });
                Some(song)
            }
        }
    }

    /// Next song in the queue, wrapping to the first. Without a queue the
    /// highlighted directory is used, starting from its first song.
    pub fn next_song(&mut self) -> Option<Arc<Song>> {
        self.step(true)
    }

    pub fn prev_song(&mut self) -> Option<Arc<Song>> {
        self.step(false)
    }

    fn step(&mut self, forward: bool) -> Option<Arc<Song>> {
        if self.queue.is_none() {
            let songs = self.shown_songs().to_vec();
            if songs.is_empty() {
                return None;
            }
            // Positioned so one step lands on the first (or last) song.
            let index = if forward { songs.len() - 1 } else { 0 };
            self.queue = Some(Queue { songs, index });
        }
        let song = self.queue.as_mut()?.step(forward)?;
        self.follow(&song);
        Some(song)
    }

    /// Keep the song list cursor on `song` when its directory is shown.
    fn follow(&mut self, song: &Song) {
        if let Some(i) = self.shown_songs().iter().position(|s| s.path == song.path) {
            self.song_selected = i;
        }
    }

    /// What to play after `song` ended: the same song when repeating, else
    /// the next one when autoplay is on, else nothing.
    pub fn on_song_ended(&mut self, song: &Arc<Song>) -> Option<Arc<Song>> {
        if self.repeat {
            Some(song.clone())
        } else if self.autoplay {
            self.next_song()
        } else {
            None
        }
    }

    pub fn toggle_repeat(&mut self) {
        self.repeat = !self.repeat;
    }

    pub fn toggle_autoplay(&mut self) {
        self.autoplay = !self.autoplay;
    }

    /// Fold an engine event into the model. `SongEnded` is left to
    /// [`App::on_song_ended`].
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::SongChanged { song } => {
                self.total = song.duration.unwrap_or_default();
                self.elapsed = Duration::ZERO;
                self.now_playing = Some(song.clone());
                self.transport = Transport::Playing;
                self.status = None;
            }
            Event::PlaybackResumed => {
                if self.now_playing.is_some() {
                    self.transport = Transport::Playing;
                }
            }
            Event::PlaybackPaused { stopped: true } => {
                self.transport = Transport::Stopped;
                self.now_playing = None;
                self.elapsed = Duration::ZERO;
                self.total = Duration::ZERO;
            }
            Event::PlaybackPaused { stopped: false } => {
                if self.now_playing.is_some() {
                    self.transport = Transport::Paused;
                }
            }
            Event::ProgressUpdated {
                current,
                total,
                song,
            } => {
                // A report can trail the SongChanged that replaced its song.
                if self.now_playing.as_ref().is_some_and(|s| s.path == song.path) {
                    self.elapsed = *current;
                    if !total.is_zero() {
                        self.total = *total;
                    }
                }
            }
            Event::VolumeChanged { level } => self.volume = *level,
            Event::SongEnded { .. } => {}
        }
    }

    /// Elapsed fraction of the current song in `[0, 1]`.
    pub fn progress_ratio(&self) -> f64 {
        if self.total.is_zero() {
            return 0.0;
        }
        (self.elapsed.as_secs_f64() / self.total.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }
}

fn flatten(dir: &Directory, depth: usize, out: &mut Vec<SidebarRow>) {
    out.push(SidebarRow {
        depth,
        name: dir.name.clone(),
        path: dir.path.clone(),
        song_count: dir.songs.len(),
    });
    for child in &dir.dirs {
        flatten(child, depth + 1, out);
    }
}

fn wrap_next(current: usize, len: usize) -> Option<usize> {
    (len > 0).then(|| (current + 1) % len)
}

fn wrap_prev(current: usize, len: usize) -> Option<usize> {
    (len > 0).then(|| (current + len - 1) % len)
}
