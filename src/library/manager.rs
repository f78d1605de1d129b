use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::LibrarySettings;

use super::model::{Directory, Library, Song};
use super::scan::scan;

/// Holds the current [`Library`] and rebuilds it on request.
///
/// Not synchronized: callers rescan only at startup or on an explicit user
/// action, from the same thread that reads the library.
pub struct LibraryManager {
    library: Library,
    /// Roots of the last scan; the configured roots until then.
    roots: Vec<PathBuf>,
    settings: LibrarySettings,
}

impl LibraryManager {
    pub fn new(settings: LibrarySettings) -> Self {
        Self {
            library: Library::default(),
            roots: settings.roots.clone(),
            settings,
        }
    }

    /// Scan `roots` and replace the held library with the result.
    pub fn scan(&mut self, roots: &[PathBuf]) {
        let library = scan(roots, &self.settings);
        info!(
            roots = roots.len(),
            directories = library.directories().len(),
            songs = library.all_songs().len(),
            "library scanned"
        );
        self.library = library;
        self.roots = roots.to_vec();
    }

    /// Scan the roots of the previous scan again, or the configured roots if
    /// there was none.
    pub fn rescan(&mut self) {
        let roots = self.roots.clone();
        self.scan(&roots);
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn find_song(&self, path: &Path) -> Option<Arc<Song>> {
        self.library.find_song(path)
    }

    pub fn all_songs(&self) -> Vec<Arc<Song>> {
        self.library.all_songs()
    }

    pub fn directories(&self) -> &[Directory] {
        self.library.directories()
    }
}
