use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A playable file. Identity is the absolute path.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub path: PathBuf,
    /// File name without extension.
    pub name: String,
    pub duration: Option<Duration>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

impl Song {
    /// Build a song with no tag metadata; the name is taken from the file stem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        Self {
            path,
            name,
            duration: None,
            artist: None,
            album: None,
        }
    }

    /// `Artist - Name` when an artist tag is present, else just the name.
    pub fn label(&self) -> String {
        match self.artist.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => format!("{} - {}", a, self.name),
            _ => self.name.clone(),
        }
    }
}

/// A directory in the library tree.
///
/// Songs and sub-directories are sorted by name. The scanner never produces a
/// directory whose subtree holds no songs.
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    pub path: PathBuf,
    pub name: String,
    pub songs: Vec<Arc<Song>>,
    pub dirs: Vec<Directory>,
}

impl Directory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            songs: Vec::new(),
            dirs: Vec::new(),
        }
    }

    /// No songs and no sub-directories.
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty() && self.dirs.is_empty()
    }

    /// Songs of this directory followed by each sub-directory's songs, pre-order.
    pub fn all_songs(&self) -> Vec<Arc<Song>> {
        let mut out = Vec::new();
        self.collect_songs(&mut out);
        out
    }

    fn collect_songs(&self, out: &mut Vec<Arc<Song>>) {
        out.extend(self.songs.iter().cloned());
        for dir in &self.dirs {
            dir.collect_songs(out);
        }
    }

    /// Depth-first search by path equality.
    pub fn find_song(&self, path: &Path) -> Option<&Arc<Song>> {
        self.songs
            .iter()
            .find(|s| s.path == path)
            .or_else(|| self.dirs.iter().find_map(|d| d.find_song(path)))
    }

    pub fn find_directory(&self, path: &Path) -> Option<&Directory> {
        if self.path == path {
            return Some(self);
        }
        self.dirs.iter().find_map(|d| d.find_directory(path))
    }
}

/// Root directories, one per configured scan root that yielded songs, in
/// configuration order. Replaced wholesale on rescan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    directories: Vec<Directory>,
}

impl Library {
    pub fn new(directories: Vec<Directory>) -> Self {
        Self { directories }
    }

    pub fn directories(&self) -> &[Directory] {
        &self.directories
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    pub fn all_songs(&self) -> Vec<Arc<Song>> {
        self.directories.iter().flat_map(Directory::all_songs).collect()
    }

    pub fn find_song(&self, path: &Path) -> Option<Arc<Song>> {
        self.directories
            .iter()
            .find_map(|d| d.find_song(path))
            .cloned()
    }

    pub fn find_directory(&self, path: &Path) -> Option<&Directory> {
        self.directories.iter().find_map(|d| d.find_directory(path))
    }
}
