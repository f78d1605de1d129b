use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::prelude::Accessor;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{Directory, Library, Song};

pub(super) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            settings
                .extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.'))
                .any(|e| !e.is_empty() && e.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Scan every root into a fresh [`Library`].
///
/// Roots that are missing, are not directories, or hold no songs are left out.
/// Unreadable entries below a root are skipped and the rest of the walk goes on.
pub fn scan(roots: &[PathBuf], settings: &LibrarySettings) -> Library {
    let directories = roots
        .iter()
        .filter_map(|root| scan_root(root, settings))
        .collect();
    Library::new(directories)
}

fn scan_root(root: &Path, settings: &LibrarySettings) -> Option<Directory> {
    if !root.is_dir() {
        debug!(root = %root.display(), "skipping scan root: not a directory");
        return None;
    }

    let mut walker = WalkDir::new(root).follow_links(settings.follow_links);
    if let Some(d) = settings.max_depth {
        walker = walker.max_depth(d);
    }

    // `open[d]` is the directory being filled at walk depth `d`. WalkDir yields
    // entries pre-order, so an entry at depth `d` closes everything deeper.
    let mut open: Vec<Directory> = Vec::new();

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        close_deeper_than(&mut open, entry.depth());

        let path = entry.path();
        if entry.file_type().is_dir() {
            open.push(Directory::new(path));
        } else if is_audio_file(path, settings) {
            if let Some(parent) = open.last_mut() {
                parent.songs.push(Arc::new(read_song(path, settings)));
            }
        }
    }

    close_deeper_than(&mut open, 1);
    let mut dir = open.pop()?;
    sort_children(&mut dir);
    (!dir.is_empty()).then_some(dir)
}

/// Pop directories until at most `depth` remain open, attaching each popped one
/// to its parent unless its subtree is empty.
fn close_deeper_than(open: &mut Vec<Directory>, depth: usize) {
    while open.len() > depth {
        let Some(mut dir) = open.pop() else {
            return;
        };
        sort_children(&mut dir);
        if dir.is_empty() {
            debug!(dir = %dir.path.display(), "pruning directory without songs");
            continue;
        }
        if let Some(parent) = open.last_mut() {
            parent.dirs.push(dir);
        }
    }
}

fn sort_children(dir: &mut Directory) {
    dir.songs
        .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    dir.dirs
        .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
}

fn read_song(path: &Path, settings: &LibrarySettings) -> Song {
    let mut song = Song::new(path);
    if !settings.read_tags {
        return song;
    }

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            let duration = tagged.properties().duration();
            if !duration.is_zero() {
                song.duration = Some(duration);
            }
            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                song.artist = non_empty(tag.artist());
                song.album = non_empty(tag.album());
            }
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no readable tags");
        }
    }
    song
}

fn non_empty(value: Option<Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
