use super::event_loop::{EngineEvents, adopt_rescan};
use super::*;
use crate::app::App;
use crate::config::{LibrarySettings, PlaybackSettings};
use crate::events::{EventBus, EventKind};
use crate::library::{LibraryManager, Song};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"not real audio").unwrap();
}

fn manager(root: &Path) -> LibraryManager {
    let mut manager = LibraryManager::new(LibrarySettings {
        roots: vec![root.to_path_buf()],
        read_tags: false,
        ..LibrarySettings::default()
    });
    manager.rescan();
    manager
}

#[test]
fn raw_mode_is_left_when_terminal_setup_fails() {
    let calls = RefCell::new(Vec::new());
    let result: io::Result<()> = with_raw_mode(
        || {
            calls.borrow_mut().push("enable");
            Ok(())
        },
        || {
            calls.borrow_mut().push("enter");
            Err(io::Error::other("no tty"))
        },
        || {
            calls.borrow_mut().push("disable");
            Ok(())
        },
    );

    assert!(result.is_err());
    assert_eq!(*calls.borrow(), vec!["enable", "enter", "disable"]);
}

#[test]
fn raw_mode_stays_on_after_successful_setup() {
    let calls = RefCell::new(Vec::new());
    let result = with_raw_mode(
        || {
            calls.borrow_mut().push("enable");
            Ok(())
        },
        || Ok(7),
        || {
            calls.borrow_mut().push("disable");
            Ok(())
        },
    );

    assert_eq!(result.unwrap(), 7);
    assert_eq!(*calls.borrow(), vec!["enable"]);
}

#[test]
fn setup_is_skipped_when_raw_mode_cannot_be_enabled() {
    let calls = RefCell::new(Vec::new());
    let result: io::Result<()> = with_raw_mode(
        || Err(io::Error::other("not a terminal")),
        || {
            calls.borrow_mut().push("enter");
            Ok(())
        },
        || {
            calls.borrow_mut().push("disable");
            Ok(())
        },
    );

    assert!(result.is_err());
    assert!(calls.borrow().is_empty());
}

#[test]
fn closing_engine_events_unsubscribes_every_kind() {
    let bus = EventBus::new();
    let events = EngineEvents::subscribe(&bus);
    for kind in EventKind::ALL {
        assert_eq!(bus.subscriber_count(kind), 1);
    }

    events.close(&bus);
    for kind in EventKind::ALL {
        assert_eq!(bus.subscriber_count(kind), 0);
    }
}

#[test]
fn rescan_refreshes_the_playing_song() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("music");
    touch(&root.join("a.mp3"));
    touch(&root.join("b.mp3"));
    let library = manager(&root);

    let mut app = App::new(library.library().clone(), &PlaybackSettings::default());
    let stale = Song::new(root.join("a.mp3"));
    app.now_playing = Some(std::sync::Arc::new(stale.clone()));

    adopt_rescan(&mut app, &library, Some(&stale));

    let playing = app.now_playing.as_ref().unwrap();
    assert_eq!(playing.path, root.join("a.mp3"));
    assert_eq!(app.status.as_deref(), Some("rescanned: 2 songs"));
}

#[test]
fn rescan_reports_a_playing_song_that_disappeared() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("music");
    touch(&root.join("a.mp3"));
    let library = manager(&root);

    let mut app = App::new(library.library().clone(), &PlaybackSettings::default());
    let gone = Song::new(root.join("gone.mp3"));

    adopt_rescan(&mut app, &library, Some(&gone));

    assert_eq!(
        app.status.as_deref(),
        Some("rescanned: 1 songs, current song no longer in library")
    );
    assert_eq!(app.sidebar().len(), 1);
}

#[test]
fn rescan_with_nothing_playing_only_swaps_the_library() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("music");
    touch(&root.join("rock/a.mp3"));
    let library = manager(&root);

    let mut app = App::new(Default::default(), &PlaybackSettings::default());
    adopt_rescan(&mut app, &library, None);

    assert!(app.now_playing.is_none());
    assert_eq!(app.sidebar().len(), 2);
}
