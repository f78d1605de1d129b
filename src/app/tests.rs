use super::*;
use crate::config::PlaybackSettings;
use crate::events::Event;
use crate::library::{Directory, Library, Song};
use std::sync::Arc;
use std::time::Duration;

fn song(dir: &str, name: &str) -> Arc<Song> {
    Arc::new(Song::new(format!("{dir}/{name}.mp3")))
}

fn dir(path: &str, songs: &[&str], dirs: Vec<Directory>) -> Directory {
    let mut d = Directory::new(path);
    d.songs = songs.iter().map(|s| song(path, s)).collect();
    d.dirs = dirs;
    d
}

/// Music (intro) / rock (a, b, c) / jazz (x)
fn library() -> Library {
    Library::new(vec![dir(
        "/Music",
        &["intro"],
        vec![
            dir("/Music/jazz", &["x"], vec![]),
            dir("/Music/rock", &["a", "b", "c"], vec![]),
        ],
    )])
}

fn app() -> App {
    App::new(library(), &PlaybackSettings::default())
}

/// Highlight `/Music/rock` in the sidebar and focus its songs.
fn open_rock(app: &mut App) {
    app.move_down();
    app.move_down();
    assert_eq!(app.shown_directory().unwrap().name, "rock");
    assert_eq!(app.activate(), None);
    assert_eq!(app.focus, Focus::Songs);
}

fn names(songs: &[Option<Arc<Song>>]) -> Vec<String> {
    songs
        .iter()
        .map(|s| s.as_ref().map_or("-".to_string(), |s| s.name.clone()))
        .collect()
}

#[test]
fn sidebar_is_the_tree_flattened_pre_order() {
    let app = app();
    let rows: Vec<_> = app
        .sidebar()
        .iter()
        .map(|r| (r.depth, r.name.as_str(), r.song_count))
        .collect();
    assert_eq!(rows, vec![(0, "Music", 1), (1, "jazz", 1), (1, "rock", 3)]);
}

#[test]
fn sidebar_movement_wraps_and_resets_song_cursor() {
    let mut app = app();
    app.song_selected = 0;
    app.move_up();
    assert_eq!(app.shown_directory().unwrap().name, "rock");
    app.move_down();
    assert_eq!(app.shown_directory().unwrap().name, "Music");
    assert_eq!(app.song_selected, 0);
}

#[test]
fn enter_on_song_plays_it_and_queues_its_directory() {
    let mut app = app();
    open_rock(&mut app);
    app.move_down();

    let played = app.activate().unwrap();
    assert_eq!(played.name, "b");

    let next = app.next_song().unwrap();
    assert_eq!(next.name, "c");
    assert_eq!(app.selected_song().unwrap().name, "c");
}

#[test]
fn next_and_previous_wrap_within_the_queue() {
    let mut app = app();
    open_rock(&mut app);
    app.activate();

    let forward = [app.next_song(), app.next_song(), app.next_song()];
    assert_eq!(names(&forward), vec!["b", "c", "a"]);
    let back = [app.prev_song(), app.prev_song()];
    assert_eq!(names(&back), vec!["c", "b"]);
}

#[test]
fn queue_survives_browsing_other_directories() {
    let mut app = app();
    open_rock(&mut app);
    app.activate();

    app.focus_sidebar();
    app.move_up();
    assert_eq!(app.shown_directory().unwrap().name, "jazz");

    assert_eq!(app.next_song().unwrap().name, "b");
}

#[test]
fn next_without_queue_starts_the_shown_directory() {
    let mut app = app();
    app.move_down();
    app.move_down();
    assert_eq!(app.next_song().unwrap().name, "a");

    let mut app = self::app();
    app.move_down();
    app.move_down();
    assert_eq!(app.prev_song().unwrap().name, "c");
}

#[test]
fn next_with_nothing_to_play_is_none() {
    let mut app = App::new(Library::default(), &PlaybackSettings::default());
    assert!(app.next_song().is_none());
    assert!(app.prev_song().is_none());
    assert!(app.activate().is_none());
    app.move_down();
    app.move_up();
    assert!(app.shown_directory().is_none());
}

#[test]
fn song_end_repeats_then_autoplays_then_stops() {
    let mut app = app();
    open_rock(&mut app);
    let a = app.activate().unwrap();

    app.repeat = true;
    assert_eq!(app.on_song_ended(&a).unwrap().name, "a");

    app.toggle_repeat();
    assert!(app.autoplay);
    assert_eq!(app.on_song_ended(&a).unwrap().name, "b");

    app.toggle_autoplay();
    assert!(app.on_song_ended(&a).is_none());
}

#[test]
fn toggles_start_from_configured_values() {
    let settings = PlaybackSettings {
        volume: 0.5,
        autoplay: false,
        repeat: true,
    };
    let app = App::new(library(), &settings);
    assert!(!app.autoplay);
    assert!(app.repeat);
}

#[test]
fn engine_events_drive_transport_state() {
    let mut app = app();
    let a = song("/Music/rock", "a");

    app.apply_event(&Event::PlaybackResumed);
    assert_eq!(app.transport, Transport::Stopped);

    app.apply_event(&Event::SongChanged { song: a.clone() });
    assert_eq!(app.transport, Transport::Playing);
    assert_eq!(app.now_playing.as_ref().unwrap().name, "a");

    app.apply_event(&Event::PlaybackPaused { stopped: false });
    assert_eq!(app.transport, Transport::Paused);
    app.apply_event(&Event::PlaybackResumed);
    assert_eq!(app.transport, Transport::Playing);

    app.apply_event(&Event::PlaybackPaused { stopped: true });
    assert_eq!(app.transport, Transport::Stopped);
    assert!(app.now_playing.is_none());
}

#[test]
fn progress_for_a_replaced_song_is_ignored() {
    let mut app = app();
    let a = song("/Music/rock", "a");
    let b = song("/Music/rock", "b");
    app.apply_event(&Event::SongChanged { song: b.clone() });

    app.apply_event(&Event::ProgressUpdated {
        current: Duration::from_secs(50),
        total: Duration::from_secs(60),
        song: a,
    });
    assert_eq!(app.elapsed, Duration::ZERO);

    app.apply_event(&Event::ProgressUpdated {
        current: Duration::from_secs(15),
        total: Duration::from_secs(60),
        song: b,
    });
    assert_eq!(app.elapsed, Duration::from_secs(15));
    assert!((app.progress_ratio() - 0.25).abs() < 1e-9);
}

#[test]
fn volume_event_updates_display_level() {
    let mut app = app();
    app.apply_event(&Event::VolumeChanged { level: 0.75 });
    assert_eq!(app.volume, 0.75);
}

#[test]
fn rescan_keeps_selected_directory_and_queue() {
    let mut app = app();
    open_rock(&mut app);
    app.activate();

    let bigger = Library::new(vec![dir(
        "/Music",
        &["intro"],
        vec![
            dir("/Music/blues", &["y"], vec![]),
            dir("/Music/jazz", &["x"], vec![]),
            dir("/Music/rock", &["a", "b", "c"], vec![]),
        ],
    )]);
    app.set_library(bigger);

    assert_eq!(app.sidebar().len(), 4);
    assert_eq!(app.shown_directory().unwrap().name, "rock");
    assert_eq!(app.next_song().unwrap().name, "b");
}

#[test]
fn rescan_dropping_the_selected_directory_falls_back_to_the_top() {
    let mut app = app();
    open_rock(&mut app);
    app.move_down();
    app.move_down();

    app.set_library(Library::new(vec![dir("/Other", &["z"], vec![])]));

    assert_eq!(app.sidebar_selected, 0);
    assert_eq!(app.song_selected, 0);
    assert_eq!(app.shown_directory().unwrap().name, "Other");
}
