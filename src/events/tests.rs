use super::*;
use crate::library::Song;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn volume(level: f64) -> Event {
    Event::VolumeChanged { level }
}

#[test]
fn subscriber_receives_only_its_kind() {
    let bus = EventBus::new();
    let volumes = bus.subscribe(EventKind::VolumeChanged);
    let pauses = bus.subscribe(EventKind::PlaybackPaused);

    bus.publish(volume(0.3));
    bus.publish(Event::PlaybackResumed);

    assert_eq!(volumes.drain(), vec![volume(0.3)]);
    assert!(pauses.try_recv().is_none());
}

#[test]
fn every_subscriber_of_a_kind_gets_the_event() {
    let bus = EventBus::new();
    let a = bus.subscribe(EventKind::SongChanged);
    let b = bus.subscribe(EventKind::SongChanged);
    let song = Arc::new(Song::new("/m/a.mp3"));

    bus.publish(Event::SongChanged { song: song.clone() });

    for sub in [&a, &b] {
        match sub.try_recv() {
            Some(Event::SongChanged { song: got }) => assert_eq!(got.path, song.path),
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn no_replay_for_late_subscribers() {
    let bus = EventBus::new();
    bus.publish(volume(0.1));
    let late = bus.subscribe(EventKind::VolumeChanged);
    assert!(late.try_recv().is_none());
    bus.publish(volume(0.2));
    assert_eq!(late.drain(), vec![volume(0.2)]);
}

#[test]
fn full_mailbox_drops_without_blocking_and_keeps_order() {
    let bus = EventBus::new();
    let slow = bus.subscribe_with_capacity(EventKind::VolumeChanged, 2);
    let roomy = bus.subscribe_with_capacity(EventKind::VolumeChanged, 10);

    for i in 0..5 {
        bus.publish(volume(f64::from(i) / 10.0));
    }

    assert_eq!(slow.drain(), vec![volume(0.0), volume(0.1)]);
    assert_eq!(roomy.drain().len(), 5);
}

#[test]
fn song_ended_subscriptions_get_the_larger_mailbox() {
    let bus = EventBus::with_capacity(1, 8);
    let ended = bus.subscribe(EventKind::SongEnded);
    let progress = bus.subscribe(EventKind::ProgressUpdated);
    let song = Arc::new(Song::new("/m/a.mp3"));

    for _ in 0..8 {
        bus.publish(Event::SongEnded { song: song.clone() });
        bus.publish(Event::ProgressUpdated {
            current: Duration::ZERO,
            total: Duration::from_secs(1),
            song: song.clone(),
        });
    }

    assert_eq!(ended.drain().len(), 8);
    assert_eq!(progress.drain().len(), 1);
}

#[test]
fn dropping_a_subscription_unsubscribes() {
    let bus = EventBus::new();
    let a = bus.subscribe(EventKind::PlaybackPaused);
    let b = bus.subscribe(EventKind::PlaybackPaused);
    assert_eq!(bus.subscriber_count(EventKind::PlaybackPaused), 2);

    drop(a);
    assert_eq!(bus.subscriber_count(EventKind::PlaybackPaused), 1);
    bus.unsubscribe(b);
    assert_eq!(bus.subscriber_count(EventKind::PlaybackPaused), 0);

    // Publishing with no subscribers is a no-op.
    bus.publish(Event::PlaybackPaused { stopped: true });
}

#[test]
fn subscription_outliving_the_bus_is_harmless() {
    let bus = EventBus::new();
    let sub = bus.subscribe(EventKind::VolumeChanged);
    drop(bus);
    assert!(sub.try_recv().is_none());
    drop(sub);
}

#[test]
fn concurrent_publishers_and_subscribers() {
    let bus = EventBus::new();
    let sub = bus.subscribe_with_capacity(EventKind::VolumeChanged, 1000);

    let publishers: Vec<_> = (0..4)
        .map(|_| {
            let bus = bus.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    bus.publish(volume(0.5));
                }
            })
        })
        .collect();
    let churn = {
        let bus = bus.clone();
        thread::spawn(move || {
            for _ in 0..100 {
                let s = bus.subscribe(EventKind::VolumeChanged);
                drop(s);
            }
        })
    };

    for p in publishers {
        p.join().unwrap();
    }
    churn.join().unwrap();

    assert_eq!(sub.drain().len(), 400);
    assert_eq!(bus.subscriber_count(EventKind::VolumeChanged), 1);
}

#[test]
fn event_kind_matches_variant() {
    let song = Arc::new(Song::new("/m/a.mp3"));
    let all = [
        Event::SongChanged { song: song.clone() },
        Event::PlaybackResumed,
        Event::PlaybackPaused { stopped: false },
        Event::SongEnded { song: song.clone() },
        Event::ProgressUpdated {
            current: Duration::ZERO,
            total: Duration::ZERO,
            song,
        },
        volume(1.0),
    ];
    let kinds: Vec<EventKind> = all.iter().map(Event::kind).collect();
    assert_eq!(kinds, EventKind::ALL.to_vec());
}
