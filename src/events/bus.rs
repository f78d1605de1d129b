use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::{trace, warn};

use super::types::{Event, EventKind};

/// Default mailbox capacity per subscription.
pub const DEFAULT_CAPACITY: usize = 100;
/// Default mailbox capacity for `SongEnded` subscriptions. A lost `SongEnded`
/// stalls autoplay, so its mailboxes are sized well past anything a live
/// subscriber falls behind by.
pub const SONG_ENDED_CAPACITY: usize = 1024;

struct Mailbox {
    id: u64,
    tx: Sender<Event>,
}

struct BusInner {
    topics: RwLock<HashMap<EventKind, Vec<Mailbox>>>,
    next_id: AtomicU64,
    capacity: usize,
    song_ended_capacity: usize,
}

impl BusInner {
    fn remove(&self, kind: EventKind, id: u64) {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(mailboxes) = topics.get_mut(&kind) {
            mailboxes.retain(|m| m.id != id);
        }
    }
}

/// In-process publish/subscribe hub keyed by [`EventKind`].
///
/// Each subscription owns a bounded mailbox. `publish` never blocks: when a
/// subscriber's mailbox is full, that subscriber misses the event. Cloning the
/// bus yields another handle to the same hub.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, SONG_ENDED_CAPACITY)
    }

    pub fn with_capacity(capacity: usize, song_ended_capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                topics: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                capacity: capacity.max(1),
                song_ended_capacity: song_ended_capacity.max(1),
            }),
        }
    }

    /// Subscribe to `kind` with the bus's default mailbox size for that kind.
    pub fn subscribe(&self, kind: EventKind) -> Subscription {
        let capacity = match kind {
            EventKind::SongEnded => self.inner.song_ended_capacity,
            _ => self.inner.capacity,
        };
        self.subscribe_with_capacity(kind, capacity)
    }

    pub fn subscribe_with_capacity(&self, kind: EventKind, capacity: usize) -> Subscription {
        let (tx, rx) = bounded(capacity.max(1));
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        self.inner
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(Mailbox { id, tx });

        Subscription {
            kind,
            id,
            rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a subscription. Equivalent to dropping it.
    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Deliver `event` to every current subscriber of its kind.
    pub fn publish(&self, event: Event) {
        let kind = event.kind();
        let topics = self
            .inner
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(mailboxes) = topics.get(&kind) else {
            return;
        };

        for mailbox in mailboxes {
            match mailbox.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) if kind == EventKind::SongEnded => {
                    warn!(subscriber = mailbox.id, "SongEnded mailbox full, event dropped");
                }
                Err(TrySendError::Full(_)) => {
                    trace!(subscriber = mailbox.id, ?kind, "mailbox full, event dropped");
                }
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.inner
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

/// A live subscription to one [`EventKind`]. Dropping it unsubscribes.
pub struct Subscription {
    kind: EventKind,
    id: u64,
    rx: Receiver<Event>,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[cfg(test)]
    pub fn try_recv(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<Event> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Everything currently queued, oldest first.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.kind, self.id);
        }
    }
}
