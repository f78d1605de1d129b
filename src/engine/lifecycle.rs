use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::info;

struct Inner {
    cancelled: AtomicBool,
    /// Dropped on cancel, which disconnects `done` for every waiter at once.
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

/// Cancellable lifecycle shared by the engine loops and whoever owns them.
///
/// Clones observe the same cancellation. Nothing is ever sent on the `done`
/// channel: it becomes ready (disconnected) once [`Lifecycle::cancel`] runs,
/// so it can sit in a `select!` next to a mailbox or ticker.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(tx)),
                done: rx,
            }),
        }
    }

    /// Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            info!("lifecycle cancelled");
        }
        self.inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }
}
