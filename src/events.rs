//! Publish/subscribe event bus decoupling the playback engine from the UI.

mod bus;
mod types;

pub use bus::{EventBus, Subscription};
pub use types::{Event, EventKind};

#[cfg(test)]
mod tests;
