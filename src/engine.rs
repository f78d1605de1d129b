//! The playback engine: single owner of the active stream and of playback
//! state, driven by a serialized command loop and a periodic progress loop.

mod lifecycle;
mod player;
mod state;
mod worker;

pub use lifecycle::Lifecycle;
pub use player::Player;
pub use state::{DEFAULT_VOLUME, StatusSnapshot};
pub use worker::Backend;
