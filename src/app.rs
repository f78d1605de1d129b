//! Application module: exposes the presentation model used by the TUI and
//! runtime.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
