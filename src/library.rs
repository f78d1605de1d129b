//! Music library: the directory/song tree and the scanner that builds it.
//!
//! The tree is immutable once scanned; a rescan replaces it wholesale.

mod manager;
mod model;
mod scan;

pub use manager::LibraryManager;
pub use model::{Directory, Library, Song};
pub use scan::scan;
