//! Config file writes.
//!
//! Files are written to a sibling temporary file and renamed into place, so
//! nginx or PHP-FPM never read a half-written config. Snapshots let a
//! failed deploy put the previous bytes back.

mod atomic;

pub use atomic::{write_atomic, FileSnapshot};
