//! Snapshot refresh worker.

pub mod counters;
pub mod refresher;

// Re-export main types
pub use counters::{Counters, Stats};
pub use refresher::Refresher;
