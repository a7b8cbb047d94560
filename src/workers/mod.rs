// Worker functionality for snapshot refresh.

pub mod backoff;
pub mod refresher;

// Re-export main types
pub use backoff::Backoff;
pub use refresher::{Refresher, Stats};
