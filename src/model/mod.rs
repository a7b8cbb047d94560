// Package model provides the record and snapshot models.

pub mod record;
pub mod snapshot;

// Re-export main types
pub use record::{Identified, Record};
pub use snapshot::Snapshot;
