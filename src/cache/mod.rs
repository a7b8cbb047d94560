//! Snapshot cache lifecycle.

pub mod cache;
pub mod error;

// Re-export main types
pub use cache::{SnapshotCache, State, SVC_REFRESHER};
pub use error::LifecycleError;
