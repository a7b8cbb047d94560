// Snapshot storage functionality.

pub mod storage;


// Re-export main types
pub use storage::SnapshotStore;
