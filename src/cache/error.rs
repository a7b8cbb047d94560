// Errors returned by the snapshot cache lifecycle.

use std::time::Duration;

/// LifecycleError reports misuse of the cache or a failed shutdown.
///
/// Reads on a running cache never fail; these errors only come from operating
/// on a cache that was never started or was already shut down, and from a
/// refresher that did not exit cleanly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("snapshot cache is not started")]
    NotStarted,
    #[error("snapshot cache is shut down")]
    ShutDown,
    #[error("refresher exited unexpectedly")]
    WorkerExited,
    #[error("refresher did not stop within {0:?}")]
    ShutdownTimeout(Duration),
    #[error("refresher exited abnormally: {0}")]
    WorkerFailed(String),
}
