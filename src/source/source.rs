// Package source defines the bulk-read contract of record data sources.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("data source timed out after {0:?}")]
    Timeout(Duration),
    #[error("data source is unavailable: {0}")]
    Unavailable(String),
    #[error("data source responded with status {0}")]
    Status(u16),
    #[error("unable to decode records: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unable to read records: {0}")]
    Io(#[from] std::io::Error),
}

/// DataSource provides the authoritative record collection.
///
/// A single call is one round-trip bulk read. Implementations own the bound
/// on how long a call may take.
#[async_trait::async_trait]
pub trait DataSource<R>: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Reads all current records.
    async fn fetch_all(&self) -> Result<Vec<R>, FetchError>;
}
