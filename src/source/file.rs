//! Local JSON file data source, used for development and mock data.

use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

use super::{DataSource, FetchError};

/// FileSource reads the collection from a JSON array on disk on every fetch.
pub struct FileSource<R> {
    path: PathBuf,
    timeout: Duration,
    _records: PhantomData<fn() -> R>,
}

impl<R> FileSource<R> {
    pub fn new(path: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            timeout,
            _records: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<R> DataSource<R> for FileSource<R>
where
    R: DeserializeOwned + Send,
{
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_all(&self) -> Result<Vec<R>, FetchError> {
        let data = match timeout(self.timeout, tokio::fs::read(&self.path)).await {
            Ok(res) => res?,
            Err(_) => return Err(FetchError::Timeout(self.timeout)),
        };
        Ok(serde_json::from_slice(&data)?)
    }
}
