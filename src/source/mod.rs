// Package source provides the data sources the refresher reads from.

pub mod file;
pub mod http;
pub mod source;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::{Source, SourceKind};

// Re-export main types
pub use file::FileSource;
pub use http::HttpSource;
pub use source::{DataSource, FetchError};

/// Builds the data source described by the `source` config section.
pub fn from_cfg<R>(cfg: &Source) -> Result<Arc<dyn DataSource<R>>>
where
    R: DeserializeOwned + Send + 'static,
{
    cfg.validate()?;
    match cfg.kind {
        SourceKind::Http => {
            let url = cfg.url.as_deref().context("source.url is required")?;
            Ok(Arc::new(HttpSource::new(url, cfg.timeout)?))
        }
        SourceKind::File => {
            let path = cfg.path.as_deref().context("source.path is required")?;
            Ok(Arc::new(FileSource::new(path, cfg.timeout)))
        }
    }
}
