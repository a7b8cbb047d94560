// Main snapcache application implementation.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cache::SnapshotCache;
use crate::config::{Config, ConfigTrait};
use crate::model::Record;
use crate::source::{self, DataSource};

use super::server::HttpServer;

/// Encapsulates the entire application state.
pub struct App {
    shutdown_token: CancellationToken,
    cache: Arc<SnapshotCache<Record>>,
    server: Arc<HttpServer>,
}

impl App {
    /// Creates a new application reading records from the configured source.
    pub fn new(shutdown_token: CancellationToken, cfg: Config) -> Result<Self> {
        let source_cfg = cfg
            .source()
            .context("source configuration is required")?;
        let source = source::from_cfg::<Record>(source_cfg)
            .context("failed to build data source")?;

        Self::with_source(shutdown_token, cfg, source)
    }

    /// Creates a new application on top of an explicit data source.
    pub fn with_source(
        shutdown_token: CancellationToken,
        cfg: Config,
        source: Arc<dyn DataSource<Record>>,
    ) -> Result<Self> {
        info!(
            component = "app",
            event = "source_selected",
            source = source.name(),
            "data source selected"
        );

        let cache = SnapshotCache::new(cfg.refresh().clone(), source);
        let server = Arc::new(HttpServer::new(shutdown_token.clone(), &cfg, cache.clone())?);

        Ok(Self {
            shutdown_token,
            cache,
            server,
        })
    }

    /// Returns the snapshot cache.
    pub fn cache(&self) -> Arc<SnapshotCache<Record>> {
        self.cache.clone()
    }

    /// Starts the cache and serves HTTP on the configured port in background.
    pub async fn serve(&self, gsh: Arc<crate::shutdown::GracefulShutdown>) -> Result<()> {
        self.run(None, gsh).await
    }

    /// Starts the cache and serves HTTP on the given listener in background.
    pub async fn serve_on(
        &self,
        listener: TcpListener,
        gsh: Arc<crate::shutdown::GracefulShutdown>,
    ) -> Result<()> {
        self.run(Some(listener), gsh).await
    }

    async fn run(
        &self,
        listener: Option<TcpListener>,
        gsh: Arc<crate::shutdown::GracefulShutdown>,
    ) -> Result<()> {
        self.cache
            .start()
            .await
            .context("failed to start snapshot cache")?;

        let server = self.server.clone();
        let app_for_close = self.clone();

        gsh.add(1);
        tokio::task::spawn(async move {
            let served = match listener {
                Some(listener) => server.serve(listener).await,
                None => server.listen_and_serve().await,
            };
            if let Err(e) = served {
                error!(
                    component = "app",
                    scope = "server",
                    event = "serve_failed",
                    error = %e,
                    "server failed to serve"
                );
            }

            if let Err(e) = app_for_close.close().await {
                error!(
                    component = "app",
                    scope = "shutdown",
                    event = "close_failed",
                    error = %e,
                    "application close failed"
                );
            }

            gsh.done();
        });

        info!(component = "app", event = "started", "application lifecycle");

        Ok(())
    }

    /// Stops HTTP first, then the snapshot cache.
    pub async fn close(&self) -> Result<()> {
        self.shutdown_token.cancel();

        if let Err(e) = self.cache.shutdown().await {
            error!(
                component = "app",
                scope = "cache",
                event = "close_failed",
                error = %e,
                "error closing snapshot cache"
            );
        }

        info!(component = "app", event = "stopped", "application lifecycle");

        Ok(())
    }
}

impl Clone for App {
    fn clone(&self) -> Self {
        Self {
            shutdown_token: self.shutdown_token.clone(),
            cache: self.cache.clone(),
            server: self.server.clone(),
        }
    }
}
