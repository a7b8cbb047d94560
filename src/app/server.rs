// HTTP exposure of the snapshot cache.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::cache::SnapshotCache;
use crate::config::{Config, ConfigTrait};
use crate::controller;
use crate::http::{Controller, Middleware};
use crate::middleware::{
    cors_middleware::CorsMiddleware, recover_middleware::PanicRecoverMiddleware,
    trace_middleware::TraceMiddleware,
};
use crate::model::Identified;

/// HTTP server implementation that wraps the cache endpoints.
pub struct HttpServer {
    server: Arc<crate::http::HttpServer>,
}

impl HttpServer {
    /// Creates a new HttpServer with all controllers and middlewares.
    pub fn new<R>(
        ctx: CancellationToken,
        cfg: &Config,
        cache: Arc<SnapshotCache<R>>,
    ) -> Result<Self>
    where
        R: Identified + Serialize + Send + Sync + 'static,
    {
        let server = crate::http::HttpServer::new(
            ctx,
            cfg.api(),
            Self::controllers(cache),
            Self::middlewares(cfg),
        )?;

        Ok(Self { server })
    }

    /// Starts the HTTP server on the configured port (blocking call).
    pub async fn listen_and_serve(&self) -> Result<()> {
        self.server.listen_and_serve().await
    }

    /// Starts the HTTP server on a bound listener (blocking call).
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        self.server.serve(listener).await
    }

    /// Returns all HTTP controllers for the server.
    fn controllers<R>(cache: Arc<SnapshotCache<R>>) -> Vec<Box<dyn Controller>>
    where
        R: Identified + Serialize + Send + Sync + 'static,
    {
        vec![
            // Healthcheck probe endpoint
            Box::new(controller::LivenessProbeController::new(cache.clone())),
            // Metrics endpoint
            Box::new(controller::PrometheusMetricsController::new()),
            // Records read from the current snapshot
            Box::new(controller::RecordsController::new(cache.clone())),
            // Snapshot metadata and manual refresh trigger
            Box::new(controller::SnapshotController::new(cache)),
        ]
    }

    /// Returns the request middlewares for the server, executed in reverse order.
    fn middlewares(cfg: &Config) -> Vec<Box<dyn Middleware>> {
        vec![
            // Exec first - cors headers, on every response including recovered panics
            Box::new(CorsMiddleware::new(cfg.api())),
            // Exec second - panic recovery
            Box::new(PanicRecoverMiddleware::new()),
            // Exec third - request tracing
            Box::new(TraceMiddleware::new()),
        ]
    }
}
