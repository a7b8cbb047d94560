//! HTTP server implementation.
//

use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use crate::config::Api;
use crate::controller::controller::Controller;
use crate::middleware::middleware::Middleware;

const DEFAULT_NAME: &str = "snapcache";
const DEFAULT_PORT: &str = "8020";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP server implementation.
pub struct HttpServer {
    shutdown_token: CancellationToken,
    name: String,
    port: String,
    router: Router,
}

impl HttpServer {
    /// Creates a new HTTP server.
    pub fn new(
        shutdown_token: CancellationToken,
        api: Option<&Api>,
        controllers: Vec<Box<dyn Controller>>,
        middlewares: Vec<Box<dyn Middleware>>,
    ) -> Result<Arc<Self>> {
        let router = Self::build_router(controllers);
        let router = Self::merge_middlewares(router, middlewares);

        let name = api
            .and_then(|a| a.name.clone())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());
        let port = api
            .and_then(|a| a.port.as_deref())
            .unwrap_or(DEFAULT_PORT)
            .trim_start_matches(':')
            .to_string();

        Ok(Arc::new(Self {
            shutdown_token,
            name,
            port,
            router,
        }))
    }

    /// Returns the address the server binds to.
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("0.0.0.0:{}", self.port)
            .parse()
            .context("Failed to parse server address")
    }

    /// Binds the configured port and serves until the shutdown token fires.
    pub async fn listen_and_serve(&self) -> Result<()> {
        let addr = self.addr()?;
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind TCP listener on {}", addr))?;

        self.serve(listener).await
    }

    /// Serves on an already bound listener until the shutdown token fires.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr().ok();

        info!(
            component = "server",
            event = "started",
            name = %self.name,
            addr = ?local_addr,
            "server started"
        );

        let shutdown_token = self.shutdown_token.clone();
        let serve_future =
            axum::serve(listener, self.router.clone()).with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
            });

        if let Err(e) = serve_future.await {
            error!(
                component = "server",
                event = "listen_and_serve_failed",
                name = %self.name,
                addr = ?local_addr,
                error = %e,
                "server failed to listen and serve"
            );
            return Err(e.into());
        }

        info!(
            component = "server",
            event = "stopped",
            name = %self.name,
            addr = ?local_addr,
            "server stopped"
        );

        Ok(())
    }

    /// Builds the router with all controllers.
    fn build_router(controllers: Vec<Box<dyn Controller>>) -> Router {
        let mut router = Router::new();

        for controller in controllers {
            router = controller.add_route(router);
        }

        router
    }

    /// Merges middlewares into the router.
    fn merge_middlewares(router: Router, middlewares: Vec<Box<dyn Middleware>>) -> Router {
        let mut result = router;

        // Apply middlewares in reverse order (first middleware wraps all others)
        for middleware in middlewares.iter().rev() {
            result = middleware.apply(result);
        }

        result.layer(TimeoutLayer::new(REQUEST_TIMEOUT))
    }
}
