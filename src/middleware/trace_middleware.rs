//! Request logging middleware.
//

use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// TraceMiddleware logs every request with its status and latency.
pub struct TraceMiddleware;

impl TraceMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TraceMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::middleware::middleware::Middleware for TraceMiddleware {
    fn apply(&self, router: axum::Router) -> axum::Router {
        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
    }
}
