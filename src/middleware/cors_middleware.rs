//! CORS header middleware.
//

use axum::{
    http::{header, HeaderValue},
    response::Response,
};
use tracing::warn;

use crate::config::Api;

const ANY_ORIGIN: &str = "*";

/// CorsMiddleware sets Access-Control-Allow-Origin on every response.
pub struct CorsMiddleware {
    origin: HeaderValue,
}

impl CorsMiddleware {
    /// Creates a new CORS middleware; the origin defaults to `*`.
    pub fn new(cfg: Option<&Api>) -> Self {
        let raw = cfg.and_then(|a| a.cors.as_deref()).unwrap_or(ANY_ORIGIN);
        let origin = HeaderValue::from_str(raw).unwrap_or_else(|e| {
            warn!(
                component = "http",
                event = "invalid_cors_origin",
                origin = raw,
                error = %e,
                "invalid cors origin, falling back to '*'"
            );
            HeaderValue::from_static(ANY_ORIGIN)
        });
        Self { origin }
    }
}

impl crate::middleware::middleware::Middleware for CorsMiddleware {
    fn apply(&self, router: axum::Router) -> axum::Router {
        let origin = self.origin.clone();
        router.layer(axum::middleware::map_response(move |mut res: Response| {
            let origin = origin.clone();
            async move {
                res.headers_mut()
                    .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
                res
            }
        }))
    }
}
