// HTTP controller trait for route registration.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};

use crate::cache::LifecycleError;

/// Trait for adding routes to the HTTP server.
pub trait Controller: Send + Sync {
    /// Adds routes to the router.
    ///
    /// Commonly may be represented as:
    /// ```rust
    /// # use axum::{Router, routing::get};
    /// # async fn handler() -> &'static str { "ok" }
    /// let router: Router<()> = Router::new().route("/path", get(handler));
    /// # let _ = router;
    /// ```
    fn add_route(&self, router: Router) -> Router;
}

/// Renders a `{"status": .., "message": ..}` JSON body.
pub fn message(status: StatusCode, msg: &str) -> Response {
    let body = serde_json::json!({
        "status": status.as_u16(),
        "message": msg,
    });
    (
        status,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body.to_string(),
    )
        .into_response()
}

/// Maps a cache that is not serving to 503.
pub fn unavailable(err: &LifecycleError) -> Response {
    message(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
}
