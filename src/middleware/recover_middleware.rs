//! Panic recovery middleware.
//

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

const INTERNAL_ERROR_RESPONSE: &str = r#"{"status":500,"message":"Internal Server Error"}"#;

/// Global panic counter.
static PANICS_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Gets the current panic counter value.
pub fn panics_counter() -> u64 {
    PANICS_COUNTER.load(Ordering::Relaxed)
}

fn on_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    PANICS_COUNTER.fetch_add(1, Ordering::Relaxed);

    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(
        component = "http",
        event = "handler_panicked",
        details = %details,
        "recovered from handler panic"
    );

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        INTERNAL_ERROR_RESPONSE,
    )
        .into_response()
}

/// PanicRecoverMiddleware turns handler panics into 500 responses.
pub struct PanicRecoverMiddleware;

impl PanicRecoverMiddleware {
    /// Creates a new panic recovery middleware.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PanicRecoverMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::middleware::middleware::Middleware for PanicRecoverMiddleware {
    fn apply(&self, router: axum::Router) -> axum::Router {
        router.layer(CatchPanicLayer::custom(on_panic))
    }
}
