// Package api provides liveness probe controller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use super::controller::Controller;
use crate::cache::SnapshotCache;

pub const PROBE_PATH: &str = "/k8s/probe";

const SUCCESS_RESPONSE: &str = r#"{
  "status": 200,
  "message": "I'm fine :D"
}"#;

const FAILED_RESPONSE: &str = r#"{
  "status": 503,
  "message": "I'm tired :("
}"#;

/// Liveness reports whether a service is able to serve.
pub trait Liveness: Send + Sync {
    fn is_alive(&self) -> bool;
}

impl<R> Liveness for SnapshotCache<R>
where
    R: Send + Sync + 'static,
{
    fn is_alive(&self) -> bool {
        self.is_running()
    }
}

/// LivenessProbeController handles Kubernetes liveness probes.
pub struct LivenessProbeController {
    probe: Arc<dyn Liveness>,
}

impl LivenessProbeController {
    /// Creates a new liveness probe controller.
    pub fn new(probe: Arc<dyn Liveness>) -> Self {
        Self { probe }
    }

    /// Handles the probe request.
    async fn probe(&self) -> Response {
        if self.probe.is_alive() {
            (StatusCode::OK, SUCCESS_RESPONSE).into_response()
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, FAILED_RESPONSE).into_response()
        }
    }
}

impl Controller for LivenessProbeController {
    fn add_route(&self, router: Router) -> Router {
        let probe_controller = self.clone();
        router.route(
            PROBE_PATH,
            get(move || {
                let controller = probe_controller.clone();
                async move { controller.probe().await }
            }),
        )
    }
}

impl Clone for LivenessProbeController {
    fn clone(&self) -> Self {
        Self {
            probe: self.probe.clone(),
        }
    }
}
