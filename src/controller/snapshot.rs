// Package api provides snapshot inspection and manual refresh endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::controller::{message, unavailable, Controller};
use crate::cache::{SnapshotCache, State};

pub const SNAPSHOT_PATH: &str = "/snapcache/snapshot";
pub const REFRESH_PATH: &str = "/snapcache/refresh";

#[derive(Debug, Serialize)]
struct SnapshotMeta {
    state: State,
    version: u64,
    records: usize,
    refreshed_at: Option<DateTime<Utc>>,
    delay: String,
    delay_secs: f64,
    successes: i64,
    errors: i64,
    consecutive_errors: i64,
}

/// SnapshotController exposes snapshot metadata and the refresh trigger.
pub struct SnapshotController<R> {
    cache: Arc<SnapshotCache<R>>,
}

impl<R> SnapshotController<R>
where
    R: Send + Sync + 'static,
{
    /// Creates a new snapshot controller.
    pub fn new(cache: Arc<SnapshotCache<R>>) -> Self {
        Self { cache }
    }

    async fn meta(&self) -> Response {
        let (snapshot, stats) = match (self.cache.snapshot(), self.cache.stats()) {
            (Ok(snapshot), Ok(stats)) => (snapshot, stats),
            (Err(e), _) | (_, Err(e)) => return unavailable(&e),
        };

        let meta = SnapshotMeta {
            state: self.cache.state(),
            version: snapshot.version(),
            records: snapshot.len(),
            refreshed_at: snapshot.refreshed_at(),
            delay: humantime::format_duration(stats.delay).to_string(),
            delay_secs: stats.delay.as_secs_f64(),
            successes: stats.successes,
            errors: stats.errors,
            consecutive_errors: stats.consecutive_errors,
        };

        (StatusCode::OK, Json(meta)).into_response()
    }

    async fn refresh(&self) -> Response {
        match self.cache.trigger_refresh() {
            Ok(()) => message(StatusCode::ACCEPTED, "Refresh scheduled"),
            Err(e) => unavailable(&e),
        }
    }
}

impl<R> Controller for SnapshotController<R>
where
    R: Send + Sync + 'static,
{
    fn add_route(&self, router: Router) -> Router {
        let meta_controller = self.clone();
        let refresh_controller = self.clone();
        router
            .route(
                SNAPSHOT_PATH,
                get(move || {
                    let controller = meta_controller.clone();
                    async move { controller.meta().await }
                }),
            )
            .route(
                REFRESH_PATH,
                post(move || {
                    let controller = refresh_controller.clone();
                    async move { controller.refresh().await }
                }),
            )
    }
}

impl<R> Clone for SnapshotController<R> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}
