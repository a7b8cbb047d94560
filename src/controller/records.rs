// Package api provides read access to the published snapshot.

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::controller::{message, unavailable, Controller};
use crate::cache::SnapshotCache;
use crate::model::Identified;

pub const RECORDS_PATH: &str = "/api/v1/records";

/// RecordsController renders the current snapshot, never touching the data source.
pub struct RecordsController<R> {
    cache: Arc<SnapshotCache<R>>,
}

impl<R> RecordsController<R>
where
    R: Identified + Serialize + Send + Sync + 'static,
{
    /// Creates a new records controller.
    pub fn new(cache: Arc<SnapshotCache<R>>) -> Self {
        Self { cache }
    }

    /// Handles the list request.
    async fn list(&self) -> Response {
        match self.cache.snapshot() {
            Ok(snapshot) => (StatusCode::OK, Json(snapshot.records())).into_response(),
            Err(e) => unavailable(&e),
        }
    }

    /// Handles the single record request.
    async fn get(&self, id: String) -> Response {
        let snapshot = match self.cache.snapshot() {
            Ok(s) => s,
            Err(e) => return unavailable(&e),
        };

        match snapshot.find(&id) {
            Some(record) => (StatusCode::OK, Json(record)).into_response(),
            None => message(StatusCode::NOT_FOUND, "Record not found"),
        }
    }
}

impl<R> Controller for RecordsController<R>
where
    R: Identified + Serialize + Send + Sync + 'static,
{
    fn add_route(&self, router: Router) -> Router {
        let list_controller = self.clone();
        let get_controller = self.clone();
        let list = get(move || {
            let controller = list_controller.clone();
            async move { controller.list().await }
        });
        router
            .route(RECORDS_PATH, list.clone())
            // Clients of the previous service call the listing with a trailing slash.
            .route(&format!("{}/", RECORDS_PATH), list)
            .route(
                &format!("{}/:id", RECORDS_PATH),
                get(move |Path(id): Path<String>| {
                    let controller = get_controller.clone();
                    async move { controller.get(id).await }
                }),
            )
    }
}

impl<R> Clone for RecordsController<R> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}
