// Package refresher provides the background worker keeping the snapshot fresh.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::source::{DataSource, FetchError};
use crate::storage::SnapshotStore;
use crate::workers::Backoff;

use super::counters::{Counters, Stats};

const COMPONENT: &str = "refresher";

/// Refresher polls the data source and installs successful reads into the store.
///
/// It is the only writer of the store. The poll delay follows `Backoff`: reset
/// to the minimum after a success, grown by the factor after a failure.
pub struct Refresher<R> {
    name: String,
    source: Arc<dyn DataSource<R>>,
    store: Arc<SnapshotStore<R>>,
    backoff: Mutex<Backoff>,
    counters: Counters,
    wake: Notify,
}

impl<R> Refresher<R>
where
    R: Send + Sync + 'static,
{
    /// Creates a new refresher.
    pub fn new(
        name: String,
        source: Arc<dyn DataSource<R>>,
        store: Arc<SnapshotStore<R>>,
        backoff: Backoff,
    ) -> Arc<Self> {
        let counters = Counters::new();
        counters.set_delay(backoff.current());

        Arc::new(Self {
            name,
            source,
            store,
            backoff: Mutex::new(backoff),
            counters,
            wake: Notify::new(),
        })
    }

    /// Returns the delay the worker waits before its next fetch.
    pub fn current_delay(&self) -> Duration {
        self.backoff.lock().current()
    }

    pub fn stats(&self) -> Stats {
        self.counters.stats()
    }

    /// Cuts the current wait short so the next fetch starts right away.
    ///
    /// A request made while a fetch is in flight ends the following wait.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Performs the initial synchronous fetch.
    ///
    /// A failure leaves the store at its empty default and does not touch the
    /// backoff; the worker starts polling at the minimum delay either way.
    pub async fn warm_up(&self) -> bool {
        match self.source.fetch_all().await {
            Ok(records) => {
                let len = records.len();
                let snapshot = self.store.replace(records);
                self.counters.on_success();
                metrics::on_refresh_success(len, snapshot.version());
                info!(
                    component = COMPONENT,
                    name = %self.name,
                    source = self.source.name(),
                    event = "warm_up_succeed",
                    records = len,
                    "records cache initiation succeed"
                );
                true
            }
            Err(e) => {
                self.counters.on_error();
                metrics::on_refresh_error();
                warn!(
                    component = COMPONENT,
                    name = %self.name,
                    source = self.source.name(),
                    event = "warm_up_failed",
                    error = %e,
                    "unable to init records cache, starting with an empty snapshot"
                );
                false
            }
        }
    }

    /// Runs the poll loop until `token` is cancelled.
    ///
    /// Cancellation preempts both the wait and an in-flight fetch; a fetch
    /// interrupted that way is discarded.
    pub async fn run(self: Arc<Self>, token: CancellationToken) {
        metrics::set_refresh_delay(self.current_delay());
        info!(
            component = COMPONENT,
            name = %self.name,
            event = "started",
            delay = ?self.current_delay(),
            "refresher started"
        );

        loop {
            let delay = self.current_delay();
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
                _ = self.wake.notified() => {
                    debug!(component = COMPONENT, name = %self.name, event = "woken", "refresh requested");
                }
            }

            let fetched = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                res = self.source.fetch_all() => res,
            };
            self.on_fetched(fetched);
        }

        info!(
            component = COMPONENT,
            name = %self.name,
            event = "stopped",
            "sync cache stopped"
        );
    }

    fn on_fetched(&self, fetched: Result<Vec<R>, FetchError>) {
        match fetched {
            Ok(records) => {
                let len = records.len();
                let snapshot = self.store.replace(records);
                let delay = self.backoff.lock().on_success();

                self.counters.on_success();
                self.counters.set_delay(delay);
                metrics::on_refresh_success(len, snapshot.version());
                metrics::set_refresh_delay(delay);

                debug!(
                    component = COMPONENT,
                    name = %self.name,
                    event = "refreshed",
                    records = len,
                    version = snapshot.version(),
                    next_delay = ?delay,
                    "snapshot refreshed"
                );
            }
            Err(e) => {
                let (delay, capped) = {
                    let mut backoff = self.backoff.lock();
                    let delay = backoff.on_failure();
                    (delay, backoff.is_saturated())
                };

                self.counters.on_error();
                self.counters.set_delay(delay);
                metrics::on_refresh_error();
                metrics::set_refresh_delay(delay);

                warn!(
                    component = COMPONENT,
                    name = %self.name,
                    source = self.source.name(),
                    event = "refresh_failed",
                    error = %e,
                    next_delay = ?delay,
                    capped,
                    "sync cache error, keeping the previous snapshot"
                );
            }
        }
    }
}
