// Snapshot cache lifecycle: construction, warm-up, worker supervision, shutdown.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Refresh;
use crate::model::Snapshot;
use crate::source::DataSource;
use crate::storage::SnapshotStore;
use crate::workers::{Backoff, Refresher, Stats};

use super::LifecycleError;

const COMPONENT: &str = "snapshot-cache";
pub const SVC_REFRESHER: &str = "wrk-snapshot-refresher";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Idle,
    Running,
    /// The refresher exited on its own; the snapshot is no longer refreshed.
    Failed,
    Stopped,
}

struct Worker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// SnapshotCache owns the snapshot store and its single refresher.
///
/// It is built once by the composition root and shared by `Arc`. `start` is
/// idempotent: concurrent callers run one warm-up and one worker spawn between
/// them and all return once that instance is running. After `shutdown` every
/// operation fails with `LifecycleError::ShutDown`.
pub struct SnapshotCache<R> {
    cfg: Refresh,
    source: Arc<dyn DataSource<R>>,
    store: Arc<SnapshotStore<R>>,
    refresher: OnceCell<Arc<Refresher<R>>>,
    worker: Mutex<Option<Worker>>,
    stopped: AtomicBool,
}

impl<R> SnapshotCache<R>
where
    R: Send + Sync + 'static,
{
    /// Creates an idle cache holding the empty snapshot.
    pub fn new(cfg: Refresh, source: Arc<dyn DataSource<R>>) -> Arc<Self> {
        Arc::new(Self {
            cfg,
            source,
            store: Arc::new(SnapshotStore::new()),
            refresher: OnceCell::new(),
            worker: Mutex::new(None),
            stopped: AtomicBool::new(false),
        })
    }

    /// Warms the snapshot up and spawns the refresher, exactly once.
    ///
    /// A failed warm-up is logged and the cache starts with the empty
    /// snapshot. Calling `start` on a running cache is a no-op.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(LifecycleError::ShutDown);
        }

        self.refresher
            .get_or_init(|| async {
                let refresher = Refresher::new(
                    SVC_REFRESHER.to_string(),
                    self.source.clone(),
                    self.store.clone(),
                    Backoff::from_cfg(&self.cfg),
                );
                refresher.warm_up().await;

                let token = CancellationToken::new();
                let handle = tokio::spawn(refresher.clone().run(token.clone()));
                *self.worker.lock() = Some(Worker { token, handle });

                info!(
                    component = COMPONENT,
                    event = "started",
                    min_delay = ?self.cfg.min_interval,
                    max_delay = ?self.cfg.max_interval,
                    factor = self.cfg.factor,
                    "snapshot cache started"
                );
                refresher
            })
            .await;

        Ok(())
    }

    /// Stops the refresher and waits for it to exit.
    ///
    /// The wait is bounded by `shutdown_timeout`; a worker still running after
    /// that is aborted. Either way the cache ends up stopped and the failure is
    /// reported, never retried.
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(LifecycleError::ShutDown);
        }
        if self.refresher.get().is_none() {
            return Err(LifecycleError::NotStarted);
        }
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Err(LifecycleError::ShutDown);
        }

        let worker = self.worker.lock().take();
        let Some(Worker { token, mut handle }) = worker else {
            return Err(LifecycleError::ShutDown);
        };

        token.cancel();
        let shutdown_timeout = self.cfg.shutdown_timeout;

        match timeout(shutdown_timeout, &mut handle).await {
            Ok(Ok(())) => {
                info!(component = COMPONENT, event = "stopped", "snapshot cache stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(
                    component = COMPONENT,
                    event = "shutdown_failed",
                    error = %e,
                    "refresher exited abnormally"
                );
                Err(LifecycleError::WorkerFailed(e.to_string()))
            }
            Err(_) => {
                handle.abort();
                error!(
                    component = COMPONENT,
                    event = "shutdown_timeout",
                    timeout = ?shutdown_timeout,
                    "refresher did not stop in time, aborted"
                );
                Err(LifecycleError::ShutdownTimeout(shutdown_timeout))
            }
        }
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> State {
        if self.stopped.load(Ordering::Acquire) {
            State::Stopped
        } else if !self.refresher.initialized() {
            State::Idle
        } else if self.worker_exited() {
            State::Failed
        } else {
            State::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == State::Running
    }

    /// Returns the current snapshot, possibly empty or stale.
    ///
    /// Fails once the refresher is gone, so a snapshot that can no longer be
    /// refreshed is never served as if it were live.
    pub fn snapshot(&self) -> Result<Arc<Snapshot<R>>, LifecycleError> {
        self.running().map(|_| self.store.get())
    }

    /// Asks the refresher to fetch now instead of waiting out its delay.
    pub fn trigger_refresh(&self) -> Result<(), LifecycleError> {
        self.running().map(|r| r.wake())
    }

    /// Returns the refresher counters and its current delay.
    pub fn stats(&self) -> Result<Stats, LifecycleError> {
        self.running().map(|r| r.stats())
    }

    fn running(&self) -> Result<&Arc<Refresher<R>>, LifecycleError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(LifecycleError::ShutDown);
        }
        let refresher = self.refresher.get().ok_or(LifecycleError::NotStarted)?;
        if self.worker_exited() {
            return Err(LifecycleError::WorkerExited);
        }
        Ok(refresher)
    }

    fn worker_exited(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map_or(true, |w| w.handle.is_finished())
    }
}
