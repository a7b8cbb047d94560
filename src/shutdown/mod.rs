// Package shutdown provides graceful shutdown functionality.

use anyhow::Result;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
#[error("graceful shutdown timeout exceeded")]
pub struct TimeoutError;

/// Graceful shutdown handler.
///
/// Background tasks register with `add` and report with `done`; the handler
/// waits for an OS signal or token cancellation, cancels the token and then
/// waits for every registered task within the graceful timeout.
#[derive(Clone)]
pub struct GracefulShutdown {
    shutdown_token: CancellationToken,
    timeout: Arc<RwLock<Duration>>,
    pending: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl GracefulShutdown {
    /// Creates a new graceful shutdown handler
    pub fn new(shutdown_token: CancellationToken) -> Self {
        Self {
            shutdown_token,
            timeout: Arc::new(RwLock::new(DEFAULT_TIMEOUT)),
            pending: Arc::new(AtomicUsize::new(0)),
            drained: Arc::new(Notify::new()),
        }
    }

    /// Sets the graceful shutdown timeout
    pub fn set_graceful_timeout(&self, timeout: Duration) {
        *self.timeout.write() = timeout;
    }

    /// Registers `n` tasks to wait for.
    pub fn add(&self, n: usize) {
        self.pending.fetch_add(n, Ordering::AcqRel);
    }

    /// Marks one registered task as done.
    pub fn done(&self) {
        let prev = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if prev == Ok(1) {
            self.drained.notify_waiters();
        }
    }

    /// Number of tasks still running.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Waits for shutdown signal and then waits for all tasks to complete
    pub async fn await_shutdown(&self) -> Result<()> {
        tokio::select! {
            signal = os_signal() => {
                info!(
                    component = "graceful-shutdown",
                    event = "os_signal",
                    signal = signal,
                    "cancellation started"
                );
            }
            _ = self.shutdown_token.cancelled() => {
                info!(
                    component = "graceful-shutdown",
                    event = "ctx_done",
                    "cancellation started"
                );
            }
        }

        self.cancel_and_await_with_timeout().await
    }

    async fn cancel_and_await_with_timeout(&self) -> Result<()> {
        self.shutdown_token.cancel();

        let timeout_duration = *self.timeout.read();

        match timeout(timeout_duration, self.wait_for_completion()).await {
            Ok(_) => {
                info!(
                    component = "graceful-shutdown",
                    event = "shutdown_success",
                    "service was gracefully shut down"
                );
                Ok(())
            }
            Err(_) => {
                warn!(
                    component = "graceful-shutdown",
                    event = "shutdown_timeout",
                    timeout_secs = timeout_duration.as_secs(),
                    pending = self.pending(),
                    "not all tasks were closed within timeout"
                );
                Err(TimeoutError.into())
            }
        }
    }

    async fn wait_for_completion(&self) {
        loop {
            let drained = self.drained.notified();
            if self.pending() == 0 {
                return;
            }
            drained.await;
        }
    }
}

#[cfg(unix)]
async fn os_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        },
        Err(e) => {
            warn!(
                component = "graceful-shutdown",
                event = "sigterm_unavailable",
                error = %e,
                "SIGTERM handler not installed"
            );
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn os_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
