// Scripted data source recording every call.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::source::{DataSource, FetchError};

/// Outcome of one scripted fetch.
#[derive(Debug, Clone)]
pub enum Step<R> {
    Ok(Vec<R>),
    Fail,
    /// Never completes.
    Hang,
    /// Panics inside the fetch.
    Panic,
    /// Blocks the executor thread, ignoring cancellation.
    Block(Duration),
}

/// ScriptedSource replays `Step`s in order, then repeats the fallback.
pub struct ScriptedSource<R> {
    script: Mutex<VecDeque<Step<R>>>,
    fallback: Step<R>,
    calls: Mutex<Vec<Instant>>,
    finished: AtomicUsize,
    called: Notify,
}

impl<R: Clone + Send + Sync + 'static> ScriptedSource<R> {
    pub fn new(script: Vec<Step<R>>, fallback: Step<R>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
            finished: AtomicUsize::new(0),
            called: Notify::new(),
        })
    }

    /// Always fails.
    pub fn failing() -> Arc<Self> {
        Self::new(vec![], Step::Fail)
    }

    /// Always returns `records`.
    pub fn fixed(records: Vec<R>) -> Arc<Self> {
        Self::new(vec![], Step::Ok(records))
    }

    /// Number of fetches started.
    pub fn calls(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of fetches that returned.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::Acquire)
    }

    /// Clock readings taken when each fetch started.
    pub fn instants(&self) -> Vec<Instant> {
        self.calls.lock().clone()
    }

    /// Gaps between consecutive fetch starts.
    pub fn gaps(&self) -> Vec<Duration> {
        self.instants().windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Waits until at least `n` fetches have returned.
    pub async fn wait_finished(&self, n: usize) {
        loop {
            let notified = self.called.notified();
            if self.finished() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait::async_trait]
impl<R: Clone + Send + Sync + 'static> DataSource<R> for ScriptedSource<R> {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_all(&self) -> Result<Vec<R>, FetchError> {
        self.calls.lock().push(Instant::now());
        let step = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let result = match step {
            Step::Ok(records) => Ok(records),
            Step::Fail => Err(FetchError::Unavailable("scripted failure".into())),
            Step::Hang => std::future::pending().await,
            Step::Panic => panic!("scripted panic"),
            Step::Block(duration) => {
                std::thread::sleep(duration);
                Ok(Vec::new())
            }
        };

        self.finished.fetch_add(1, Ordering::AcqRel);
        self.called.notify_waiters();
        result
    }
}
