// Package refresher provides counters for snapshot refresh cycles.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Counters for refresh operations.
pub struct Counters {
    /// Successful refreshes, warm-up included.
    pub success_updates: AtomicI64,
    /// Failed fetches, warm-up included.
    pub error_updates: AtomicI64,
    /// Failures since the last success.
    pub consecutive_errors: AtomicI64,
    /// Delay before the next fetch, in milliseconds.
    pub delay_ms: AtomicU64,
}

impl Counters {
    /// Creates new counters.
    pub fn new() -> Self {
        Self {
            success_updates: AtomicI64::new(0),
            error_updates: AtomicI64::new(0),
            consecutive_errors: AtomicI64::new(0),
            delay_ms: AtomicU64::new(0),
        }
    }

    pub fn on_success(&self) {
        self.success_updates.fetch_add(1, Ordering::Relaxed);
        self.consecutive_errors.store(0, Ordering::Relaxed);
    }

    pub fn on_error(&self) {
        self.error_updates.fetch_add(1, Ordering::Relaxed);
        self.consecutive_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis().min(u64::MAX as u128) as u64, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    pub fn stats(&self) -> Stats {
        Stats {
            successes: self.success_updates.load(Ordering::Relaxed),
            errors: self.error_updates.load(Ordering::Relaxed),
            consecutive_errors: self.consecutive_errors.load(Ordering::Relaxed),
            delay: Duration::from_millis(self.delay_ms.load(Ordering::Relaxed)),
        }
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}

/// Stats is a copy of the refresher counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub successes: i64,
    pub errors: i64,
    pub consecutive_errors: i64,
    pub delay: Duration,
}
