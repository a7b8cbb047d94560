// Package workers provides the adaptive poll delay used by the refresher.

use std::time::Duration;

use crate::config::Refresh;

pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(86_400);
pub const DEFAULT_FACTOR: u32 = 2;

/// Backoff holds the current poll delay and the bounds it moves within.
///
/// Invariant: `min_delay <= current_delay <= max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    current_delay: Duration,
    min_delay: Duration,
    max_delay: Duration,
    factor: u32,
}

impl Backoff {
    /// Creates a new backoff starting at `min_delay`.
    ///
    /// Bounds are normalized so the invariant holds even for inputs that slipped
    /// past config validation: `max_delay` is raised to `min_delay` and a zero
    /// factor is treated as 1.
    pub fn new(min_delay: Duration, max_delay: Duration, factor: u32) -> Self {
        let max_delay = max_delay.max(min_delay);
        Self {
            current_delay: min_delay,
            min_delay,
            max_delay,
            factor: factor.max(1),
        }
    }

    /// Builds a backoff from the refresh config section.
    pub fn from_cfg(cfg: &Refresh) -> Self {
        Self::new(cfg.min_interval, cfg.max_interval, cfg.factor)
    }

    /// Returns the delay to wait before the next fetch.
    pub fn current(&self) -> Duration {
        self.current_delay
    }

    pub fn min(&self) -> Duration {
        self.min_delay
    }

    pub fn max(&self) -> Duration {
        self.max_delay
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }

    /// Returns true when further failures can no longer grow the delay.
    pub fn is_saturated(&self) -> bool {
        self.current_delay >= self.max_delay
    }

    /// Records a fetch outcome and returns the next delay.
    pub fn next(&mut self, success: bool) -> Duration {
        if success {
            self.on_success()
        } else {
            self.on_failure()
        }
    }

    /// Resets the delay to `min_delay`, however far it had grown.
    pub fn on_success(&mut self) -> Duration {
        self.current_delay = self.min_delay;
        self.current_delay
    }

    /// Advances the delay by `factor`, capped at `max_delay`.
    pub fn on_failure(&mut self) -> Duration {
        self.current_delay = self
            .current_delay
            .saturating_mul(self.factor)
            .min(self.max_delay);
        self.current_delay
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DELAY, DEFAULT_MAX_DELAY, DEFAULT_FACTOR)
    }
}
