// Shared test support code for integration tests.

pub mod source;
pub mod upstream;

pub use source::{ScriptedSource, Step};
pub use upstream::TestUpstream;

use std::time::Duration;

use crate::config::Refresh;
use crate::model::Record;

/// Builds `n` records with ids `"1"..="n"`.
pub fn records(n: usize) -> Vec<Record> {
    (1..=n)
        .map(|i| Record::new(i.to_string(), format!("data-{i}")))
        .collect()
}

/// Refresh timings with a short shutdown bound.
pub fn refresh(min: Duration, max: Duration, factor: u32) -> Refresh {
    Refresh {
        min_interval: min,
        max_interval: max,
        factor,
        shutdown_timeout: Duration::from_secs(1),
    }
}
