// Metric names and recording helpers for the refresher.

use std::time::Duration;

pub const SNAPSHOT_RECORDS: &str = "snapshot_records";
pub const SNAPSHOT_VERSION: &str = "snapshot_version";
pub const REFRESH_DELAY_SECONDS: &str = "refresh_delay_seconds";
pub const REFRESH_SUCCESS_TOTAL: &str = "refresh_success_total";
pub const REFRESH_ERRORS_TOTAL: &str = "refresh_errors_total";

/// Records a successful refresh and the snapshot it installed.
pub fn on_refresh_success(records: usize, version: u64) {
    metrics::counter!(REFRESH_SUCCESS_TOTAL).increment(1);
    metrics::gauge!(SNAPSHOT_RECORDS).set(records as f64);
    metrics::gauge!(SNAPSHOT_VERSION).set(version as f64);
}

/// Records a failed fetch.
pub fn on_refresh_error() {
    metrics::counter!(REFRESH_ERRORS_TOTAL).increment(1);
}

/// Sets the delay the refresher waits before its next fetch.
pub fn set_refresh_delay(delay: Duration) {
    metrics::gauge!(REFRESH_DELAY_SECONDS).set(delay.as_secs_f64());
}
