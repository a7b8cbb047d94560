//! Prometheus metrics functionality.
//
//! Metrics are recorded through the `metrics` facade; the Prometheus recorder
//! is installed by `controller::metrics::init_prometheus_exporter`.

pub mod meter;

// Re-export commonly used items
pub use meter::*;
