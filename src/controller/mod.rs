// HTTP API controllers for the snapshot cache.

pub mod controller;
pub mod metrics;
pub mod probe;
pub mod records;
pub mod snapshot;

// Re-export controller types for convenience
pub use metrics::{init_prometheus_exporter, PrometheusMetricsController};
pub use probe::{Liveness, LivenessProbeController};
pub use records::RecordsController;
pub use snapshot::SnapshotController;
