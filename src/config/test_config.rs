use super::{Api, CacheBox, Config, Logs, Refresh};
use std::time::Duration;

/// Creates a new test configuration.
///
/// Intervals are short so refresh cycles happen within a test's lifetime;
/// the source section is left empty because tests inject their own source.
pub fn new_test_config() -> Config {
    Config {
        cache: CacheBox {
            env: super::TEST.to_string(),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            api: Some(Api {
                name: Some("snapcache:8091".to_string()),
                port: Some("8091".to_string()),
                cors: Some("*".to_string()),
            }),
            refresh: Refresh {
                min_interval: Duration::from_millis(20),
                max_interval: Duration::from_millis(160),
                factor: 2,
                shutdown_timeout: Duration::from_secs(2),
            },
            source: None,
        },
    }
}
