// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::workers::backoff::{DEFAULT_FACTOR, DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY};

pub const PROD: &str = "prod";
pub const DEV: &str = "dev";
pub const TEST: &str = "test";

/// Environment keys overriding the refresh section.
pub const ENV_MIN_REFRESH_INTERVAL: &str = "MIN_REFRESH_INTERVAL_SECONDS";
pub const ENV_MAX_REFRESH_INTERVAL: &str = "MAX_REFRESH_INTERVAL_SECONDS";
pub const ENV_REFRESH_INTERVAL_FACTOR: &str = "REFRESH_INTERVAL_FACTOR";

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("refresh.min_interval must be greater than zero")]
    ZeroMinInterval,
    #[error("refresh.min_interval ({min:?}) exceeds refresh.max_interval ({max:?})")]
    InvertedIntervals { min: Duration, max: Duration },
    #[error("refresh.factor must be at least 1")]
    ZeroFactor,
    #[error("source.url is required for http source")]
    MissingUrl,
    #[error("source.path is required for file source")]
    MissingPath,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Cache {
    #[serde(rename = "snapcache")]
    pub cache: CacheBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub api: Option<Api>,
    #[serde(default)]
    pub refresh: Refresh,
    pub source: Option<Source>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Api {
    pub name: Option<String>,
    pub port: Option<String>,
    /// Value of the Access-Control-Allow-Origin response header.
    pub cors: Option<String>,
}

/// Poll timings of the snapshot refresher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Refresh {
    #[serde(rename = "min_interval", with = "humantime_serde", default = "default_min_interval")]
    pub min_interval: Duration,
    #[serde(rename = "max_interval", with = "humantime_serde", default = "default_max_interval")]
    pub max_interval: Duration,
    #[serde(default = "default_factor")]
    pub factor: u32,
    #[serde(rename = "shutdown_timeout", with = "humantime_serde", default = "default_shutdown_timeout")]
    pub shutdown_timeout: Duration,
}

fn default_min_interval() -> Duration {
    DEFAULT_MIN_DELAY
}

fn default_max_interval() -> Duration {
    DEFAULT_MAX_DELAY
}

fn default_factor() -> u32 {
    DEFAULT_FACTOR
}

fn default_shutdown_timeout() -> Duration {
    DEFAULT_SHUTDOWN_TIMEOUT
}

fn default_query_timeout() -> Duration {
    DEFAULT_QUERY_TIMEOUT
}

impl Default for Refresh {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_DELAY,
            max_interval: DEFAULT_MAX_DELAY,
            factor: DEFAULT_FACTOR,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl Refresh {
    /// Checks the backoff bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval.is_zero() {
            return Err(ConfigError::ZeroMinInterval);
        }
        if self.min_interval > self.max_interval {
            return Err(ConfigError::InvertedIntervals {
                min: self.min_interval,
                max: self.max_interval,
            });
        }
        if self.factor == 0 {
            return Err(ConfigError::ZeroFactor);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Http,
    File,
}

/// Where the refresher reads the record collection from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Source {
    pub kind: SourceKind,
    pub url: Option<String>,
    pub path: Option<String>,
    /// Upper bound of a single bulk read.
    #[serde(with = "humantime_serde", default = "default_query_timeout")]
    pub timeout: Duration,
}

impl Source {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.kind {
            SourceKind::Http if self.url.is_none() => Err(ConfigError::MissingUrl),
            SourceKind::File if self.path.is_none() => Err(ConfigError::MissingPath),
            _ => Ok(()),
        }
    }
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    fn api(&self) -> Option<&Api>;
    fn refresh(&self) -> &Refresh;
    fn source(&self) -> Option<&Source>;
}

// Config type alias for convenience
pub type Config = Cache;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.cache.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.cache.env == PROD
    }

    fn api(&self) -> Option<&Api> {
        self.cache.api.as_ref()
    }

    fn refresh(&self) -> &Refresh {
        &self.cache.refresh
    }

    fn source(&self) -> Option<&Source> {
        self.cache.source.as_ref()
    }
}

impl Config {
    /// Loads configuration from a YAML file and applies environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        let mut cfg = Self::from_yaml(&data)
            .with_context(|| format!("unmarshal yaml from {:?}", abs_path))?;

        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        cfg.validate()?;

        Ok(cfg)
    }

    /// Parses configuration from YAML text without touching the environment.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Cache = serde_yaml::from_str(data)?;
        Ok(cfg)
    }

    /// Validates cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.cache.refresh.validate().context("invalid refresh config")?;
        if let Some(ref source) = self.cache.source {
            source.validate().context("invalid source config")?;
        }
        Ok(())
    }

    /// Overrides refresh timings from environment-style keys.
    ///
    /// Values that fail to parse are reported and ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let refresh = &mut self.cache.refresh;

        if let Some(secs) = parse_env_u64(&lookup, ENV_MIN_REFRESH_INTERVAL) {
            refresh.min_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env_u64(&lookup, ENV_MAX_REFRESH_INTERVAL) {
            refresh.max_interval = Duration::from_secs(secs);
        }
        if let Some(factor) = parse_env_u64(&lookup, ENV_REFRESH_INTERVAL_FACTOR) {
            match u32::try_from(factor) {
                Ok(factor) => refresh.factor = factor,
                Err(_) => warn!(
                    component = "config",
                    event = "env_override_ignored",
                    key = ENV_REFRESH_INTERVAL_FACTOR,
                    value = factor,
                    "factor is out of range, keeping configured value"
                ),
            }
        }
    }
}

fn parse_env_u64<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(
                component = "config",
                event = "env_override_ignored",
                key = key,
                value = %raw,
                error = %e,
                "unable to parse environment variable, keeping configured value"
            );
            None
        }
    }
}

// Test config is always available for integration tests
mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const YAML: &str = r#"
snapcache:
  env: dev
  logs:
    level: info
  api:
    name: snapcache
    port: "3000"
  refresh:
    min_interval: 10s
    max_interval: 1h
    factor: 3
  source:
    kind: http
    url: http://localhost:8090/records
    timeout: 2s
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_parse_yaml() {
        let cfg = Config::from_yaml(YAML).unwrap();
        assert!(!cfg.is_prod());
        assert_eq!(cfg.refresh().min_interval, Duration::from_secs(10));
        assert_eq!(cfg.refresh().max_interval, Duration::from_secs(3600));
        assert_eq!(cfg.refresh().factor, 3);
        assert_eq!(cfg.refresh().shutdown_timeout, Duration::from_secs(5));

        let source = cfg.source().unwrap();
        assert_eq!(source.kind, SourceKind::Http);
        assert_eq!(source.timeout, Duration::from_secs(2));
        cfg.validate().unwrap();
    }

    #[test]
    fn test_refresh_section_defaults() {
        let cfg = Config::from_yaml("snapcache:\n  env: prod\n").unwrap();
        assert!(cfg.is_prod());
        assert_eq!(cfg.refresh(), &Refresh::default());
        assert_eq!(cfg.refresh().min_interval, Duration::from_secs(30));
        assert_eq!(cfg.refresh().max_interval, Duration::from_secs(86_400));
        assert_eq!(cfg.refresh().factor, 2);
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = Config::from_yaml(YAML).unwrap();
        cfg.apply_env_overrides(env(&[
            (ENV_MIN_REFRESH_INTERVAL, "1"),
            (ENV_MAX_REFRESH_INTERVAL, "8"),
            (ENV_REFRESH_INTERVAL_FACTOR, "2"),
        ]));
        assert_eq!(cfg.refresh().min_interval, Duration::from_secs(1));
        assert_eq!(cfg.refresh().max_interval, Duration::from_secs(8));
        assert_eq!(cfg.refresh().factor, 2);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut cfg = Config::from_yaml(YAML).unwrap();
        cfg.apply_env_overrides(env(&[
            (ENV_MIN_REFRESH_INTERVAL, "soon"),
            (ENV_REFRESH_INTERVAL_FACTOR, "99999999999"),
        ]));
        assert_eq!(cfg.refresh().min_interval, Duration::from_secs(10));
        assert_eq!(cfg.refresh().factor, 3);
    }

    #[test]
    fn test_validation() {
        let mut refresh = Refresh::default();
        refresh.min_interval = Duration::ZERO;
        assert_eq!(refresh.validate(), Err(ConfigError::ZeroMinInterval));

        let mut refresh = Refresh::default();
        refresh.min_interval = Duration::from_secs(100);
        refresh.max_interval = Duration::from_secs(10);
        assert!(matches!(
            refresh.validate(),
            Err(ConfigError::InvertedIntervals { .. })
        ));

        let mut refresh = Refresh::default();
        refresh.factor = 0;
        assert_eq!(refresh.validate(), Err(ConfigError::ZeroFactor));

        let source = Source {
            kind: SourceKind::File,
            url: None,
            path: None,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(source.validate(), Err(ConfigError::MissingPath));
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let cfg = Config::from_yaml(include_str!("../../cfg/snapcache.cfg.yaml")).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.refresh(), &Refresh::default());
        assert_eq!(cfg.source().unwrap().kind, SourceKind::File);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapcache.cfg.yaml");
        std::fs::write(&path, YAML).unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.api().unwrap().port.as_deref(), Some("3000"));

        assert!(Config::load(dir.path().join("missing.yaml")).is_err());
    }
}
