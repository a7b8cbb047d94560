// Main entrypoint for the snapcache application.

use snapcache::app::App;
use snapcache::config::{Config, ConfigTrait};
use snapcache::shutdown::GracefulShutdown;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const CONFIG_PATH: &str = "cfg/snapcache.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/snapcache.cfg.local.yaml";

/// Grace period on top of the refresher shutdown timeout.
const GRACEFUL_MARGIN: Duration = Duration::from_secs(5);

/// Snapcache - in-memory snapshot of a slow data source, refreshed in background
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<(Config, String)> {
    if let Some(custom_path) = path {
        let cfg = Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path))?;
        return Ok((cfg, custom_path.display().to_string()));
    }

    match Config::load(PathBuf::from(CONFIG_PATH_LOCAL)) {
        Ok(cfg) => Ok((cfg, CONFIG_PATH_LOCAL.to_string())),
        Err(_) => {
            let cfg = Config::load(PathBuf::from(CONFIG_PATH))
                .with_context(|| format!("failed to load config from {}", CONFIG_PATH))?;
            Ok((cfg, CONFIG_PATH.to_string()))
        }
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        // Production: JSON format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        // Development: Pretty console format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The recorder must be installed before any metric is touched.
    if let Err(e) = snapcache::controller::init_prometheus_exporter() {
        eprintln!("Warning: Failed to initialize Prometheus metrics exporter: {}", e);
        eprintln!("Metrics endpoint will render an empty body");
    }

    tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let shutdown_token = CancellationToken::new();

    let (cfg, cfg_path) = load_cfg(args.cfg)?;

    // Configure logger (must be done after config is loaded)
    configure_logger(&cfg);

    info!(
        component = "config",
        event = "load_success",
        path = %cfg_path,
        "config loaded"
    );

    let graceful_shutdown = Arc::new(GracefulShutdown::new(shutdown_token.clone()));
    graceful_shutdown.set_graceful_timeout(cfg.refresh().shutdown_timeout + GRACEFUL_MARGIN);

    let app = App::new(shutdown_token.clone(), cfg)?;

    if let Err(e) = app.serve(graceful_shutdown.clone()).await {
        error!(
            component = "main",
            scope = "app",
            event = "start_failed",
            error = %e,
            "failed to start app"
        );
        shutdown_token.cancel();
        return Err(e);
    }

    // Listen for OS signals or cancellation and wait for graceful shutdown
    if let Err(e) = graceful_shutdown.await_shutdown().await {
        error!(
            component = "main",
            scope = "service",
            event = "graceful_shutdown_failed",
            error = %e,
            "failed to gracefully shut down service"
        );
        return Err(e);
    }

    Ok(())
}
