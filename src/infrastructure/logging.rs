//! Logging initialization
//!
//! Console output by default, with an optional rolling file appender. The
//! non-blocking writer guard must outlive the process, so it is parked in a
//! global.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

use crate::infrastructure::config::LoggingConfig;

lazy_static! {
    // Keeps the non-blocking file writers alive for the process lifetime.
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Log directory next to the executable.
pub fn default_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|parent| parent.to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    exe_dir.join("logs")
}

/// Initialize the tracing subscriber from the logging configuration.
///
/// RUST_LOG wins over the configured level when set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let registry = Registry::default().with(filter).with(fmt::layer());

    if config.file_output {
        let log_dir = config
            .directory
            .clone()
            .unwrap_or_else(default_log_directory);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let appender = rolling::daily(&log_dir, "cpk-cloud-client.log");
        let (writer, guard) = non_blocking(appender);
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(guard);
        }

        registry
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .try_init()
            .context("Failed to initialize logging with file output")?;
    } else {
        registry
            .try_init()
            .context("Failed to initialize logging")?;
    }

    Ok(())
}
