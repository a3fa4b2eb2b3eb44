//! File logging setup.
//!
//! Logs never go to the terminal: the dashboard owns the screen.

use std::{env, fs};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

/// Overrides the configured level filter when set.
pub const LOG_ENV: &str = "CLAIMDESK_LOG";

/// Builds the level filter: `CLAIMDESK_LOG` first, then the configured level.
///
/// # Errors
/// Returns an error if the level directive cannot be parsed.
pub fn filter(config: &Config) -> Result<EnvFilter> {
    if let Ok(directive) = env::var(LOG_ENV)
        && !directive.trim().is_empty()
    {
        return EnvFilter::try_new(directive.trim())
            .with_context(|| format!("Invalid {LOG_ENV} filter"));
    }
    EnvFilter::try_new(&config.log.level)
        .with_context(|| format!("Invalid log level: {}", config.log.level))
}

/// Installs the global subscriber. Keep the guard alive until exit so
/// buffered lines get flushed.
///
/// # Errors
/// Returns an error if the log directory cannot be created, the filter is
/// invalid, or a global subscriber is already installed.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let path = config.log_path();
    let dir = path
        .parent()
        .context("Log file path has no parent directory")?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .context("Log file path has no file name")?;

    let appender = rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter(config)?)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()
        .context("Failed to install log subscriber")?;

    tracing::debug!(path = %path.display(), "logging initialised");
    Ok(guard)
}
