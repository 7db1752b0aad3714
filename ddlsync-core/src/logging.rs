//! Logging set-up for the ddlsync binary.
//!
//! Console output always; a plain-text log file when the configuration names
//! a log directory.

use crate::config::{LogConfig, LogMode};
use crate::{DdlSyncError, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// File name of the run log inside the log directory.
pub const LOG_FILE_NAME: &str = "ddlsync.log";

/// Maps CLI verbosity flags to a level.
///
/// `quiet` wins over `verbose`: 0 is INFO, 1 is DEBUG, 2 or more is TRACE.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initializes console and optional file logging.
///
/// `RUST_LOG` overrides the level derived from the flags.
///
/// # Errors
/// Fails if the log file cannot be opened or a subscriber is already set.
///
/// # Example
/// ```rust,no_run
/// use ddlsync_core::config::LogConfig;
/// use ddlsync_core::logging::init_logging;
///
/// init_logging(&LogConfig::default(), 1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(config: &LogConfig, verbose: u8, quiet: bool) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level_for(verbose, quiet)).into())
        .from_env_lossy();

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let file = match &config.dir {
        Some(dir) => {
            let path = open_log_path(dir)?;
            let handle = OpenOptions::new()
                .create(true)
                .write(true)
                .append(config.mode == LogMode::Append)
                .truncate(config.mode == LogMode::Rewrite)
                .open(&path)
                .map_err(|e| DdlSyncError::io(format!("open log file \"{}\"", path.display()), e))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(handle)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| DdlSyncError::configuration(format!("Failed to initialize logging: {e}")))?;

    Ok(())
}

fn open_log_path(dir: &std::path::Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| DdlSyncError::io(format!("create log dir \"{}\"", dir.display()), e))?;
    Ok(dir.join(LOG_FILE_NAME))
}
