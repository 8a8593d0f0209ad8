//! Logging bootstrap
//!
//! Library code logs through the `log` facade. The binary calls
//! [`init_logging`] once to route those events to stderr via `flexi_logger`.
//! `RUST_LOG`, when set, overrides the level chosen here.

use anyhow::{Context, Result};
use flexi_logger::{Logger, LoggerHandle};
use log::debug;
use once_cell::sync::OnceCell;

static LOGGER: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    _handle: LoggerHandle,
}

/// Level used for a given verbosity flag
pub fn level_for(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Starts the stderr logger; later calls are no-ops
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = level_for(verbose);

    let state = LOGGER.get_or_try_init(|| -> Result<LoggingState> {
        let handle = Logger::try_with_env_or_str(level)
            .with_context(|| format!("Invalid log specification: {}", level))?
            .log_to_stderr()
            .format(flexi_logger::default_format)
            .start()
            .context("Failed to start logger")?;

        Ok(LoggingState {
            level,
            _handle: handle,
        })
    })?;

    debug!("Logging at level {} (requested {})", state.level, level);
    Ok(())
}
