//! Logging setup and the warning capability handed to components that must
//! report non-fatal problems.

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

/// Receives non-fatal notices such as unsupported archive entries.
#[cfg_attr(test, mockall::automock)]
pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Forwards warnings to the process-wide `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWarningSink;

impl WarningSink for LogWarningSink {
    fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }
}

/// Initialize terminal logging with the specified verbosity level
pub fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}
