use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "bookdr.log";
/// Overrides the configured level, e.g. `BOOKDR_LOG=bookdr=debug`.
pub const LOG_ENV: &str = "BOOKDR_LOG";

/// Send tracing output to `<dir>/bookdr.log`; the terminal belongs to the UI.
///
/// Returns `None` when a global subscriber is already installed. The guard must
/// live until exit so buffered lines are flushed.
pub fn init(dir: &Path, level: &str) -> Result<Option<WorkerGuard>> {
    fs::create_dir_all(dir)?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .is_ok();

    Ok(installed.then_some(guard))
}
