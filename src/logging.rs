//! Log setup: `RUST_LOG`-driven filter, stderr output, daily rolling file.

use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_FILTER: &str = "rekon_lib=info";

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn file_writer(log_dir: &Path) -> Result<(NonBlocking, WorkerGuard), String> {
    std::fs::create_dir_all(log_dir).map_err(|e| e.to_string())?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("rekon")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| e.to_string())?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Installs the global subscriber. Keep the guard alive for the whole
/// process, or buffered file output is lost.
///
/// Falls back to stderr only when the log directory is unusable. Returns
/// `None` when no file writer was set up or a subscriber already exists.
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    let file = match file_writer(log_dir) {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!("File logging disabled ({}): {}", log_dir.display(), e);
            None
        }
    };
    let (writer, guard) = file.unzip();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
        .try_init()
        .ok()
        .and(guard)
}
