//! Log file setup.
//!
//! Logging goes to an append-only file, never the terminal. The [`LogContext`] returned by
//! [`LogContext::init`] owns the background writer; dropping it flushes pending lines.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry};

const LOG_SUBDIR: &str = "adtool_logs";
const LOG_FILE_NAME: &str = "adtool.log";

/// Keeps the log writer alive for the duration of a run.
#[must_use = "dropping the context stops logging"]
pub struct LogContext {
    path: PathBuf,
    _guard: WorkerGuard,
}

impl LogContext {
    /// Opens `path` for appending and installs the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or a subscriber is already installed.
    pub fn init(path: &Path, level: LevelFilter) -> io::Result<Self> {
        let file = open_log_file(path)?;
        let (writer, guard) = non_blocking(file);

        Registry::default()
            .with(level)
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false),
            )
            .try_init()
            .map_err(io::Error::other)?;

        Ok(Self {
            path: path.to_path_buf(),
            _guard: guard,
        })
    }

    /// File this context writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `~/adtool_logs/adtool.log`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_log_file() -> io::Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(LOG_SUBDIR).join(LOG_FILE_NAME))
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "failed to resolve home directory"))
}

/// Opens the log file for appending, creating it and its parent directory if needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created.
pub fn open_log_file(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Routes panic messages into the log instead of the terminal.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("panic: {info}");
    }));
}
