//! Daily rolling log files under the XDG state directory.
//!
//! One file per UTC day, named `benchdesk.YYYY-MM-DD.log`. At most
//! `logging.max_files` files are kept; older ones are pruned by the appender.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};

const FILE_PREFIX: &str = "benchdesk";
const FILE_SUFFIX: &str = "log";

/// Name of the log file that receives records written on `date`.
pub fn file_name(date: NaiveDate) -> String {
    format!("{}.{}.{}", FILE_PREFIX, date.format("%Y-%m-%d"), FILE_SUFFIX)
}

/// Today's log file in `dir`.
pub fn current_file(dir: &Path) -> PathBuf {
    dir.join(file_name(Utc::now().date_naive()))
}

fn appender(dir: &Path, max_files: usize) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(FILE_PREFIX)
        .filename_suffix(FILE_SUFFIX)
        .max_log_files(max_files.max(1))
        .build(dir)
        .map_err(|e| Error::Config(format!("failed to open log files in {}: {}", dir.display(), e)))
}

fn parse_level(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| Error::Config(format!("invalid log level '{}': {}", level, e)))
}

/// Keeps the background log writer running.
///
/// Pending records are flushed when the guard is dropped.
pub struct LoggingGuard {
    dir: PathBuf,
    _worker: WorkerGuard,
}

impl LoggingGuard {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File receiving records right now.
    pub fn current_file(&self) -> PathBuf {
        current_file(&self.dir)
    }
}

/// Install the global subscriber writing to the state directory.
///
/// `RUST_LOG` wins over the configured level. A configured level that does
/// not parse is a configuration error.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let dir = Config::state_dir();
    std::fs::create_dir_all(&dir)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_level(&config.level)?,
    };
    let (writer, worker) = tracing_appender::non_blocking(appender(&dir, config.max_files)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let guard = LoggingGuard {
        dir,
        _worker: worker,
    };
    tracing::info!(
        file = %guard.current_file().display(),
        level = %config.level,
        max_files = config.max_files,
        "Logging initialized"
    );
    Ok(guard)
}

/// Route records to the test harness output. Safe to call from every test.
#[cfg(test)]
pub(crate) fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
