//! Diagnostic logging.
//!
//! The interactive views own stdout, so logs go to a file. Logging is off
//! unless `BACKLOG_LOG` holds a filter directive such as `debug` or
//! `backlog::handoff=trace`. Set `BACKLOG_LOG_FORMAT=json` for one JSON
//! object per line.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_FILTER_ENV: &str = "BACKLOG_LOG";

/// Environment variable overriding the log directory.
pub const LOG_DIR_ENV: &str = "BACKLOG_LOG_DIR";

/// Environment variable selecting the line format (`text` or `json`).
pub const LOG_FORMAT_ENV: &str = "BACKLOG_LOG_FORMAT";

/// Name of the log file inside the log directory.
pub const LOG_FILE_NAME: &str = "backlog.log";

/// Where and what to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub dir: PathBuf,
    pub json: bool,
}

impl LogSettings {
    /// Settings from raw environment values, `None` when logging is off.
    pub fn from_values(
        filter: Option<&str>,
        dir: Option<&str>,
        format: Option<&str>,
    ) -> Option<Self> {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty())?;
        let dir = dir
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_log_dir);
        let json = format.is_some_and(|f| f.trim().eq_ignore_ascii_case("json"));
        Some(Self {
            filter: filter.to_string(),
            dir,
            json,
        })
    }

    /// Settings from the process environment.
    pub fn from_env() -> Option<Self> {
        Self::from_values(
            std::env::var(LOG_FILTER_ENV).ok().as_deref(),
            std::env::var(LOG_DIR_ENV).ok().as_deref(),
            std::env::var(LOG_FORMAT_ENV).ok().as_deref(),
        )
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }
}

/// Default log directory: `<data-local-dir>/backlog/logs`.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("backlog")
        .join("logs")
}

/// Install the global subscriber if `BACKLOG_LOG` is set.
///
/// The returned guard flushes the background writer when dropped; keep it
/// alive for the whole run.
pub fn init_logging() -> Option<WorkerGuard> {
    let settings = LogSettings::from_env()?;
    init_with(&settings)
}

fn init_with(settings: &LogSettings) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(&settings.dir) {
        eprintln!(
            "Warning: could not create log directory {}: {}",
            settings.dir.display(),
            e
        );
        return None;
    }

    let filter = match EnvFilter::try_new(&settings.filter) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Warning: invalid {} value '{}': {}", LOG_FILTER_ENV, settings.filter, e);
            return None;
        }
    };

    let appender = tracing_appender::rolling::never(&settings.dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false);
    let installed = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    match installed {
        Ok(()) => {
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                log = %settings.log_path().display(),
                "logging started"
            );
            Some(guard)
        }
        // A subscriber is already installed; the new writer is dropped.
        Err(_) => None,
    }
}
