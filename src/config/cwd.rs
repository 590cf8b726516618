//! Working directory resolution.
//!
//! The project root comes from exactly one of three places, highest
//! precedence first:
//!
//! 1. The `--cwd` option
//! 2. The `BACKLOG_CWD` environment variable (when non-empty)
//! 3. The process working directory
//!
//! Relative overrides are resolved against the process working directory.
//! The environment is passed in as a [`RuntimeEnv`] snapshot, so resolution
//! itself reads no global state.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{Error, Result};

/// Environment variable overriding the working directory.
pub const BACKLOG_CWD_ENV: &str = "BACKLOG_CWD";

/// Label reported when the `--cwd` option supplied the directory.
pub const CWD_OPTION_LABEL: &str = "--cwd";

/// Label reported when the process working directory is used.
pub const PROCESS_CWD_LABEL: &str = "current directory";

/// Where the resolved working directory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CwdSource {
    /// Ambient process working directory
    Process,
    /// `BACKLOG_CWD` environment variable
    Env,
    /// Explicit caller-supplied option
    Option,
}

impl std::fmt::Display for CwdSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CwdSource::Process => write!(f, "process"),
            CwdSource::Env => write!(f, "env"),
            CwdSource::Option => write!(f, "option"),
        }
    }
}

/// Result of resolving the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CwdResolution {
    /// Absolute path of the chosen directory
    pub cwd: PathBuf,
    /// Which source supplied it
    pub source: CwdSource,
    /// Name of the flag or variable that fired
    pub source_label: String,
}

/// Caller-supplied overrides.
#[derive(Debug, Clone, Default)]
pub struct CwdOptions {
    /// Explicit directory, possibly relative
    pub cwd: Option<PathBuf>,
}

impl CwdOptions {
    /// Options with an explicit directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
        }
    }
}

/// Snapshot of the process state relevant to resolution.
#[derive(Debug, Clone)]
pub struct RuntimeEnv {
    /// Ambient working directory of the process
    pub process_cwd: PathBuf,
    /// Raw value of `BACKLOG_CWD`, if set
    pub cwd_override: Option<String>,
}

impl RuntimeEnv {
    /// Capture the current process directory and environment.
    pub fn capture() -> Result<Self> {
        Ok(Self {
            process_cwd: std::env::current_dir()?,
            cwd_override: std::env::var(BACKLOG_CWD_ENV).ok(),
        })
    }

    /// Snapshot with an explicit process directory and no override.
    pub fn new(process_cwd: impl Into<PathBuf>) -> Self {
        Self {
            process_cwd: process_cwd.into(),
            cwd_override: None,
        }
    }

    /// Set the `BACKLOG_CWD` value.
    pub fn with_override(mut self, value: impl Into<String>) -> Self {
        self.cwd_override = Some(value.into());
        self
    }
}

/// Resolve the project root from options and an environment snapshot.
///
/// Fails with [`Error::InvalidDirectory`] naming the source when the chosen
/// path does not exist or is not a directory.
pub fn resolve_runtime_cwd(options: &CwdOptions, env: &RuntimeEnv) -> Result<CwdResolution> {
    let resolution = if let Some(ref cwd) = options.cwd {
        CwdResolution {
            cwd: env.process_cwd.join(cwd),
            source: CwdSource::Option,
            source_label: CWD_OPTION_LABEL.to_string(),
        }
    } else if let Some(value) = env
        .cwd_override
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        CwdResolution {
            cwd: env.process_cwd.join(value),
            source: CwdSource::Env,
            source_label: BACKLOG_CWD_ENV.to_string(),
        }
    } else {
        CwdResolution {
            cwd: env.process_cwd.clone(),
            source: CwdSource::Process,
            source_label: PROCESS_CWD_LABEL.to_string(),
        }
    };

    validate_directory(&resolution.cwd, &resolution.source_label)?;
    tracing::debug!(
        cwd = %resolution.cwd.display(),
        source = %resolution.source,
        "resolved working directory"
    );
    Ok(resolution)
}

fn validate_directory(path: &Path, source_label: &str) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::InvalidDirectory {
            source_label: source_label.to_string(),
            path: path.to_path_buf(),
        })
    }
}
