//! Backlog - a terminal task manager with board and list views.
//!
//! This library provides the core functionality for the `backlog` CLI tool,
//! including task storage, working directory resolution, and the handoff
//! protocol that lends the terminal to an external editor and takes it back.

use std::path::PathBuf;

pub mod cli;
pub mod commands;
pub mod config;
pub mod handoff;
pub mod logging;
pub mod models;
pub mod storage;
pub mod sys;
pub mod tui;


/// Library-level error type for Backlog operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not initialized: run `backlog init` first")]
    NotInitialized,

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid task file {}: {reason}", path.display())]
    InvalidTaskFile { path: PathBuf, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    /// The resolved working directory does not exist or is not a directory.
    #[error("Invalid directory from {source_label}: {}", path.display())]
    InvalidDirectory { source_label: String, path: PathBuf },

    /// The editor process could not be started.
    #[error("Failed to launch editor `{command}`: {reason}")]
    EditorLaunchFailed { command: String, reason: String },

    /// An edit was requested while another handoff was still in flight.
    #[error("An editor session is already in progress for {in_flight}")]
    HandoffBusy { in_flight: String },

    /// The edited entity could not be reloaded after the editor exited.
    #[error("Task {0} could not be reloaded after editing; keeping the previous copy")]
    ReintegrationNotFound(String),

    /// Raw mode could not be left or re-entered.
    #[error("Terminal mode failure: {0}")]
    TerminalModeFailure(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error ends the current operation.
    ///
    /// `ReintegrationNotFound` is a warning: the session continues with the
    /// previously loaded copy of the task.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::ReintegrationNotFound(_))
    }
}

/// Result type alias for Backlog operations.
pub type Result<T> = std::result::Result<T, Error>;
