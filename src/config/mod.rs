//! Configuration for Backlog.
//!
//! ## config.kdl - project preferences
//!
//! Located at `<project>/backlog/config.kdl`. Contains:
//! - `project-name` - Name shown in the interactive views
//! - `default-editor` - Editor command for task bodies
//!
//! ## Precedence
//!
//! For the editor: CLI flag > config.kdl > `EDITOR` > `vi`.
//! For the project root: `--cwd` > `BACKLOG_CWD` > process directory.
//!
//! Use the [`resolver`] and [`cwd`] modules for precedence resolution.

pub mod cwd;
pub mod resolver;
pub mod schema;

pub use cwd::{
    BACKLOG_CWD_ENV, CWD_OPTION_LABEL, CwdOptions, CwdResolution, CwdSource, PROCESS_CWD_LABEL,
    RuntimeEnv, resolve_runtime_cwd,
};
pub use resolver::{
    ConfigOverrides, ConfiguredEditor, DEFAULT_EDITOR, EDITOR_ENV, Resolved, ValueSource,
    resolve_editor,
};
pub use schema::{BacklogConfig, CONFIG_KEYS};
