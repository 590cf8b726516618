//! Precedence resolution for configuration values.
//!
//! ## Editor Precedence (highest to lowest)
//!
//! 1. `--editor` CLI flag
//! 2. `default-editor` in `backlog/config.kdl`
//! 3. `EDITOR` environment variable
//! 4. Built-in default (`vi`)

use crate::Result;
use crate::config::BacklogConfig;
use crate::handoff::EditorCommandSource;
use crate::storage::Storage;

/// Environment variable consulted for the editor command.
pub const EDITOR_ENV: &str = "EDITOR";

/// Editor used when nothing else is configured.
pub const DEFAULT_EDITOR: &str = "vi";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from the project's config.kdl
    Config,
    /// Value from environment variable
    EnvVar(String),
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Config => write!(f, "config"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Editor override from CLI flag
    pub editor: Option<String>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set editor override.
    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = Some(editor.into());
        self
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve the editor command with full precedence chain.
///
/// `env_editor` is the value of `EDITOR` captured by the caller; blank
/// values at any level are skipped.
pub fn resolve_editor(
    config: &BacklogConfig,
    overrides: &ConfigOverrides,
    env_editor: Option<&str>,
) -> Resolved<String> {
    if let Some(editor) = non_blank(overrides.editor.as_deref()) {
        return Resolved::new(editor, ValueSource::CliFlag);
    }
    if let Some(editor) = non_blank(config.default_editor.as_deref()) {
        return Resolved::new(editor, ValueSource::Config);
    }
    if let Some(editor) = non_blank(env_editor) {
        return Resolved::new(editor, ValueSource::EnvVar(EDITOR_ENV.to_string()));
    }
    Resolved::new(DEFAULT_EDITOR.to_string(), ValueSource::Default)
}

/// Editor command source backed by the project's persisted configuration.
///
/// The config file is re-read on every request so edits made while the
/// manager is running take effect on the next handoff.
#[derive(Debug, Clone)]
pub struct ConfiguredEditor {
    storage: Storage,
    overrides: ConfigOverrides,
    env_editor: Option<String>,
}

impl ConfiguredEditor {
    /// Create a source from storage, CLI overrides and a captured `EDITOR`.
    pub fn new(storage: Storage, overrides: ConfigOverrides, env_editor: Option<String>) -> Self {
        Self {
            storage,
            overrides,
            env_editor,
        }
    }

    /// Resolve the editor, keeping track of where it came from.
    pub fn resolve(&self) -> Result<Resolved<String>> {
        let config = self.storage.read_config()?;
        Ok(resolve_editor(
            &config,
            &self.overrides,
            self.env_editor.as_deref(),
        ))
    }
}

impl EditorCommandSource for ConfiguredEditor {
    fn editor_command(&self) -> Result<String> {
        let resolved = self.resolve()?;
        tracing::debug!(editor = %resolved.value, source = %resolved.source, "resolved editor");
        Ok(resolved.value)
    }
}
