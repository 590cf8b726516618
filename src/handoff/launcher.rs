//! Editor process launching.
//!
//! An editor launch is not an ordinary subprocess call: the child gets the
//! real terminal on stdin, stdout and stderr so it can draw its own screen and
//! read keystrokes. [`TerminalEditorLauncher`] is that attached variant and
//! is kept separate from anything that captures output.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use serde::Serialize;

use crate::sys;
use crate::{Error, Result};

/// How the editor process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum EditorExit {
    /// Normal exit with a status code
    Code(i32),
    /// Terminated by a signal
    Signal(i32),
}

impl EditorExit {
    /// Classify a finished process.
    pub fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return EditorExit::Signal(signal);
            }
        }
        EditorExit::Code(status.code().unwrap_or(-1))
    }

    pub fn success(&self) -> bool {
        matches!(self, EditorExit::Code(0))
    }

    /// Whether the user interrupted the editor from the terminal.
    pub fn was_interrupted(&self) -> bool {
        matches!(self, EditorExit::Signal(signal) if sys::is_interrupt(*signal))
    }
}

impl fmt::Display for EditorExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorExit::Code(code) => write!(f, "exited with status {}", code),
            EditorExit::Signal(signal) => write!(f, "terminated by {}", sys::signal_name(*signal)),
        }
    }
}

/// One editor launch.
///
/// Built right before spawning; the launcher hands it back with
/// [`exit`](Self::exit) filled in once the process has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorInvocation {
    command: String,
    program: String,
    args: Vec<String>,
    target: PathBuf,
    cwd: PathBuf,
    env: BTreeMap<String, String>,
    exit: Option<EditorExit>,
}

impl EditorInvocation {
    /// Prepare a launch of `command` against `target`.
    ///
    /// A relative `target` is taken relative to `cwd`.
    pub fn new(command: &str, target: &Path, cwd: &Path) -> Result<Self> {
        let mut words = split_command(command).map_err(|reason| Error::EditorLaunchFailed {
            command: command.to_string(),
            reason,
        })?;
        let program = words.remove(0);
        Ok(Self {
            command: command.to_string(),
            program,
            args: words,
            target: cwd.join(target),
            cwd: cwd.to_path_buf(),
            env: BTreeMap::new(),
            exit: None,
        })
    }

    /// Add an environment variable for the editor process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments from the command string, not including the target.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn exit(&self) -> Option<EditorExit> {
        self.exit
    }

    /// Full argument vector: program, command arguments, then the target.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv.push(self.target.display().to_string());
        argv
    }

    /// Record how the process ended.
    pub fn completed(mut self, exit: EditorExit) -> Self {
        self.exit = Some(exit);
        self
    }
}

/// Runs an editor to completion.
#[async_trait]
pub trait EditorLauncher {
    /// Spawn the editor described by `invocation` and wait for it to exit.
    ///
    /// Any exit code or signal is a successful launch; only failing to start
    /// the process is an error.
    async fn launch(&self, invocation: EditorInvocation) -> Result<EditorInvocation>;
}

/// Launches editors attached to the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalEditorLauncher;

#[async_trait]
impl EditorLauncher for TerminalEditorLauncher {
    async fn launch(&self, invocation: EditorInvocation) -> Result<EditorInvocation> {
        let mut command = tokio::process::Command::new(invocation.program());
        command
            .args(invocation.args())
            .arg(invocation.target())
            .current_dir(invocation.cwd())
            .envs(invocation.env())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // Raised before spawn so an early Ctrl-C cannot slip through.
        let _shield = sys::shield_interrupts();

        let mut child = command.spawn().map_err(|e| Error::EditorLaunchFailed {
            command: invocation.command().to_string(),
            reason: spawn_failure_reason(invocation.program(), &e),
        })?;
        tracing::info!(
            argv = ?invocation.argv(),
            pid = ?child.id(),
            "editor started"
        );

        let status = child.wait().await.map_err(|e| Error::EditorLaunchFailed {
            command: invocation.command().to_string(),
            reason: format!("failed waiting for editor: {}", e),
        })?;

        let exit = EditorExit::from_status(status);
        if exit.was_interrupted() {
            tracing::info!("editor interrupted from the terminal");
        } else {
            tracing::info!(%exit, "editor finished");
        }
        Ok(invocation.completed(exit))
    }
}

fn spawn_failure_reason(program: &str, error: &std::io::Error) -> String {
    match error.kind() {
        ErrorKind::NotFound => format!("executable '{}' not found", program),
        ErrorKind::PermissionDenied => format!("permission denied running '{}'", program),
        _ => error.to_string(),
    }
}

/// Split an editor command into words.
///
/// Words are separated by whitespace. Single quotes take everything
/// literally, double quotes allow `\"`, `\\`, `\$` and `` \` `` escapes, and a
/// backslash outside quotes escapes the next character.
pub fn split_command(command: &str) -> std::result::Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err("unterminated single quote".to_string()),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\' | '$' | '`')) => current.push(ch),
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err("unterminated double quote".to_string()),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err("unterminated double quote".to_string()),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(ch) => current.push(ch),
                    None => return Err("trailing backslash".to_string()),
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }

    if words.is_empty() {
        return Err("editor command is empty".to_string());
    }
    Ok(words)
}
