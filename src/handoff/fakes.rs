//! In-memory collaborators for handoff tests.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::launcher::{EditorExit, EditorInvocation, EditorLauncher};
use super::orchestrator::{EditorCommandSource, HandoffView};
use super::terminal::{TerminalBackend, TerminalSize};
use crate::models::Task;
use crate::storage::{EntityStore, Storage};
use crate::{Error, Result};

/// Shared, ordered record of side effects.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Terminal backend that records mode switches.
#[derive(Debug, Clone)]
pub struct FakeTerminal {
    log: EventLog,
    fail_enter: bool,
    fail_leave: bool,
}

impl FakeTerminal {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail_enter: false,
            fail_leave: false,
        }
    }

    pub fn failing_enter(mut self) -> Self {
        self.fail_enter = true;
        self
    }

    pub fn failing_leave(mut self) -> Self {
        self.fail_leave = true;
        self
    }
}

impl TerminalBackend for FakeTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        self.log.push("enter_raw");
        if self.fail_enter {
            return Err(io::Error::other("enter refused"));
        }
        Ok(())
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        self.log.push("leave_raw");
        if self.fail_leave {
            return Err(io::Error::other("leave refused"));
        }
        Ok(())
    }

    fn current_size(&self) -> io::Result<Option<TerminalSize>> {
        Ok(Some(TerminalSize { cols: 120, rows: 40 }))
    }
}

/// What the fake editor does to its target file.
#[derive(Debug, Clone)]
pub enum FakeEdit {
    Nothing,
    Append(String),
    Delete,
}

/// How the fake editor process ends.
#[derive(Debug, Clone, Copy)]
pub enum FakeOutcome {
    Exit(EditorExit),
    SpawnFailure,
    Hang,
}

/// Launcher that edits the target in-process instead of spawning.
#[derive(Debug, Clone)]
pub struct FakeLauncher {
    log: EventLog,
    edit: FakeEdit,
    outcome: FakeOutcome,
    invocations: Arc<Mutex<Vec<EditorInvocation>>>,
}

impl FakeLauncher {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            edit: FakeEdit::Nothing,
            outcome: FakeOutcome::Exit(EditorExit::Code(0)),
            invocations: Arc::default(),
        }
    }

    pub fn editing(mut self, edit: FakeEdit) -> Self {
        self.edit = edit;
        self
    }

    pub fn ending(mut self, outcome: FakeOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn invocations(&self) -> Vec<EditorInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl EditorLauncher for FakeLauncher {
    async fn launch(&self, invocation: EditorInvocation) -> Result<EditorInvocation> {
        self.log.push("launch");
        self.invocations.lock().unwrap().push(invocation.clone());

        let exit = match self.outcome {
            FakeOutcome::SpawnFailure => {
                return Err(Error::EditorLaunchFailed {
                    command: invocation.command().to_string(),
                    reason: "executable not found".to_string(),
                });
            }
            FakeOutcome::Hang => std::future::pending().await,
            FakeOutcome::Exit(exit) => exit,
        };

        // Give concurrent requests a chance to run while the "editor" is open.
        tokio::task::yield_now().await;

        match &self.edit {
            FakeEdit::Nothing => {}
            FakeEdit::Append(text) => {
                let mut contents = std::fs::read_to_string(invocation.target())?;
                contents.push_str(text);
                std::fs::write(invocation.target(), contents)?;
            }
            FakeEdit::Delete => std::fs::remove_file(invocation.target())?,
        }
        self.log.push("editor_exit");
        Ok(invocation.completed(exit))
    }
}

/// Storage wrapper that records reloads.
#[derive(Debug, Clone)]
pub struct RecordingStore {
    inner: Storage,
    log: EventLog,
}

impl RecordingStore {
    pub fn new(inner: Storage, log: &EventLog) -> Self {
        Self {
            inner,
            log: log.clone(),
        }
    }
}

impl EntityStore for RecordingStore {
    fn load_entity(&self, id: &str) -> Result<Option<Task>> {
        self.log.push("load_entity");
        self.inner.load_entity(id)
    }

    fn entity_file_path(&self, id: &str) -> Result<PathBuf> {
        self.inner.entity_file_path(id)
    }
}

/// Fixed editor command.
#[derive(Debug, Clone)]
pub struct StaticEditor(pub Option<String>);

impl StaticEditor {
    pub fn new(command: &str) -> Self {
        Self(Some(command.to_string()))
    }

    pub fn missing() -> Self {
        Self(None)
    }
}

impl EditorCommandSource for StaticEditor {
    fn editor_command(&self) -> Result<String> {
        self.0
            .clone()
            .ok_or_else(|| Error::Config("no editor configured".to_string()))
    }
}

/// View that remembers what it was told.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub updated: Vec<Task>,
    pub failures: Vec<String>,
}

impl HandoffView for RecordingView {
    fn on_entity_updated(&mut self, entity: &Task) {
        self.updated.push(entity.clone());
    }

    fn on_handoff_failed(&mut self, reason: &Error) {
        self.failures.push(reason.to_string());
    }
}
