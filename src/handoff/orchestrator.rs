//! The edit action: suspend, launch, resume, reload.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use super::launcher::{EditorExit, EditorInvocation, EditorLauncher};
use super::reintegrate::{Reintegration, reintegrate};
use super::terminal::{
    SuspendedTerminal, TerminalBackend, TerminalMode, TerminalModeController, lock_controller,
};
use crate::models::Task;
use crate::storage::EntityStore;
use crate::{Error, Result};

/// Environment variable carrying the edited task's id to the editor.
pub const TASK_ID_ENV: &str = "BACKLOG_TASK_ID";

/// Environment variable carrying the edited file's path to the editor.
pub const TASK_FILE_ENV: &str = "BACKLOG_TASK_FILE";

/// Where the orchestrator is in an edit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffState {
    Idle,
    Suspending,
    EditorRunning,
    Reintegrating,
    /// The last cycle failed; new requests are accepted
    Aborted,
}

impl HandoffState {
    /// Whether a cycle is currently in progress.
    pub fn in_flight(&self) -> bool {
        matches!(
            self,
            HandoffState::Suspending | HandoffState::EditorRunning | HandoffState::Reintegrating
        )
    }
}

impl fmt::Display for HandoffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HandoffState::Idle => "idle",
            HandoffState::Suspending => "suspending",
            HandoffState::EditorRunning => "editor_running",
            HandoffState::Reintegrating => "reintegrating",
            HandoffState::Aborted => "aborted",
        };
        write!(f, "{}", s)
    }
}

/// Supplies the editor command, resolved fresh for each handoff.
pub trait EditorCommandSource {
    fn editor_command(&self) -> Result<String>;
}

/// The view that asked for an edit.
pub trait HandoffView {
    /// The entity was reloaded from storage.
    fn on_entity_updated(&mut self, entity: &Task);

    /// The handoff failed, or finished with a warning.
    fn on_handoff_failed(&mut self, reason: &Error);
}

/// Result of a completed handoff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandoffOutcome {
    pub entity_id: String,
    pub exit: EditorExit,
    /// Fresh copy, `None` when the entity could not be reloaded
    pub entity: Option<Task>,
}

#[derive(Debug)]
struct StateCell {
    state: HandoffState,
    entity_id: Option<String>,
}

fn lock_state(cell: &Mutex<StateCell>) -> MutexGuard<'_, StateCell> {
    cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Marks one cycle as in flight; returns the state to `Idle` if the cycle
/// is dropped before it finishes.
struct InFlight<'a> {
    cell: &'a Mutex<StateCell>,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn begin(cell: &'a Mutex<StateCell>, id: &str) -> Result<Self> {
        let mut guard = lock_state(cell);
        if guard.state.in_flight() {
            return Err(Error::HandoffBusy {
                in_flight: guard.entity_id.clone().unwrap_or_default(),
            });
        }
        guard.state = HandoffState::Suspending;
        guard.entity_id = Some(id.to_string());
        tracing::debug!(id = %id, "handoff: suspending");
        Ok(Self {
            cell,
            finished: false,
        })
    }

    fn advance(&self, state: HandoffState) {
        lock_state(self.cell).state = state;
        tracing::debug!(%state, "handoff: transition");
    }

    fn finish(mut self, state: HandoffState) {
        self.finished = true;
        let mut guard = lock_state(self.cell);
        guard.state = state;
        guard.entity_id = None;
        tracing::debug!(%state, "handoff: finished");
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut guard = lock_state(self.cell);
        guard.state = HandoffState::Idle;
        guard.entity_id = None;
        tracing::debug!("handoff: cancelled");
    }
}

/// Runs the edit action against one terminal.
///
/// Only one handoff runs at a time; a request that arrives while another
/// is in progress is rejected with [`Error::HandoffBusy`].
pub struct HandoffOrchestrator<B, L, S, E> {
    state: Mutex<StateCell>,
    terminal: Mutex<TerminalModeController<B>>,
    launcher: L,
    store: S,
    editor: E,
    env: BTreeMap<String, String>,
    working_dir: Option<PathBuf>,
}

impl<B, L, S, E> HandoffOrchestrator<B, L, S, E>
where
    B: TerminalBackend,
    L: EditorLauncher,
    S: EntityStore,
    E: EditorCommandSource,
{
    pub fn new(terminal: TerminalModeController<B>, launcher: L, store: S, editor: E) -> Self {
        Self {
            state: Mutex::new(StateCell {
                state: HandoffState::Idle,
                entity_id: None,
            }),
            terminal: Mutex::new(terminal),
            launcher,
            store,
            editor,
            env: BTreeMap::new(),
            working_dir: None,
        }
    }

    /// Extra environment for every editor process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Working directory for editor processes. Defaults to the directory
    /// holding the edited file.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn state(&self) -> HandoffState {
        lock_state(&self.state).state
    }

    pub fn terminal_mode(&self) -> TerminalMode {
        lock_controller(&self.terminal).mode()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release the terminal for good.
    pub fn shutdown_terminal(&self) -> Result<()> {
        lock_controller(&self.terminal).shutdown()
    }

    /// Hand the terminal to an editor for `id`, then take it back and
    /// reload the entity.
    ///
    /// Any editor exit, including a signal, completes the cycle. A reload
    /// that finds nothing is reported to the view as a warning and still
    /// returns `Ok`. Other failures leave the orchestrator `Aborted`.
    pub async fn edit<V>(&self, id: &str, view: &mut V) -> Result<HandoffOutcome>
    where
        V: HandoffView + ?Sized,
    {
        let flight = InFlight::begin(&self.state, id)?;
        match self.run(id, &flight, view).await {
            Ok(outcome) => {
                flight.finish(HandoffState::Idle);
                Ok(outcome)
            }
            Err(e) => {
                flight.finish(HandoffState::Aborted);
                tracing::warn!(id = %id, error = %e, "editor handoff aborted");
                view.on_handoff_failed(&e);
                Err(e)
            }
        }
    }

    async fn run<V>(&self, id: &str, flight: &InFlight<'_>, view: &mut V) -> Result<HandoffOutcome>
    where
        V: HandoffView + ?Sized,
    {
        let command = self.editor.editor_command()?;
        let target = self.store.entity_file_path(id)?;
        let invocation = self.prepare(&command, id, &target)?;

        let suspended = SuspendedTerminal::acquire(&self.terminal)?;
        flight.advance(HandoffState::EditorRunning);
        let launched = self.launcher.launch(invocation).await;
        let resumed = suspended.release();

        let finished = match (launched, resumed) {
            (Ok(finished), Ok(())) => finished,
            (Err(e), resumed) => {
                if let Err(resume_err) = resumed {
                    tracing::warn!(error = %resume_err, "terminal did not resume after failed launch");
                }
                return Err(e);
            }
            (Ok(_), Err(e)) => return Err(e),
        };
        let exit = finished.exit().unwrap_or(EditorExit::Code(0));

        flight.advance(HandoffState::Reintegrating);
        let entity = match reintegrate(&self.store, id) {
            Reintegration::Refreshed(task) => {
                view.on_entity_updated(&task);
                Some(task)
            }
            Reintegration::NotFound => {
                view.on_handoff_failed(&Error::ReintegrationNotFound(id.to_string()));
                None
            }
        };

        Ok(HandoffOutcome {
            entity_id: id.to_string(),
            exit,
            entity,
        })
    }

    fn prepare(&self, command: &str, id: &str, target: &Path) -> Result<EditorInvocation> {
        let cwd = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => target
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let mut invocation = EditorInvocation::new(command, target, &cwd)?;
        for (key, value) in &self.env {
            invocation = invocation.with_env(key.clone(), value.clone());
        }
        Ok(invocation
            .with_env(TASK_ID_ENV, id)
            .with_env(TASK_FILE_ENV, target.display().to_string()))
    }
}
