//! Handing the terminal to an external editor and taking it back.
//!
//! The interactive views render in raw mode. To edit a task body they lend
//! the terminal to an editor process:
//!
//! 1. [`TerminalModeController`] leaves raw mode (`Interactive -> Suspended`)
//! 2. [`EditorLauncher`] runs the editor attached to the real terminal
//! 3. The terminal is resumed, whatever the editor's exit status
//! 4. [`reintegrate`] reloads the task and the view is notified
//!
//! [`HandoffOrchestrator`] composes the steps and keeps at most one cycle
//! in flight.

pub mod launcher;
pub mod orchestrator;
pub mod reintegrate;
pub mod terminal;

#[cfg(test)]
pub(crate) mod fakes;

pub use launcher::{
    EditorExit, EditorInvocation, EditorLauncher, TerminalEditorLauncher, split_command,
};
pub use orchestrator::{
    EditorCommandSource, HandoffOrchestrator, HandoffOutcome, HandoffState, HandoffView,
    TASK_FILE_ENV, TASK_ID_ENV,
};
pub use reintegrate::{Reintegration, reintegrate};
pub use terminal::{
    CookedTerminal, SuspendedTerminal, TerminalBackend, TerminalMode, TerminalModeController,
    TerminalSession, TerminalSize,
};
