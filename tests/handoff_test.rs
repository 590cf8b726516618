//! End-to-end editor handoff through the library API.
//!
//! Uses real storage and the real process launcher with a recording
//! terminal backend, so mode switches can be checked against the editor
//! run without a TTY.

#![cfg(unix)]

use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use backlog::config::{ConfigOverrides, ConfiguredEditor};
use backlog::handoff::{
    EditorExit, HandoffOrchestrator, HandoffState, HandoffView, TerminalBackend, TerminalEditorLauncher,
    TerminalMode, TerminalModeController, TerminalSize,
};
use backlog::models::Task;
use backlog::storage::Storage;
use tempfile::TempDir;

#[derive(Clone, Default)]
struct RecordingTerminal {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingTerminal {
    fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

impl TerminalBackend for RecordingTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        self.events.lock().unwrap().push("enter_raw");
        Ok(())
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        self.events.lock().unwrap().push("leave_raw");
        Ok(())
    }

    fn current_size(&self) -> io::Result<Option<TerminalSize>> {
        Ok(Some(TerminalSize { cols: 80, rows: 24 }))
    }
}

#[derive(Default)]
struct View {
    updated: Vec<Task>,
    failures: Vec<String>,
}

impl HandoffView for View {
    fn on_entity_updated(&mut self, entity: &Task) {
        self.updated.push(entity.clone());
    }

    fn on_handoff_failed(&mut self, reason: &backlog::Error) {
        self.failures.push(reason.to_string());
    }
}

fn project_with_task() -> (TempDir, Storage, Task) {
    let dir = TempDir::new().unwrap();
    let storage = Storage::init(dir.path(), "Handoff").unwrap();
    let mut task = storage.new_task("Write docs").unwrap();
    task.body = "Original body\n".to_string();
    storage.create_task(&task).unwrap();
    (dir, storage, task)
}

fn orchestrator(
    storage: &Storage,
    terminal: &RecordingTerminal,
    editor: &str,
) -> HandoffOrchestrator<RecordingTerminal, TerminalEditorLauncher, Storage, ConfiguredEditor> {
    let source = ConfiguredEditor::new(
        storage.clone(),
        ConfigOverrides::new().with_editor(editor),
        None,
    );
    HandoffOrchestrator::new(
        TerminalModeController::start(terminal.clone()).unwrap(),
        TerminalEditorLauncher,
        storage.clone(),
        source,
    )
    .with_working_dir(&storage.project_root)
}

#[tokio::test]
async fn test_edit_cycle_restores_terminal_and_reloads() {
    let (_dir, storage, task) = project_with_task();
    let terminal = RecordingTerminal::default();
    let orch = orchestrator(
        &storage,
        &terminal,
        r#"sh -c 'printf "Edited in interactive TUI test\n" >> "$0"'"#,
    );
    let mut view = View::default();

    let outcome = orch.edit(&task.id, &mut view).await.unwrap();

    assert_eq!(outcome.exit, EditorExit::Code(0));
    assert_eq!(
        outcome.entity.unwrap().body,
        "Original body\nEdited in interactive TUI test\n"
    );
    assert_eq!(view.updated.len(), 1);
    assert!(view.failures.is_empty());
    assert_eq!(terminal.events(), vec!["enter_raw", "leave_raw", "enter_raw"]);
    assert_eq!(orch.terminal_mode(), TerminalMode::Interactive);
    assert_eq!(orch.state(), HandoffState::Idle);

    // Storage sees the same content.
    assert_eq!(
        storage.get_task(&task.id).unwrap().body,
        "Original body\nEdited in interactive TUI test\n"
    );
}

#[tokio::test]
async fn test_signal_exit_restores_terminal() {
    let (_dir, storage, task) = project_with_task();
    let terminal = RecordingTerminal::default();
    let orch = orchestrator(&storage, &terminal, "sh -c 'kill -TERM $$'");

    let outcome = orch.edit(&task.id, &mut View::default()).await.unwrap();

    assert_eq!(outcome.exit, EditorExit::Signal(15));
    assert_eq!(orch.terminal_mode(), TerminalMode::Interactive);
    assert!(outcome.entity.is_some());
}

#[tokio::test]
async fn test_spawn_failure_restores_terminal() {
    let (_dir, storage, task) = project_with_task();
    let terminal = RecordingTerminal::default();
    let orch = orchestrator(&storage, &terminal, "definitely-not-an-editor-4f2a");
    let mut view = View::default();

    let err = orch.edit(&task.id, &mut view).await.unwrap_err();

    assert!(matches!(err, backlog::Error::EditorLaunchFailed { .. }));
    assert_eq!(orch.terminal_mode(), TerminalMode::Interactive);
    assert_eq!(orch.state(), HandoffState::Aborted);
    assert_eq!(terminal.events(), vec!["enter_raw", "leave_raw", "enter_raw"]);
    assert_eq!(view.failures.len(), 1);
}

#[tokio::test]
async fn test_editor_deleting_file_keeps_previous_copy() {
    let (_dir, storage, task) = project_with_task();
    let terminal = RecordingTerminal::default();
    let orch = orchestrator(&storage, &terminal, r#"sh -c 'rm "$0"'"#);
    let mut view = View::default();

    let outcome = orch.edit(&task.id, &mut view).await.unwrap();

    assert!(outcome.entity.is_none());
    assert!(view.updated.is_empty());
    assert_eq!(view.failures.len(), 1);
    assert_eq!(orch.state(), HandoffState::Idle);
}

#[tokio::test]
async fn test_config_change_applies_to_next_handoff() {
    let (_dir, storage, task) = project_with_task();
    let terminal = RecordingTerminal::default();
    let source = ConfiguredEditor::new(storage.clone(), ConfigOverrides::new(), Some("true".into()));
    let orch = HandoffOrchestrator::new(
        TerminalModeController::start(terminal.clone()).unwrap(),
        TerminalEditorLauncher,
        storage.clone(),
        source,
    );

    orch.edit(&task.id, &mut View::default()).await.unwrap();
    let path = storage.task_file_path(&task.id).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let mut config = storage.read_config().unwrap();
    config.default_editor = Some(r#"sh -c 'printf "configured\n" >> "$0"'"#.to_string());
    storage.write_config(&config).unwrap();

    let outcome = orch.edit(&task.id, &mut View::default()).await.unwrap();
    assert_ne!(fs::read_to_string(&path).unwrap(), before);
    assert!(outcome.entity.unwrap().body.ends_with("configured\n"));
}
