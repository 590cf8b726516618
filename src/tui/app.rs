//! TUI Application - main event loop and terminal management
//!
//! This module contains the core TUI application logic including:
//! - Terminal ownership through the handoff orchestrator
//! - Event loop for keyboard input
//! - View switching between the board and the task list
//! - Editing the selected task in an external editor

use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::notifications::NotificationManager;
use super::terminal::{CrosstermTerminal, install_panic_hook};
use super::views::{BOARD_TITLE, BoardView, TASK_LIST_TITLE, TaskListView};
use crate::config::ConfiguredEditor;
use crate::handoff::{
    HandoffOrchestrator, HandoffView, TerminalEditorLauncher, TerminalModeController,
};
use crate::models::Task;
use crate::storage::Storage;
use crate::{Error, Result};

/// How often the loop wakes up without input (toast expiry)
const TICK: Duration = Duration::from_millis(100);

type TuiOrchestrator =
    HandoffOrchestrator<CrosstermTerminal, TerminalEditorLauncher, Storage, ConfiguredEditor>;

/// Active view in the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    Board,
    TaskList,
}

/// TUI Application state
pub struct TuiApp {
    /// Project storage
    storage: Storage,
    /// Name shown in the title bar
    project_name: String,
    /// Whether to quit the application
    should_quit: bool,
    /// Active view
    active_view: ActiveView,
    /// Board view
    board_view: BoardView,
    /// Task list view
    task_list_view: TaskListView,
    /// Toasts
    notifications: NotificationManager,
    /// Flag indicating tasks need reloading
    needs_refresh: bool,
    /// Task the user asked to edit
    pending_edit: Option<String>,
}

impl TuiApp {
    /// Create a new TUI application
    pub fn new(storage: Storage, active_view: ActiveView) -> Self {
        let project_name = storage
            .read_config()
            .ok()
            .and_then(|c| c.project_name)
            .unwrap_or_else(|| "backlog".to_string());
        Self {
            storage,
            project_name,
            should_quit: false,
            active_view,
            board_view: BoardView::new(),
            task_list_view: TaskListView::new(),
            notifications: NotificationManager::new(),
            needs_refresh: true,
            pending_edit: None,
        }
    }

    /// Switch to the next view
    fn next_view(&mut self) {
        self.active_view = match self.active_view {
            ActiveView::Board => ActiveView::TaskList,
            ActiveView::TaskList => ActiveView::Board,
        };
    }

    fn selected_task(&self) -> Option<&Task> {
        match self.active_view {
            ActiveView::Board => self.board_view.selected_task(),
            ActiveView::TaskList => self.task_list_view.selected_task(),
        }
    }

    /// Handle keyboard events
    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            // View switching
            KeyCode::Tab => self.next_view(),
            KeyCode::Char('1') => self.active_view = ActiveView::Board,
            KeyCode::Char('2') => self.active_view = ActiveView::TaskList,
            // Navigation
            KeyCode::Char('j') | KeyCode::Down => match self.active_view {
                ActiveView::Board => self.board_view.select_next(),
                ActiveView::TaskList => self.task_list_view.select_next(),
            },
            KeyCode::Char('k') | KeyCode::Up => match self.active_view {
                ActiveView::Board => self.board_view.select_previous(),
                ActiveView::TaskList => self.task_list_view.select_previous(),
            },
            KeyCode::Char('h') | KeyCode::Left => {
                if self.active_view == ActiveView::Board {
                    self.board_view.select_left();
                }
            }
            KeyCode::Char('l') | KeyCode::Right => {
                if self.active_view == ActiveView::Board {
                    self.board_view.select_right();
                }
            }
            KeyCode::Char('G') | KeyCode::End => match self.active_view {
                ActiveView::Board => self.board_view.select_last(),
                ActiveView::TaskList => self.task_list_view.select_last(),
            },
            KeyCode::Home => match self.active_view {
                ActiveView::Board => self.board_view.select_first(),
                ActiveView::TaskList => self.task_list_view.select_first(),
            },
            KeyCode::Char('r') => self.needs_refresh = true,
            KeyCode::Char('E') | KeyCode::Char('e') => match self.selected_task() {
                Some(task) => self.pending_edit = Some(task.id.clone()),
                None => self.notifications.info("No task selected"),
            },
            KeyCode::Char('x') => self.notifications.dismiss_all(),
            _ => {}
        }
    }

    /// Reload every task from storage
    fn refresh(&mut self) {
        match self.storage.list_tasks() {
            Ok(tasks) => {
                self.board_view.update_tasks(tasks.clone());
                self.task_list_view.update_tasks(tasks);
            }
            Err(e) => self.notifications.error(format!("Failed to load tasks: {}", e)),
        }
        self.needs_refresh = false;
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Min(5),    // Main content
                Constraint::Length(3), // Status bar
            ])
            .split(area);

        self.render_title_bar(frame, chunks[0]);

        match self.active_view {
            ActiveView::Board => self.board_view.render(frame, chunks[1]),
            ActiveView::TaskList => self.task_list_view.render(frame, chunks[1]),
        }

        self.render_status_bar(frame, chunks[2]);
        self.notifications.render(frame, chunks[1]);
    }

    /// Render the title bar with the view switcher
    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let active_style = Style::default().add_modifier(Modifier::BOLD);
        let inactive_style = Style::default().fg(Color::DarkGray);
        let (board_style, list_style) = match self.active_view {
            ActiveView::Board => (active_style, inactive_style),
            ActiveView::TaskList => (inactive_style, active_style),
        };

        let title = Paragraph::new(Line::from(vec![
            Span::styled(format!(" [1] {}", BOARD_TITLE), board_style),
            Span::raw(" | "),
            Span::styled(format!("[2] {}", TASK_LIST_TITLE), list_style),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", self.project_name)),
        );

        frame.render_widget(title, area);
    }

    /// Render the status bar with keybindings
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let hint = match self.active_view {
            ActiveView::Board => " Tab:Switch View  h/l:Column  j/k:Navigate  E:Edit  r:Refresh  q:Quit",
            ActiveView::TaskList => " Tab:Switch View  j/k:Navigate  G/Home:Bottom/Top  E:Edit  r:Refresh  q:Quit",
        };
        let status = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(status, area);
    }
}

impl HandoffView for TuiApp {
    fn on_entity_updated(&mut self, entity: &Task) {
        self.board_view.replace_task(entity);
        self.task_list_view.replace_task(entity);
        self.notifications
            .success(format!("Reloaded {} after editing", entity.id));
    }

    fn on_handoff_failed(&mut self, reason: &Error) {
        self.notifications.report(reason);
    }
}

/// Run the TUI application
///
/// Takes over the terminal until the user quits. A terminal that cannot be
/// restored after an edit ends the session with an error.
pub async fn run_tui(
    storage: Storage,
    active_view: ActiveView,
    editor: ConfiguredEditor,
    working_dir: PathBuf,
) -> Result<()> {
    install_panic_hook();

    let controller = TerminalModeController::start(CrosstermTerminal)?;
    let orchestrator = HandoffOrchestrator::new(
        controller,
        TerminalEditorLauncher,
        storage.clone(),
        editor,
    )
    .with_working_dir(working_dir);

    let mut app = TuiApp::new(storage, active_view);
    let result = event_loop(&orchestrator, &mut app).await;

    let shutdown = orchestrator.shutdown_terminal();
    result?;
    shutdown
}

async fn event_loop(orchestrator: &TuiOrchestrator, app: &mut TuiApp) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    loop {
        if app.needs_refresh {
            app.refresh();
        }
        app.notifications.cleanup();

        terminal.draw(|f| app.render(f))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if let Some(id) = app.pending_edit.take() {
            match orchestrator.edit(&id, app).await {
                Ok(outcome) if !outcome.exit.success() => {
                    app.notifications.warning(format!("Editor {}", outcome.exit));
                }
                Ok(_) => {}
                Err(e @ Error::TerminalModeFailure(_)) => return Err(e),
                // Already reported to the view.
                Err(_) => {}
            }
            // The editor drew over our screen.
            terminal.clear()?;
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use crate::test_utils::TestEnv;

    fn app_with_tasks(env: &TestEnv) -> TuiApp {
        let storage = env.init_storage();
        for title in ["First", "Second"] {
            let task = storage.new_task(title).unwrap();
            storage.create_task(&task).unwrap();
        }
        let mut app = TuiApp::new(storage, ActiveView::Board);
        app.refresh();
        app
    }

    #[test]
    fn test_loads_project_name_and_tasks() {
        let env = TestEnv::new();
        let app = app_with_tasks(&env);
        assert_eq!(app.project_name, "Test Project");
        assert_eq!(app.task_list_view.tasks.len(), 2);
        assert_eq!(app.board_view.column_tasks(TaskStatus::ToDo).len(), 2);
        assert!(!app.needs_refresh);
    }

    #[test]
    fn test_edit_key_requests_selected_task() {
        let env = TestEnv::new();
        let mut app = app_with_tasks(&env);

        app.handle_key(KeyCode::Char('E'));
        assert_eq!(app.pending_edit.as_deref(), Some("task-1"));

        app.pending_edit = None;
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.active_view, ActiveView::TaskList);
        app.handle_key(KeyCode::Char('j'));
        app.handle_key(KeyCode::Char('e'));
        assert_eq!(app.pending_edit.as_deref(), Some("task-2"));
    }

    #[test]
    fn test_edit_key_without_selection() {
        let env = TestEnv::new();
        let mut app = TuiApp::new(env.init_storage(), ActiveView::TaskList);
        app.refresh();
        app.handle_key(KeyCode::Char('E'));
        assert!(app.pending_edit.is_none());
        assert!(app.notifications.has_toasts());
    }

    #[test]
    fn test_quit_keys() {
        let env = TestEnv::new();
        let mut app = app_with_tasks(&env);
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_handoff_view_updates_both_views() {
        let env = TestEnv::new();
        let mut app = app_with_tasks(&env);
        let mut fresh = app.task_list_view.tasks[0].clone();
        fresh.body = "Edited in interactive TUI test\n".to_string();
        fresh.status = TaskStatus::InProgress;

        app.on_entity_updated(&fresh);

        assert_eq!(app.task_list_view.tasks[0].body, fresh.body);
        assert_eq!(
            app.board_view.column_tasks(TaskStatus::InProgress)[0].id,
            "task-1"
        );
        assert!(app.notifications.has_toasts());
    }

    #[test]
    fn test_handoff_failure_is_toasted() {
        let env = TestEnv::new();
        let mut app = app_with_tasks(&env);
        app.on_handoff_failed(&Error::ReintegrationNotFound("task-1".into()));
        let toast = app.notifications.visible_toasts().next().unwrap();
        assert!(toast.message.contains("task-1"));
    }
}
