//! Task List View - every task in one flat list
//!
//! Tasks are shown in id order with their status and assignees.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::models::{Task, TaskStatus};

/// Title of the list view
pub const TASK_LIST_TITLE: &str = "Tasks";

/// Style for a status badge
pub fn status_style(status: TaskStatus) -> Style {
    match status {
        TaskStatus::ToDo => Style::default().fg(Color::Yellow),
        TaskStatus::InProgress => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        TaskStatus::Done => Style::default().fg(Color::DarkGray),
    }
}

/// Format assignees for display
pub fn display_assignees(task: &Task) -> String {
    if task.assignee.is_empty() {
        "(unassigned)".to_string()
    } else {
        task.assignee
            .iter()
            .map(|a| format!("@{}", a.trim_start_matches('@')))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Truncate to `width` characters, marking the cut with "..."
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// State for the Task List view
pub struct TaskListView {
    /// All tasks, in id order
    pub tasks: Vec<Task>,
    /// Selected task index
    pub selected: usize,
    /// List widget state
    pub list_state: ListState,
}

impl Default for TaskListView {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskListView {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            tasks: Vec::new(),
            selected: 0,
            list_state,
        }
    }

    /// Replace the tasks, keeping the selection on the same task if possible
    pub fn update_tasks(&mut self, tasks: Vec<Task>) {
        let selected_id = self.selected_task().map(|t| t.id.clone());
        self.tasks = tasks;
        if let Some(idx) = selected_id.and_then(|id| self.tasks.iter().position(|t| t.id == id)) {
            self.selected = idx;
        }
        if self.selected >= self.tasks.len() {
            self.selected = self.tasks.len().saturating_sub(1);
        }
        self.list_state.select(Some(self.selected));
    }

    /// Swap in a fresh copy of one task
    pub fn replace_task(&mut self, task: &Task) {
        if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *existing = task.clone();
        }
    }

    /// Move selection down
    pub fn select_next(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.tasks.len() - 1);
        self.list_state.select(Some(self.selected));
    }

    /// Move selection up
    pub fn select_previous(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        self.selected = self.selected.saturating_sub(1);
        self.list_state.select(Some(self.selected));
    }

    /// Jump to top
    pub fn select_first(&mut self) {
        self.selected = 0;
        self.list_state.select(Some(0));
    }

    /// Jump to bottom
    pub fn select_last(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        self.selected = self.tasks.len() - 1;
        self.list_state.select(Some(self.selected));
    }

    /// Get the currently selected task
    pub fn selected_task(&self) -> Option<&Task> {
        self.tasks.get(self.selected)
    }

    /// Render the view
    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ({}) ", TASK_LIST_TITLE, self.tasks.len()));

        if self.tasks.is_empty() {
            let empty = Paragraph::new("No tasks yet. Create one with `backlog task create`.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        // " > task-12  [In Progress]  title...   @assignee"
        let title_width = area.width.saturating_sub(48) as usize;

        let list_items: Vec<ListItem> = self
            .tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| {
                let selected_marker = if idx == self.selected { ">" } else { " " };
                let line = Line::from(vec![
                    Span::raw(format!(" {} ", selected_marker)),
                    Span::styled(format!("{:<8}", task.id), Style::default().fg(Color::Blue)),
                    Span::raw(" "),
                    Span::styled(
                        format!("{:<13}", format!("[{}]", task.status)),
                        status_style(task.status),
                    ),
                    Span::raw(" "),
                    Span::raw(format!(
                        "{:<width$}",
                        truncate(&task.title, title_width),
                        width = title_width
                    )),
                    Span::styled(
                        format!(" {:>15}", display_assignees(task)),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]);
                let item_style = if idx == self.selected {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(line).style(item_style)
            })
            .collect();

        let list = List::new(list_items).block(block);
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}
