//! Board View - one column per status
//!
//! `h`/`l` move between columns, `j`/`k` within a column.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::task_list::{display_assignees, status_style, truncate};
use crate::models::{Task, TaskStatus};

/// Title of the board view
pub const BOARD_TITLE: &str = "Backlog Board";

/// State for the Board view
pub struct BoardView {
    /// Tasks grouped by status, in `TaskStatus::ALL` order
    columns: Vec<Vec<Task>>,
    /// Selected column
    pub column: usize,
    /// Selected row per column
    rows: Vec<usize>,
}

impl Default for BoardView {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardView {
    pub fn new() -> Self {
        Self {
            columns: vec![Vec::new(); TaskStatus::ALL.len()],
            column: 0,
            rows: vec![0; TaskStatus::ALL.len()],
        }
    }

    /// Regroup tasks into columns, keeping the selected task if it still exists
    pub fn update_tasks(&mut self, tasks: Vec<Task>) {
        let selected_id = self.selected_task().map(|t| t.id.clone());

        for column in &mut self.columns {
            column.clear();
        }
        for task in tasks {
            let idx = column_index(task.status);
            self.columns[idx].push(task);
        }

        if let Some(id) = selected_id {
            self.select_id(&id);
        }
        self.clamp();
    }

    /// Swap in a fresh copy of one task, moving it if its status changed
    pub fn replace_task(&mut self, task: &Task) {
        let was_selected = self.selected_task().is_some_and(|t| t.id == task.id);
        for column in &mut self.columns {
            column.retain(|t| t.id != task.id);
        }
        let target = &mut self.columns[column_index(task.status)];
        let pos = target
            .iter()
            .position(|t| t.number() > task.number())
            .unwrap_or(target.len());
        target.insert(pos, task.clone());

        if was_selected {
            self.select_id(&task.id);
        }
        self.clamp();
    }

    /// Tasks in a status column
    pub fn column_tasks(&self, status: TaskStatus) -> &[Task] {
        &self.columns[column_index(status)]
    }

    /// Get the currently selected task
    pub fn selected_task(&self) -> Option<&Task> {
        self.columns[self.column].get(self.rows[self.column])
    }

    /// Move selection down
    pub fn select_next(&mut self) {
        let len = self.columns[self.column].len();
        if len > 0 {
            self.rows[self.column] = (self.rows[self.column] + 1).min(len - 1);
        }
    }

    /// Move selection up
    pub fn select_previous(&mut self) {
        self.rows[self.column] = self.rows[self.column].saturating_sub(1);
    }

    /// Jump to top of the column
    pub fn select_first(&mut self) {
        self.rows[self.column] = 0;
    }

    /// Jump to bottom of the column
    pub fn select_last(&mut self) {
        self.rows[self.column] = self.columns[self.column].len().saturating_sub(1);
    }

    /// Move to the column on the left
    pub fn select_left(&mut self) {
        self.column = self.column.saturating_sub(1);
    }

    /// Move to the column on the right
    pub fn select_right(&mut self) {
        self.column = (self.column + 1).min(self.columns.len() - 1);
    }

    fn select_id(&mut self, id: &str) {
        for (col, tasks) in self.columns.iter().enumerate() {
            if let Some(row) = tasks.iter().position(|t| t.id == id) {
                self.column = col;
                self.rows[col] = row;
                return;
            }
        }
    }

    fn clamp(&mut self) {
        for (row, tasks) in self.rows.iter_mut().zip(&self.columns) {
            *row = (*row).min(tasks.len().saturating_sub(1));
        }
    }

    /// Render the view
    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let constraints: Vec<Constraint> = TaskStatus::ALL
            .iter()
            .map(|_| Constraint::Ratio(1, TaskStatus::ALL.len() as u32))
            .collect();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (col, status) in TaskStatus::ALL.iter().enumerate() {
            self.render_column(frame, chunks[col], col, *status);
        }
    }

    fn render_column(&self, frame: &mut Frame, area: Rect, col: usize, status: TaskStatus) {
        let tasks = &self.columns[col];
        let focused = col == self.column;
        let border_style = if focused {
            status_style(status)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                format!(" {} ({}) ", status, tasks.len()),
                status_style(status),
            ));

        if tasks.is_empty() {
            let empty = Paragraph::new("(empty)")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let text_width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = tasks
            .iter()
            .enumerate()
            .map(|(row, task)| {
                let selected = focused && row == self.rows[col];
                let lines = vec![
                    Line::from(vec![
                        Span::styled(format!("{} ", task.id), Style::default().fg(Color::Blue)),
                        Span::raw(truncate(
                            &task.title,
                            text_width.saturating_sub(task.id.len() + 1),
                        )),
                    ]),
                    Line::from(Span::styled(
                        truncate(&display_assignees(task), text_width),
                        Style::default().fg(Color::DarkGray),
                    )),
                ];
                let style = if selected {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(lines).style(style)
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}

fn column_index(status: TaskStatus) -> usize {
    TaskStatus::ALL
        .iter()
        .position(|s| *s == status)
        .unwrap_or(0)
}
