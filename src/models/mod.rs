//! Data models for Backlog entities.
//!
//! A `Task` is the only editable entity. Its structured fields live in the
//! task file's front matter; the free-text `body` follows it and is the part
//! an external editor is expected to change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every task identifier.
pub const TASK_ID_PREFIX: &str = "task-";

/// Task status in the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    /// All statuses in board column order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Done];

    /// Parse from string, ignoring case, spaces, dashes and underscores.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "todo" => Some(TaskStatus::ToDo),
            "inprogress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Display label, as written to task files.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A work item tracked by Backlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (e.g., "task-1")
    pub id: String,

    /// Task title
    pub title: String,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Assigned users or agents
    #[serde(default)]
    pub assignee: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Labels for categorization
    #[serde(default)]
    pub labels: Vec<String>,

    /// Task IDs this task depends on
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Free-text body, edited externally
    #[serde(default)]
    pub body: String,
}

impl Task {
    /// Create a new task with the given ID and title.
    pub fn new(id: String, title: String) -> Self {
        Self {
            id,
            title,
            status: TaskStatus::default(),
            assignee: Vec::new(),
            created_at: Utc::now(),
            labels: Vec::new(),
            dependencies: Vec::new(),
            body: String::new(),
        }
    }

    /// Numeric part of the identifier, used for ordering.
    pub fn number(&self) -> Option<u64> {
        task_number(&self.id)
    }
}

/// Extract the numeric suffix of a `task-<n>` identifier.
pub fn task_number(id: &str) -> Option<u64> {
    id.strip_prefix(TASK_ID_PREFIX)?.parse().ok()
}

/// Normalize user input into a task identifier.
///
/// Accepts `task-7`, `TASK-7` and bare `7`.
pub fn normalize_task_id(input: &str) -> Option<String> {
    let trimmed = input.trim().to_lowercase();
    let number = if trimmed.chars().all(|c| c.is_ascii_digit()) {
        trimmed.parse::<u64>().ok()?
    } else {
        task_number(&trimmed)?
    };
    Some(format!("{}{}", TASK_ID_PREFIX, number))
}

/// Push a value into a set-like vector, keeping it free of duplicates.
pub fn insert_unique(values: &mut Vec<String>, value: impl Into<String>) {
    let value = value.into();
    if !values.contains(&value) {
        values.push(value);
    }
}
