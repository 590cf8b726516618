//! Command implementations for the Backlog CLI.
//!
//! This module contains the business logic for each CLI command.
//! Commands are organized by area:
//! - `init` / `where` - Project setup and location
//! - `task` - Task creation, listing, display and editing
//! - `config` - Project configuration
//!
//! Every command returns a result type implementing [`Output`], printed as
//! JSON by default or as text with `-H`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{BacklogConfig, CONFIG_KEYS, ConfigOverrides, ConfiguredEditor, CwdResolution};
use crate::handoff::{
    CookedTerminal, EditorExit, HandoffOrchestrator, HandoffView, TerminalEditorLauncher,
    TerminalModeController,
};
use crate::models::{Task, TaskStatus, insert_unique, normalize_task_id};
use crate::storage::Storage;
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Parse a task id argument.
fn parse_id(input: &str) -> Result<String> {
    normalize_task_id(input).ok_or_else(|| Error::InvalidId(input.to_string()))
}

fn parse_status(input: &str) -> Result<TaskStatus> {
    TaskStatus::parse(input).ok_or_else(|| {
        Error::InvalidInput(format!(
            "unknown status '{}' (expected one of: {})",
            input,
            TaskStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })
}

// === Init / Where ===

#[derive(Serialize)]
pub struct InitResult {
    pub initialized: bool,
    pub already_existed: bool,
    pub path: PathBuf,
    pub project_name: Option<String>,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.already_existed {
            format!("Backlog already initialized at {}", self.path.display())
        } else {
            format!(
                "Initialized backlog '{}' at {}",
                self.project_name.as_deref().unwrap_or(""),
                self.path.display()
            )
        }
    }
}

/// Initialize backlog storage in `root`.
pub fn init(root: &Path, name: Option<String>) -> Result<InitResult> {
    let already_existed = Storage::exists(root);
    let name = name.unwrap_or_else(|| {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "backlog".to_string())
    });
    let storage = Storage::init(root, &name)?;
    let config = storage.read_config()?;
    Ok(InitResult {
        initialized: true,
        already_existed,
        path: storage.root,
        project_name: config.project_name,
    })
}

#[derive(Serialize)]
pub struct WhereResult {
    #[serde(flatten)]
    pub resolution: CwdResolution,
    pub initialized: bool,
}

impl Output for WhereResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            self.resolution.cwd.display().to_string(),
            format!(
                "  source: {} ({})",
                self.resolution.source, self.resolution.source_label
            ),
        ];
        if !self.initialized {
            lines.push("  not initialized: run `backlog init`".to_string());
        }
        lines.join("\n")
    }
}

/// Report the resolved working directory.
pub fn locate(resolution: &CwdResolution) -> WhereResult {
    WhereResult {
        resolution: resolution.clone(),
        initialized: Storage::exists(&resolution.cwd),
    }
}

// === Tasks ===

/// Fields for a new task.
#[derive(Debug, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    pub dependencies: Vec<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct TaskCreated {
    pub id: String,
    pub title: String,
    pub path: PathBuf,
}

impl Output for TaskCreated {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Created {} \"{}\"", self.id, self.title)
    }
}

/// Create a task.
pub fn task_create(root: &Path, new: NewTask) -> Result<TaskCreated> {
    let storage = Storage::open(root)?;
    let mut task = storage.new_task(&new.title)?;
    if let Some(status) = new.status.as_deref() {
        task.status = parse_status(status)?;
    }
    for assignee in new.assignees {
        insert_unique(&mut task.assignee, assignee.trim().to_string());
    }
    for label in new.labels {
        insert_unique(&mut task.labels, label.trim().to_string());
    }
    for dep in new.dependencies {
        let dep = parse_id(&dep)?;
        if storage.load_task(&dep)?.is_none() {
            return Err(Error::NotFound(dep));
        }
        insert_unique(&mut task.dependencies, dep);
    }
    if let Some(description) = new.description {
        task.body = description;
    }

    let path = storage.create_task(&task)?;
    Ok(TaskCreated {
        id: task.id,
        title: task.title,
        path,
    })
}

#[derive(Serialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    pub count: usize,
}

impl Output for TaskList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks found.".to_string();
        }
        let mut lines = vec![format!("{} task(s):", self.count)];
        for task in &self.tasks {
            let assignees = if task.assignee.is_empty() {
                String::new()
            } else {
                format!(" @{}", task.assignee.join(" @"))
            };
            lines.push(format!(
                "  {:<8} [{}] {}{}",
                task.id, task.status, task.title, assignees
            ));
        }
        lines.join("\n")
    }
}

/// List tasks, optionally filtered by status and label.
pub fn task_list(root: &Path, status: Option<&str>, label: Option<&str>) -> Result<TaskList> {
    let storage = Storage::open(root)?;
    let status = status.map(parse_status).transpose()?;
    let tasks: Vec<Task> = storage
        .list_tasks()?
        .into_iter()
        .filter(|t| status.is_none_or(|s| t.status == s))
        .filter(|t| label.is_none_or(|l| t.labels.iter().any(|x| x == l)))
        .collect();
    Ok(TaskList {
        count: tasks.len(),
        tasks,
    })
}

#[derive(Serialize)]
pub struct TaskShow {
    #[serde(flatten)]
    pub task: Task,
    pub path: PathBuf,
}

impl Output for TaskShow {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let task = &self.task;
        let mut lines = vec![
            format!("{} - {}", task.id, task.title),
            format!("Status:   {}", task.status),
            format!("Created:  {}", task.created_at.format("%Y-%m-%d %H:%M")),
        ];
        if !task.assignee.is_empty() {
            lines.push(format!("Assignee: {}", task.assignee.join(", ")));
        }
        if !task.labels.is_empty() {
            lines.push(format!("Labels:   {}", task.labels.join(", ")));
        }
        if !task.dependencies.is_empty() {
            lines.push(format!("Depends:  {}", task.dependencies.join(", ")));
        }
        lines.push(format!("File:     {}", self.path.display()));
        if !task.body.trim().is_empty() {
            lines.push(String::new());
            lines.push(task.body.trim_end().to_string());
        }
        lines.join("\n")
    }
}

/// Show one task.
pub fn task_show(root: &Path, id: &str) -> Result<TaskShow> {
    let storage = Storage::open(root)?;
    let id = parse_id(id)?;
    let task = storage.get_task(&id)?;
    let path = storage.task_file_path(&id)?;
    Ok(TaskShow { task, path })
}

#[derive(Serialize)]
pub struct TaskEdited {
    pub id: String,
    pub editor: String,
    pub editor_source: String,
    pub exit: EditorExit,
    pub reloaded: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
}

impl Output for TaskEdited {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![if self.reloaded {
            format!("Edited {} with {}", self.id, self.editor)
        } else {
            format!("Editor closed for {}", self.id)
        }];
        if !self.exit.success() {
            lines.push(format!("  editor {}", self.exit));
        }
        for warning in &self.warnings {
            lines.push(format!("  warning: {}", warning));
        }
        lines.join("\n")
    }
}

/// Line-mode view: collects warnings for the command output.
#[derive(Default)]
struct LineModeView {
    warnings: Vec<String>,
}

impl HandoffView for LineModeView {
    fn on_entity_updated(&mut self, entity: &Task) {
        tracing::debug!(id = %entity.id, "task reloaded");
    }

    fn on_handoff_failed(&mut self, reason: &Error) {
        if !reason.is_fatal() {
            self.warnings.push(reason.to_string());
        }
    }
}

/// Edit a task's file in the external editor, then reload it.
pub async fn task_edit(
    root: &Path,
    id: &str,
    overrides: ConfigOverrides,
    env_editor: Option<String>,
) -> Result<TaskEdited> {
    let storage = Storage::open(root)?;
    let id = parse_id(id)?;
    let editor = ConfiguredEditor::new(storage.clone(), overrides, env_editor);
    let resolved = editor.resolve()?;

    let orchestrator = HandoffOrchestrator::new(
        TerminalModeController::start(CookedTerminal)?,
        TerminalEditorLauncher,
        storage,
        editor,
    )
    .with_working_dir(root);

    let mut view = LineModeView::default();
    let outcome = orchestrator.edit(&id, &mut view).await?;
    orchestrator.shutdown_terminal()?;

    Ok(TaskEdited {
        id: outcome.entity_id,
        editor: resolved.value,
        editor_source: resolved.source.to_string(),
        exit: outcome.exit,
        reloaded: outcome.entity.is_some(),
        warnings: view.warnings,
        task: outcome.entity,
    })
}

// === Config ===

#[derive(Serialize)]
pub struct ConfigValue {
    pub key: String,
    pub value: Option<String>,
}

impl Output for ConfigValue {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match &self.value {
            Some(value) => value.clone(),
            None => format!("{} is not set", self.key),
        }
    }
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "unknown config key '{}' (expected one of: {})",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

/// Get one configuration value.
pub fn config_get(root: &Path, key: &str) -> Result<ConfigValue> {
    let config = Storage::open(root)?.read_config()?;
    let value = config.get(key).ok_or_else(|| unknown_key(key))?;
    Ok(ConfigValue {
        key: key.to_string(),
        value: value.map(str::to_string),
    })
}

/// Set one configuration value.
pub fn config_set(root: &Path, key: &str, value: &str) -> Result<ConfigValue> {
    let storage = Storage::open(root)?;
    let mut config = storage.read_config()?;
    config.set(key, value).map_err(Error::Config)?;
    storage.write_config(&config)?;
    Ok(ConfigValue {
        key: key.to_string(),
        value: Some(value.to_string()),
    })
}

#[derive(Serialize)]
pub struct ConfigList {
    pub config: BacklogConfig,
    pub path: PathBuf,
}

impl Output for ConfigList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("# {}", self.path.display())];
        for key in CONFIG_KEYS {
            match self.config.get(key).flatten() {
                Some(value) => lines.push(format!("{} = {}", key, value)),
                None => lines.push(format!("{} (not set)", key)),
            }
        }
        lines.join("\n")
    }
}

/// List all configuration values.
pub fn config_list(root: &Path) -> Result<ConfigList> {
    let storage = Storage::open(root)?;
    Ok(ConfigList {
        config: storage.read_config()?,
        path: storage.config_path(),
    })
}
