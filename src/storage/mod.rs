//! Storage layer for Backlog data.
//!
//! A project keeps its data inside the project root:
//!
//! ```text
//! <root>/backlog/
//!   config.kdl          project configuration
//!   tasks/
//!     task-1 - Write-docs.md
//!     task-2 - Ship-it.md
//! ```
//!
//! Task files are plain markdown with front matter (see [`markdown`]), so an
//! external editor can change them directly. The handoff subsystem reaches
//! storage through the [`EntityStore`] trait.

pub mod markdown;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use kdl::KdlDocument;

use crate::config::BacklogConfig;
use crate::models::{Task, normalize_task_id, task_number, TASK_ID_PREFIX};
use crate::{Error, Result};

/// Name of the data directory inside a project root.
pub const BACKLOG_DIR: &str = "backlog";

/// Name of the tasks directory inside the data directory.
pub const TASKS_DIR: &str = "tasks";

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "config.kdl";

/// Storage collaborator used by the editor handoff.
pub trait EntityStore {
    /// Load an entity by identifier, `None` when it does not exist.
    fn load_entity(&self, id: &str) -> Result<Option<Task>>;

    /// Absolute path of the file holding the entity.
    fn entity_file_path(&self, id: &str) -> Result<PathBuf>;
}

/// Storage manager for a single project.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Project root (the resolved working directory)
    pub project_root: PathBuf,
    /// Data directory (`<project_root>/backlog`)
    pub root: PathBuf,
}

impl Storage {
    /// Open storage for an initialized project.
    pub fn open(project_root: &Path) -> Result<Self> {
        let storage = Self::at(project_root);
        if !storage.tasks_dir().is_dir() {
            return Err(Error::NotInitialized);
        }
        Ok(storage)
    }

    /// Initialize storage for a project, creating directories and config.
    ///
    /// Re-initializing keeps existing tasks and only fills in a missing
    /// project name.
    pub fn init(project_root: &Path, project_name: &str) -> Result<Self> {
        let storage = Self::at(project_root);
        fs::create_dir_all(storage.tasks_dir())?;

        let mut config = storage.read_config()?;
        if config.project_name.is_none() {
            config.project_name = Some(project_name.to_string());
        }
        storage.write_config(&config)?;

        tracing::info!(root = %storage.root.display(), "initialized backlog storage");
        Ok(storage)
    }

    /// Check if storage exists for the given project.
    pub fn exists(project_root: &Path) -> bool {
        Self::at(project_root).tasks_dir().is_dir()
    }

    fn at(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            root: project_root.join(BACKLOG_DIR),
        }
    }

    /// Directory holding task files.
    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join(TASKS_DIR)
    }

    /// Path to the project configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    // === Configuration ===

    /// Read the project configuration, returning defaults when absent.
    pub fn read_config(&self) -> Result<BacklogConfig> {
        let path = self.config_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BacklogConfig::default()),
            Err(e) => return Err(e.into()),
        };
        let doc: KdlDocument = text
            .parse()
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(BacklogConfig::from_kdl(&doc))
    }

    /// Write the project configuration.
    pub fn write_config(&self, config: &BacklogConfig) -> Result<()> {
        config.validate().map_err(Error::Config)?;
        fs::create_dir_all(&self.root)?;
        fs::write(self.config_path(), config.to_kdl().to_string())?;
        Ok(())
    }

    // === Tasks ===

    /// Build a new task with the next free identifier (not yet persisted).
    pub fn new_task(&self, title: &str) -> Result<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("task title cannot be empty".to_string()));
        }
        Ok(Task::new(self.next_task_id()?, title.to_string()))
    }

    /// Next sequential task identifier.
    pub fn next_task_id(&self) -> Result<String> {
        let max = self
            .task_files()?
            .iter()
            .filter_map(|(id, _)| task_number(id))
            .max()
            .unwrap_or(0);
        Ok(format!("{}{}", TASK_ID_PREFIX, max + 1))
    }

    /// Persist a new task. Fails if the identifier is already taken.
    pub fn create_task(&self, task: &Task) -> Result<PathBuf> {
        let id = normalize_task_id(&task.id).ok_or_else(|| Error::InvalidId(task.id.clone()))?;
        if self.find_task_file(&id)?.is_some() {
            return Err(Error::InvalidInput(format!("task {} already exists", id)));
        }
        let path = self.tasks_dir().join(task_file_name(&id, &task.title));
        self.write_task_file(&path, task)?;
        tracing::debug!(id = %id, path = %path.display(), "created task");
        Ok(path)
    }

    /// Overwrite an existing task in place.
    pub fn save_task(&self, task: &Task) -> Result<PathBuf> {
        let path = self.task_file_path(&task.id)?;
        self.write_task_file(&path, task)?;
        Ok(path)
    }

    /// Load a task, `None` when no file exists for it.
    pub fn load_task(&self, id: &str) -> Result<Option<Task>> {
        let Some(path) = self.find_task_file(id)? else {
            return Ok(None);
        };
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        markdown::decode_task(&contents)
            .map(Some)
            .map_err(|reason| Error::InvalidTaskFile { path, reason })
    }

    /// Load a task, failing with `NotFound` when it does not exist.
    pub fn get_task(&self, id: &str) -> Result<Task> {
        self.load_task(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Absolute path of an existing task's file.
    pub fn task_file_path(&self, id: &str) -> Result<PathBuf> {
        self.find_task_file(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Load every readable task, ordered by task number.
    ///
    /// Unreadable files are skipped with a warning rather than failing the
    /// whole listing.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for (id, path) in self.task_files()? {
            match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| markdown::decode_task(&c))
            {
                Ok(task) => tasks.push(task),
                Err(reason) => {
                    tracing::warn!(id = %id, path = %path.display(), %reason, "skipping unreadable task file");
                }
            }
        }
        tasks.sort_by_key(|t| (t.number().unwrap_or(u64::MAX), t.id.clone()));
        Ok(tasks)
    }

    fn write_task_file(&self, path: &Path, task: &Task) -> Result<()> {
        let contents = markdown::encode_task(task).map_err(|reason| Error::InvalidTaskFile {
            path: path.to_path_buf(),
            reason,
        })?;
        fs::create_dir_all(self.tasks_dir())?;
        fs::write(path, contents)?;
        Ok(())
    }

    fn find_task_file(&self, id: &str) -> Result<Option<PathBuf>> {
        let id = normalize_task_id(id).ok_or_else(|| Error::InvalidId(id.to_string()))?;
        Ok(self
            .task_files()?
            .into_iter()
            .find(|(file_id, _)| *file_id == id)
            .map(|(_, path)| path))
    }

    /// `(id, path)` for every task file in the tasks directory.
    fn task_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let dir = self.tasks_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::NotInitialized),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(id_from_file_stem)
            {
                files.push((id, path));
            }
        }
        Ok(files)
    }
}

impl EntityStore for Storage {
    fn load_entity(&self, id: &str) -> Result<Option<Task>> {
        self.load_task(id)
    }

    fn entity_file_path(&self, id: &str) -> Result<PathBuf> {
        let path = self.task_file_path(id)?;
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(std::env::current_dir()?.join(path))
        }
    }
}

/// File name for a task: `task-1 - Title-Slug.md`.
pub fn task_file_name(id: &str, title: &str) -> String {
    let slug: String = title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        format!("{}.md", id)
    } else {
        format!("{} - {}.md", id, slug)
    }
}

/// Identifier encoded in a task file stem, if any.
fn id_from_file_stem(stem: &str) -> Option<String> {
    let head = stem.split(" - ").next().unwrap_or(stem);
    normalize_task_id(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_open_requires_init() {
        let env = TestEnv::new();
        assert!(matches!(Storage::open(env.path()), Err(Error::NotInitialized)));
        assert!(!Storage::exists(env.path()));

        env.init_storage();
        assert!(Storage::exists(env.path()));
        assert!(Storage::open(env.path()).is_ok());
    }

    #[test]
    fn test_init_writes_project_name() {
        let env = TestEnv::new();
        let storage = env.init_storage();
        let config = storage.read_config().unwrap();
        assert_eq!(config.project_name.as_deref(), Some("Test Project"));
    }

    #[test]
    fn test_reinit_keeps_existing_name() {
        let env = TestEnv::new();
        env.init_storage();
        let storage = Storage::init(env.path(), "Other").unwrap();
        assert_eq!(
            storage.read_config().unwrap().project_name.as_deref(),
            Some("Test Project")
        );
    }

    #[test]
    fn test_sequential_ids() {
        let env = TestEnv::new();
        let storage = env.init_storage();
        let first = storage.new_task("First").unwrap();
        storage.create_task(&first).unwrap();
        let second = storage.new_task("Second").unwrap();
        assert_eq!(first.id, "task-1");
        assert_eq!(second.id, "task-2");
    }

    #[test]
    fn test_create_and_load() {
        let env = TestEnv::new();
        let (storage, task) = env.with_task("Write docs", "Body text\n");

        let path = storage.task_file_path("task-1").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "task-1 - Write-docs.md"
        );

        let loaded = storage.load_task("1").unwrap().unwrap();
        assert_eq!(loaded, task);
    }

    #[test]
    fn test_duplicate_create_rejected() {
        let env = TestEnv::new();
        let (storage, task) = env.with_task("Once", "");
        assert!(matches!(
            storage.create_task(&task),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_load_missing_returns_none() {
        let env = TestEnv::new();
        let storage = env.init_storage();
        assert!(storage.load_task("task-9").unwrap().is_none());
        assert!(matches!(
            storage.task_file_path("task-9"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_load_after_delete_returns_none() {
        let env = TestEnv::new();
        let (storage, _) = env.with_task("Doomed", "");
        fs::remove_file(storage.task_file_path("task-1").unwrap()).unwrap();
        assert!(storage.load_task("task-1").unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_error() {
        let env = TestEnv::new();
        let (storage, _) = env.with_task("Corrupt", "");
        fs::write(storage.task_file_path("task-1").unwrap(), "garbage").unwrap();
        assert!(matches!(
            storage.load_task("task-1"),
            Err(Error::InvalidTaskFile { .. })
        ));
    }

    #[test]
    fn test_save_task_updates_in_place() {
        let env = TestEnv::new();
        let (storage, mut task) = env.with_task("Update me", "");
        task.status = TaskStatus::Done;
        storage.save_task(&task).unwrap();
        assert_eq!(storage.get_task("task-1").unwrap().status, TaskStatus::Done);
    }

    #[test]
    fn test_list_tasks_ordered_and_skips_garbage() {
        let env = TestEnv::new();
        let storage = env.init_storage();
        for title in ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"] {
            let task = storage.new_task(title).unwrap();
            storage.create_task(&task).unwrap();
        }
        fs::write(storage.tasks_dir().join("task-99 - Broken.md"), "nope").unwrap();
        fs::write(storage.tasks_dir().join("notes.md"), "not a task").unwrap();

        let ids: Vec<String> = storage.list_tasks().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(ids.first().map(String::as_str), Some("task-1"));
        assert_eq!(ids.last().map(String::as_str), Some("task-10"));
    }

    #[test]
    fn test_entity_store_paths_are_absolute() {
        let env = TestEnv::new();
        let (storage, _) = env.with_task("Abs", "");
        assert!(storage.entity_file_path("task-1").unwrap().is_absolute());
    }

    #[test]
    fn test_task_file_name_slug() {
        assert_eq!(task_file_name("task-3", "Fix: the  bug!"), "task-3 - Fix-the-bug.md");
        assert_eq!(task_file_name("task-4", "???"), "task-4.md");
    }

    #[test]
    fn test_empty_title_rejected() {
        let env = TestEnv::new();
        let storage = env.init_storage();
        assert!(matches!(storage.new_task("  "), Err(Error::InvalidInput(_))));
    }
}
