//! Common test utilities for backlog integration tests.
//!
//! Provides `TestEnv` for isolated test environments whose commands never
//! see the developer's own `BACKLOG_CWD`, `EDITOR` or log settings.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with an isolated project directory.
///
/// The `backlog()` method returns a `Command` running inside the project
/// directory with ambient overrides removed, making tests parallel-safe.
pub struct TestEnv {
    pub project_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an empty project directory.
    pub fn new() -> Self {
        Self {
            project_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and initialize backlog.
    pub fn init() -> Self {
        let env = Self::new();
        env.backlog()
            .args(["init", "--name", "Test Project"])
            .assert()
            .success();
        env
    }

    /// Get a Command for the backlog binary.
    pub fn backlog(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_backlog"));
        cmd.current_dir(self.project_dir.path());
        cmd.env_remove("BACKLOG_CWD");
        cmd.env_remove("BACKLOG_LOG");
        cmd.env_remove("EDITOR");
        cmd
    }

    /// Get the path to the project directory.
    pub fn path(&self) -> &Path {
        self.project_dir.path()
    }

    /// Create a task through the CLI and return its id.
    pub fn create_task(&self, title: &str, body: &str) -> String {
        let output = self
            .backlog()
            .args(["task", "create", title, "--description", body])
            .output()
            .unwrap();
        assert!(output.status.success(), "task create failed: {:?}", output);
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        json["id"].as_str().unwrap().to_string()
    }

    /// Path of the single file holding `id`.
    pub fn task_file(&self, id: &str) -> PathBuf {
        let prefix = format!("{} ", id);
        let exact = format!("{}.md", id);
        fs::read_dir(self.path().join("backlog").join("tasks"))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .find(|path| {
                let name = path.file_name().unwrap().to_string_lossy();
                name.starts_with(&prefix) || name == exact
            })
            .unwrap_or_else(|| panic!("no file for {}", id))
    }

    /// Write an executable shell script and return its path.
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let dir = self.path().join("bin");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
