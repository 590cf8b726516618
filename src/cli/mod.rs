//! CLI argument definitions for Backlog.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Version string shown by `--version`.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BACKLOG_GIT_COMMIT"),
    " ",
    env!("BACKLOG_BUILD_TIMESTAMP"),
    ")"
);

/// Backlog - a terminal task manager with board and list views.
///
/// Start with `backlog init`, add work with `backlog task create`, then open
/// `backlog board`.
#[derive(Parser, Debug)]
#[command(name = "backlog")]
#[command(author, version = VERSION, about = "A terminal task manager with board and list views", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if backlog was started in <DIR> instead of the current directory.
    /// Relative paths are resolved against the current directory.
    /// Overrides the BACKLOG_CWD environment variable.
    #[arg(long = "cwd", global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Editor command for this run (overrides config.kdl and EDITOR)
    #[arg(long, global = true, value_name = "COMMAND")]
    pub editor: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize backlog in the working directory
    Init {
        /// Project name shown in the views (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show the resolved working directory and where it came from
    Where,

    /// Task management commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Open the interactive board
    Board,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a new task
    Create {
        /// Task title
        title: String,

        /// Task body (markdown)
        #[arg(short, long)]
        description: Option<String>,

        /// Assignee (repeatable)
        #[arg(short, long)]
        assignee: Vec<String>,

        /// Label (repeatable)
        #[arg(short, long)]
        label: Vec<String>,

        /// Task this one depends on (repeatable)
        #[arg(long = "dep")]
        dependencies: Vec<String>,

        /// Initial status ("To Do", "In Progress", "Done")
        #[arg(short, long)]
        status: Option<String>,
    },

    /// List tasks
    ///
    /// Opens the interactive list when stdout is a terminal and no filter is
    /// given. Otherwise prints the tasks.
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Filter by label
        #[arg(long)]
        label: Option<String>,

        /// Print the list even when attached to a terminal
        #[arg(long)]
        plain: bool,
    },

    /// Show task details
    Show {
        /// Task ID (e.g., task-1 or 1)
        id: String,
    },

    /// Edit a task in the external editor
    Edit {
        /// Task ID (e.g., task-1 or 1)
        id: String,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// List all configuration values
    List,
}

/// Whether `task list` should open the interactive view.
pub fn list_is_interactive(plain: bool, filtered: bool, stdout_is_terminal: bool) -> bool {
    stdout_is_terminal && !plain && !filtered
}
