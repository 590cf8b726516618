//! Backlog CLI - a terminal task manager with board and list views.

use std::future::Future;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::process;

use backlog::cli::{Cli, Commands, ConfigCommands, TaskCommands, list_is_interactive};
use backlog::commands::{self, NewTask, Output};
use backlog::config::{
    ConfigOverrides, CwdOptions, EDITOR_ENV, RuntimeEnv, resolve_runtime_cwd,
};
use backlog::logging;
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    // Keep the guard alive so buffered log lines are flushed on exit.
    let _log_guard = logging::init_logging();

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "command failed");
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), backlog::Error> {
    let human = cli.human_readable;

    // Environment is read once here; everything below works from snapshots.
    let env = RuntimeEnv::capture()?;
    let resolution = resolve_runtime_cwd(&CwdOptions { cwd: cli.cwd }, &env)?;
    let root = resolution.cwd.as_path();

    let overrides = match cli.editor {
        Some(editor) => ConfigOverrides::new().with_editor(editor),
        None => ConfigOverrides::new(),
    };
    let env_editor = std::env::var(EDITOR_ENV).ok();

    match cli.command {
        Some(Commands::Init { name }) => {
            let result = commands::init(root, name)?;
            output(&result, human);
        }

        Some(Commands::Where) => {
            output(&commands::locate(&resolution), human);
        }

        Some(Commands::Task { command }) => match command {
            TaskCommands::Create {
                title,
                description,
                assignee,
                label,
                dependencies,
                status,
            } => {
                let result = commands::task_create(
                    root,
                    NewTask {
                        title,
                        description,
                        assignees: assignee,
                        labels: label,
                        dependencies,
                        status,
                    },
                )?;
                output(&result, human);
            }
            TaskCommands::List {
                status,
                label,
                plain,
            } => {
                let filtered = status.is_some() || label.is_some();
                let terminal = cfg!(feature = "tui") && io::stdout().is_terminal();
                if list_is_interactive(plain, filtered, terminal) {
                    run_interactive(root, Interactive::TaskList, overrides, env_editor)?;
                } else {
                    let result = commands::task_list(root, status.as_deref(), label.as_deref())?;
                    output(&result, human);
                }
            }
            TaskCommands::Show { id } => {
                let result = commands::task_show(root, &id)?;
                output(&result, human);
            }
            TaskCommands::Edit { id } => {
                let result = block_on(commands::task_edit(root, &id, overrides, env_editor))??;
                output(&result, human);
            }
        },

        Some(Commands::Board) => {
            run_interactive(root, Interactive::Board, overrides, env_editor)?;
        }

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Get { key } => {
                let result = commands::config_get(root, &key)?;
                output(&result, human);
            }
            ConfigCommands::Set { key, value } => {
                let result = commands::config_set(root, &key, &value)?;
                output(&result, human);
            }
            ConfigCommands::List => {
                let result = commands::config_list(root)?;
                output(&result, human);
            }
        },

        None => {
            // Default: list tasks, or explain how to get started
            match commands::task_list(root, None, None) {
                Ok(list) => output(&list, human),
                Err(backlog::Error::NotInitialized) => {
                    if human {
                        println!("Backlog - Not initialized.");
                        println!(
                            "Run `backlog init` to initialize, then `backlog task create \"Title\"` to add tasks."
                        );
                    } else {
                        println!(r#"{{"initialized": false, "tasks": []}}"#);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Run a future to completion on a single-threaded runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output, backlog::Error> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| backlog::Error::Other(format!("Failed to create runtime: {}", e)))?;
    Ok(runtime.block_on(future))
}

#[derive(Clone, Copy)]
enum Interactive {
    Board,
    TaskList,
}

#[cfg(feature = "tui")]
fn run_interactive(
    root: &Path,
    view: Interactive,
    overrides: ConfigOverrides,
    env_editor: Option<String>,
) -> Result<(), backlog::Error> {
    use backlog::config::ConfiguredEditor;
    use backlog::storage::Storage;
    use backlog::tui::{ActiveView, run_tui};

    let storage = Storage::open(root)?;
    let editor = ConfiguredEditor::new(storage.clone(), overrides, env_editor);
    let view = match view {
        Interactive::Board => ActiveView::Board,
        Interactive::TaskList => ActiveView::TaskList,
    };
    block_on(run_tui(storage, view, editor, root.to_path_buf()))?
}

#[cfg(not(feature = "tui"))]
fn run_interactive(
    _root: &Path,
    _view: Interactive,
    _overrides: ConfigOverrides,
    _env_editor: Option<String>,
) -> Result<(), backlog::Error> {
    Err(backlog::Error::Other(
        "interactive views require the `tui` feature".to_string(),
    ))
}
