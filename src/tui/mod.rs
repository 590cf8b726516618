//! Terminal User Interface module for backlog
//!
//! This module provides the keyboard-driven board and list views. Editing a
//! task hands the terminal to an external editor through
//! [`crate::handoff::HandoffOrchestrator`] and takes it back afterwards.

#[cfg(feature = "tui")]
mod app;
#[cfg(feature = "tui")]
mod notifications;
#[cfg(feature = "tui")]
mod terminal;
#[cfg(feature = "tui")]
mod views;

#[cfg(feature = "tui")]
pub use app::{ActiveView, run_tui};
#[cfg(feature = "tui")]
pub use notifications::{NotificationLevel, NotificationManager, Toast};
#[cfg(feature = "tui")]
pub use terminal::{CrosstermTerminal, install_panic_hook};
#[cfg(feature = "tui")]
pub use views::{BOARD_TITLE, BoardView, TASK_LIST_TITLE, TaskListView};
