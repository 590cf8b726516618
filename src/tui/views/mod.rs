//! TUI Views module
//!
//! Contains the board and list views.

mod board;
mod task_list;

pub use board::{BOARD_TITLE, BoardView};
pub use task_list::{TASK_LIST_TITLE, TaskListView};
