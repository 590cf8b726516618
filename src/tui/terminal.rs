//! Crossterm-backed raw mode control.

use std::io::{self, Write, stdout};
use std::sync::Once;

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size,
    },
};

use crate::handoff::{TerminalBackend, TerminalSize};

/// The real terminal on stdout.
///
/// Interactive mode is raw input, the alternate screen and a hidden cursor.
#[derive(Debug, Default)]
pub struct CrosstermTerminal;

impl TerminalBackend for CrosstermTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, Hide)
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        // Undo every step even if one fails, then report the first failure.
        let screen = execute!(stdout(), Show, LeaveAlternateScreen);
        let raw = disable_raw_mode();
        let _ = stdout().flush();
        screen.and(raw)
    }

    fn current_size(&self) -> io::Result<Option<TerminalSize>> {
        let (cols, rows) = size()?;
        Ok(Some(TerminalSize { cols, rows }))
    }
}

/// Put the terminal back in line mode before a panic message is printed.
pub fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = CrosstermTerminal.leave_raw();
            tracing::error!(%panic_info, "panic in interactive view");
            original_hook(panic_info);
        }));
    });
}
