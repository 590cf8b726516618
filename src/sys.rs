//! System utilities for signal handling.
//!
//! While an external editor owns the terminal it shares our foreground
//! process group, so an interrupt typed at the editor reaches both
//! processes. The editor should handle it; we should not die from it.
//! [`shield_interrupts`] marks that window.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Exit status used when an unshielded interrupt ends the process.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

static SHIELD_DEPTH: AtomicUsize = AtomicUsize::new(0);
static HANDLER_INSTALLED: OnceLock<bool> = OnceLock::new();

/// Install the process-wide interrupt handler, once.
///
/// Outside a shielded window the handler exits with
/// [`INTERRUPTED_EXIT_CODE`], matching the default `SIGINT` behaviour.
/// Returns whether the handler is active.
pub fn install_interrupt_handler() -> bool {
    *HANDLER_INSTALLED.get_or_init(|| {
        let result = ctrlc::set_handler(|| {
            if SHIELD_DEPTH.load(Ordering::SeqCst) == 0 {
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        });
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "could not install interrupt handler");
                false
            }
        }
    })
}

/// Whether interrupts are currently being left to a child process.
pub fn interrupts_shielded() -> bool {
    SHIELD_DEPTH.load(Ordering::SeqCst) > 0
}

/// Keeps interrupts from terminating this process while alive.
#[must_use = "interrupts are only shielded while the guard is alive"]
#[derive(Debug)]
pub struct InterruptShield {
    _private: (),
}

/// Start ignoring interrupts until the returned guard is dropped.
pub fn shield_interrupts() -> InterruptShield {
    install_interrupt_handler();
    SHIELD_DEPTH.fetch_add(1, Ordering::SeqCst);
    InterruptShield { _private: () }
}

impl Drop for InterruptShield {
    fn drop(&mut self) {
        SHIELD_DEPTH.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Human-readable name for a signal number (e.g. `SIGINT`).
#[cfg(unix)]
pub fn signal_name(signal: i32) -> String {
    nix::sys::signal::Signal::try_from(signal)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| format!("signal {}", signal))
}

#[cfg(not(unix))]
pub fn signal_name(signal: i32) -> String {
    format!("signal {}", signal)
}

/// Whether the signal number is an interrupt from the terminal.
#[cfg(unix)]
pub fn is_interrupt(signal: i32) -> bool {
    signal == nix::sys::signal::Signal::SIGINT as i32
}

#[cfg(not(unix))]
pub fn is_interrupt(_signal: i32) -> bool {
    false
}
