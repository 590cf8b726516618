//! Terminal mode control.
//!
//! The terminal device has one owner at a time: the manager's own rendering
//! (raw mode, `Interactive`) or a child process (line mode, `Suspended`).
//! [`TerminalModeController`] is the only thing allowed to move between the
//! two, and [`SuspendedTerminal`] ties a suspension to a scope so that every
//! exit path resumes.

use std::fmt;
use std::io;
use std::sync::{Mutex, MutexGuard};

use crate::{Error, Result};

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub cols: u16,
    pub rows: u16,
}

/// Device-level raw mode capability.
///
/// `enter_raw` performs whatever setup the interactive view needs (raw mode,
/// alternate screen, hidden cursor); `leave_raw` undoes all of it.
pub trait TerminalBackend {
    fn enter_raw(&mut self) -> io::Result<()>;
    fn leave_raw(&mut self) -> io::Result<()>;
    fn current_size(&self) -> io::Result<Option<TerminalSize>>;
}

/// Backend for a terminal that stays in line mode.
///
/// Used by non-interactive commands: there is no raw mode to give up, so
/// suspending and resuming have no device effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookedTerminal;

impl TerminalBackend for CookedTerminal {
    fn enter_raw(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn leave_raw(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn current_size(&self) -> io::Result<Option<TerminalSize>> {
        Ok(None)
    }
}

/// Who currently owns the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalMode {
    /// Raw mode, owned by the manager's rendering
    Interactive,
    /// Line mode, ceded to a child process
    Suspended,
    /// Released for good; the process is exiting
    Terminated,
}

impl fmt::Display for TerminalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalMode::Interactive => write!(f, "interactive"),
            TerminalMode::Suspended => write!(f, "suspended"),
            TerminalMode::Terminated => write!(f, "terminated"),
        }
    }
}

/// Current terminal mode and last known size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSession {
    pub mode: TerminalMode,
    pub size: Option<TerminalSize>,
}

/// Owner of the terminal session state.
pub struct TerminalModeController<B> {
    backend: B,
    session: TerminalSession,
}

impl<B: TerminalBackend> TerminalModeController<B> {
    /// Put the terminal into raw mode and take ownership of it.
    ///
    /// If entering raw mode fails part way, the device is returned to line
    /// mode before the error is reported.
    pub fn start(mut backend: B) -> Result<Self> {
        if let Err(e) = backend.enter_raw() {
            let _ = backend.leave_raw();
            return Err(Error::TerminalModeFailure(format!(
                "failed to enter raw mode: {}",
                e
            )));
        }
        Ok(Self::adopt(backend))
    }

    /// Wrap a backend that is already in interactive mode.
    pub fn adopt(backend: B) -> Self {
        let size = backend.current_size().ok().flatten();
        Self {
            backend,
            session: TerminalSession {
                mode: TerminalMode::Interactive,
                size,
            },
        }
    }

    pub fn session(&self) -> &TerminalSession {
        &self.session
    }

    pub fn mode(&self) -> TerminalMode {
        self.session.mode
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Hand the terminal over: `Interactive -> Suspended`.
    ///
    /// Calling this in any other mode is a precondition failure. When the
    /// device call fails the session is still marked `Suspended`, so a
    /// following [`resume`](Self::resume) re-establishes raw mode.
    pub fn suspend(&mut self) -> Result<()> {
        if self.session.mode != TerminalMode::Interactive {
            return Err(Error::TerminalModeFailure(format!(
                "cannot suspend a terminal that is {}",
                self.session.mode
            )));
        }

        self.session.mode = TerminalMode::Suspended;
        self.backend.leave_raw().map_err(|e| {
            Error::TerminalModeFailure(format!("failed to leave raw mode: {}", e))
        })?;
        tracing::debug!("terminal suspended");
        Ok(())
    }

    /// Take the terminal back: `Suspended -> Interactive`.
    ///
    /// A no-op when already interactive. If raw mode cannot be re-entered the
    /// partial setup is undone and the session stays `Suspended`, leaving the
    /// terminal in usable line mode.
    pub fn resume(&mut self) -> Result<()> {
        match self.session.mode {
            TerminalMode::Interactive => return Ok(()),
            TerminalMode::Terminated => {
                return Err(Error::TerminalModeFailure(
                    "cannot resume a terminated terminal".to_string(),
                ));
            }
            TerminalMode::Suspended => {}
        }

        if let Err(e) = self.backend.enter_raw() {
            let _ = self.backend.leave_raw();
            return Err(Error::TerminalModeFailure(format!(
                "failed to re-enter raw mode: {}",
                e
            )));
        }
        self.session.mode = TerminalMode::Interactive;
        if let Ok(Some(size)) = self.backend.current_size() {
            self.session.size = Some(size);
        }
        tracing::debug!(size = ?self.session.size, "terminal resumed");
        Ok(())
    }

    /// Release the terminal for good before the process exits.
    ///
    /// From `Suspended` the device is already in line mode and is left alone.
    pub fn shutdown(&mut self) -> Result<()> {
        let previous = self.session.mode;
        self.session.mode = TerminalMode::Terminated;
        if previous == TerminalMode::Interactive {
            self.backend.leave_raw().map_err(|e| {
                Error::TerminalModeFailure(format!("failed to leave raw mode: {}", e))
            })?;
        }
        Ok(())
    }
}

pub(crate) fn lock_controller<B>(
    controller: &Mutex<TerminalModeController<B>>,
) -> MutexGuard<'_, TerminalModeController<B>> {
    controller.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A terminal suspension bound to a scope.
///
/// Created by [`SuspendedTerminal::acquire`]; resumes on [`release`] or,
/// failing that, on drop, so a panic or a cancelled future cannot leave the
/// terminal handed over.
///
/// [`release`]: SuspendedTerminal::release
#[must_use = "dropping the guard resumes the terminal immediately"]
pub struct SuspendedTerminal<'a, B: TerminalBackend> {
    controller: &'a Mutex<TerminalModeController<B>>,
    released: bool,
}

impl<'a, B: TerminalBackend> SuspendedTerminal<'a, B> {
    /// Suspend the terminal. On failure a best-effort resume is attempted
    /// before the error is returned.
    pub fn acquire(controller: &'a Mutex<TerminalModeController<B>>) -> Result<Self> {
        let mut guard = lock_controller(controller);
        if let Err(e) = guard.suspend() {
            if guard.mode() == TerminalMode::Suspended {
                if let Err(cleanup) = guard.resume() {
                    tracing::warn!(error = %cleanup, "resume after failed suspend also failed");
                }
            }
            return Err(e);
        }
        Ok(Self {
            controller,
            released: false,
        })
    }

    /// Resume the terminal, reporting failure.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        lock_controller(self.controller).resume()
    }
}

impl<B: TerminalBackend> Drop for SuspendedTerminal<'_, B> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = lock_controller(self.controller).resume() {
            tracing::warn!(error = %e, "failed to resume terminal while unwinding");
        }
    }
}
