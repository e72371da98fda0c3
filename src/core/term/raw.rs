//! Raw terminal mode
//!
//! On Unix only canonical mode and local echo are switched off, with
//! `VMIN = 0` / `VTIME = 0` so reads return immediately. Signal generation
//! stays on, so Ctrl+C still raises SIGINT.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerminalError {
    #[error("Failed to read terminal attributes: {0}")]
    GetAttributes(#[source] io::Error),

    #[error("Failed to set terminal attributes: {0}")]
    SetAttributes(#[source] io::Error),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Raw mode guard; the previous terminal mode is restored on drop
pub struct RawMode {
    #[cfg(unix)]
    original: libc::termios,
    active: bool,
}

impl RawMode {
    /// Switch stdin to raw mode
    #[cfg(unix)]
    pub fn enter() -> Result<Self, TerminalError> {
        // SAFETY: termios is a plain C struct; an all-zero value is valid
        // storage for tcgetattr to fill in.
        let mut term: libc::termios = unsafe { std::mem::zeroed() };

        // SAFETY: `term` is a valid, writable termios and STDIN_FILENO is an
        // open descriptor for the lifetime of the process.
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &mut term) } != 0 {
            return Err(TerminalError::GetAttributes(io::Error::last_os_error()));
        }

        let original = term;
        term.c_lflag &= !(libc::ICANON | libc::ECHO);
        term.c_cc[libc::VMIN] = 0;
        term.c_cc[libc::VTIME] = 0;

        // SAFETY: `term` was produced by tcgetattr and only flag bits changed.
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &term) } != 0 {
            return Err(TerminalError::SetAttributes(io::Error::last_os_error()));
        }

        tracing::debug!("Raw mode enabled");
        Ok(Self {
            original,
            active: true,
        })
    }

    /// Switch stdin to raw mode
    #[cfg(not(unix))]
    pub fn enter() -> Result<Self, TerminalError> {
        crossterm::terminal::enable_raw_mode().map_err(TerminalError::SetAttributes)?;
        tracing::debug!("Raw mode enabled");
        Ok(Self { active: true })
    }

    /// Restore the saved mode. Safe to call more than once.
    pub fn exit(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        #[cfg(unix)]
        {
            // SAFETY: `original` is the unmodified struct read by tcgetattr.
            let rc = unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &self.original) };
            if rc != 0 {
                tracing::warn!("Failed to restore terminal mode: {}", io::Error::last_os_error());
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = crossterm::terminal::disable_raw_mode() {
                tracing::warn!("Failed to restore terminal mode: {}", e);
            }
        }

        tracing::debug!("Raw mode disabled");
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        self.exit();
    }
}
