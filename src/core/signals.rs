//! Interrupt and resize notifications.
//!
//! The handlers only flip atomic flags (async-signal-safe). The input loop
//! consumes each flag once per poll with `take_interrupt` / `take_resize`.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set by the SIGINT handler.
static INTERRUPT_RECEIVED: AtomicBool = AtomicBool::new(false);
/// Set by the SIGWINCH handler.
static RESIZE_RECEIVED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn handle_sigint(_: libc::c_int) {
    INTERRUPT_RECEIVED.store(true, Ordering::SeqCst);
}

#[cfg(unix)]
extern "C" fn handle_sigwinch(_: libc::c_int) {
    RESIZE_RECEIVED.store(true, Ordering::SeqCst);
}

/// Install the SIGINT and SIGWINCH handlers.
#[cfg(unix)]
pub fn install() -> io::Result<()> {
    let handlers: [(libc::c_int, extern "C" fn(libc::c_int)); 2] = [
        (libc::SIGINT, handle_sigint),
        (libc::SIGWINCH, handle_sigwinch),
    ];

    for (signal, handler) in handlers {
        // SAFETY: the handler is an extern "C" fn whose only effect is an
        // atomic store, which is async-signal-safe.
        let previous = unsafe { libc::signal(signal, handler as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// No signal plumbing off Unix; Ctrl+C arrives as a key instead.
#[cfg(not(unix))]
pub fn install() -> io::Result<()> {
    Ok(())
}

/// Consume a pending interrupt.
pub fn take_interrupt() -> bool {
    INTERRUPT_RECEIVED.swap(false, Ordering::SeqCst)
}

/// Consume a pending resize.
pub fn take_resize() -> bool {
    RESIZE_RECEIVED.swap(false, Ordering::SeqCst)
}
