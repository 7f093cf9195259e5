//! Cooperative shutdown on SIGINT/SIGTERM/SIGHUP, or Ctrl-C/Ctrl-Break and
//! console close on Windows.
//!
//! The handler only flips an atomic; the monitor loop polls it between
//! frames and performs the key release itself.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Async-signal-safe: touches nothing but the flag.
fn mark_shutdown_requested() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

#[cfg(unix)]
extern "C" fn handle_shutdown_signal(_: libc::c_int) {
    mark_shutdown_requested();
}

#[cfg(unix)]
pub fn install_shutdown_handlers() -> Result<()> {
    use anyhow::anyhow;

    for signal in [libc::SIGINT, libc::SIGTERM, libc::SIGHUP] {
        unsafe {
            // SAFETY: handle_shutdown_signal is an extern "C" handler whose only
            // effect is an atomic store, which is async-signal-safe.
            let handler = handle_shutdown_signal as *const () as libc::sighandler_t;
            if libc::signal(signal, handler) == libc::SIG_ERR {
                return Err(anyhow!("failed to install handler for signal {signal}"));
            }
        }
    }
    Ok(())
}

/// Without a console handler the default action kills the process before
/// the held key can be released, so failing to install one is fatal.
#[cfg(not(unix))]
pub fn install_shutdown_handlers() -> Result<()> {
    use anyhow::Context;

    ctrlc::set_handler(mark_shutdown_requested)
        .context("failed to install console control handler")
}

/// Flag polled by the monitor loop.
pub fn shutdown_flag() -> &'static AtomicBool {
    &SHUTDOWN_REQUESTED
}
