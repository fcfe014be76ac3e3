//! SIGINT/SIGTERM handling for the panel's main loop.

use anyhow::{anyhow, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::log_debug;

/// Set from the signal handler; read by tokens tied to process signals.
static SHUTDOWN_SIGNALLED: AtomicBool = AtomicBool::new(false);

/// Only touches an atomic, so it is async-signal-safe.
extern "C" fn handle_shutdown_signal(_: libc::c_int) {
    SHUTDOWN_SIGNALLED.store(true, Ordering::SeqCst);
}

/// Route SIGINT and SIGTERM to a flag and return a token that observes it.
pub fn install_shutdown_handler() -> Result<ShutdownToken> {
    for (signo, name) in [(libc::SIGINT, "SIGINT"), (libc::SIGTERM, "SIGTERM")] {
        unsafe {
            // SAFETY: handle_shutdown_signal only stores to an atomic flag.
            let handler = handle_shutdown_signal as *const () as libc::sighandler_t;
            if libc::signal(signo, handler) == libc::SIG_ERR {
                log_debug(&format!("failed to install {name} handler"));
                return Err(anyhow!("failed to install {name} handler"));
            }
        }
    }
    Ok(ShutdownToken::for_process_signals())
}

/// Cooperative stop request checked between polls and while the forwarder streams.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    requested: Arc<AtomicBool>,
    process_signals: bool,
}

impl ShutdownToken {
    /// A token only [`ShutdownToken::request`] can trip.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also trips when the process receives SIGINT or SIGTERM.
    pub fn for_process_signals() -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            process_signals: true,
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
            || (self.process_signals && SHUTDOWN_SIGNALLED.load(Ordering::SeqCst))
    }
}
