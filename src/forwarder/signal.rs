use crate::log_debug;
use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

#[cfg(test)]
use std::sync::atomic::AtomicUsize;

/// Shared "please stop" flag between the supervisor, its pumps and any [`super::StopHandle`].
#[derive(Clone, Debug, Default)]
pub(super) struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub(super) fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub(super) fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Signal {
    Term,
    Kill,
}

/// SIGKILL follows SIGTERM once `grace` has passed, and only once.
pub(super) fn should_send_sigkill(
    sigkill_sent: bool,
    term_sent_at: Option<Instant>,
    now: Instant,
    grace: Duration,
) -> bool {
    if sigkill_sent {
        return false;
    }
    match term_sent_at {
        Some(start) => now.saturating_duration_since(start) >= grace,
        None => false,
    }
}

#[cfg(test)]
static SEND_SIGNAL_FAILURES: AtomicUsize = AtomicUsize::new(0);

#[cfg(test)]
pub(super) fn send_signal_failures() -> usize {
    SEND_SIGNAL_FAILURES.load(Ordering::SeqCst)
}

pub(super) fn send_signal(pid: u32, signal: Signal) {
    #[cfg(unix)]
    {
        let signo = match signal {
            Signal::Term => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
        };
        let Ok(raw_pid) = libc::pid_t::try_from(pid) else {
            log_debug(&format!("forwarder: pid {pid} out of range for kill()"));
            return;
        };
        // SAFETY: kill() only inspects its integer arguments; the pid belongs to
        // a child this supervisor has not reaped yet.
        if unsafe { libc::kill(raw_pid, signo) } != 0 {
            #[cfg(test)]
            SEND_SIGNAL_FAILURES.fetch_add(1, Ordering::SeqCst);
            log_debug(&format!(
                "forwarder: failed to send signal {signo} to pid {pid}: {}",
                io::Error::last_os_error()
            ));
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (pid, signal);
        log_debug("forwarder: signals unsupported on this platform");
    }
}
