//! Supervision of the external packet forwarder.
//!
//! Gateway mode starts one forwarder child, streams its stdout line by line
//! and notices when it goes away. There is no restart policy: an exited
//! forwarder stays exited until Gateway mode is entered again.

mod pump;
mod signal;
mod supervisor;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;

pub use supervisor::{ForwarderLines, ForwarderSupervisor, LineWait, StopHandle};

/// How the forwarder child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitInfo {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub(crate) fn unknown() -> Self {
        Self {
            code: None,
            signal: None,
        }
    }
}

impl From<ExitStatus> for ExitInfo {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;
        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(signal)) => write!(f, "signal {signal}"),
            (None, None) => f.write_str("unknown status"),
        }
    }
}

/// Lifecycle of the supervised child. At most one child is ever `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwarderState {
    NotStarted,
    Running { pid: u32 },
    Exited(ExitInfo),
}

impl ForwarderState {
    pub fn is_running(&self) -> bool {
        matches!(self, ForwarderState::Running { .. })
    }
}

/// The forwarder could not be started.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("forwarder executable not found: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("forwarder executable is not runnable: {}", .path.display())]
    PermissionDenied { path: PathBuf },
    #[error("failed to spawn {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("forwarder already running (pid {pid})")]
    AlreadyRunning { pid: u32 },
    #[error("forwarder {stream} could not be captured: {source}")]
    Capture {
        stream: &'static str,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    pub(crate) fn from_spawn(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => LaunchError::NotFound { path },
            io::ErrorKind::PermissionDenied => LaunchError::PermissionDenied { path },
            _ => LaunchError::Spawn { path, source },
        }
    }

    /// Fits on one line of the status display.
    pub fn short_reason(&self) -> &'static str {
        match self {
            LaunchError::NotFound { .. } => "not found",
            LaunchError::PermissionDenied { .. } => "not executable",
            LaunchError::Spawn { .. } => "spawn failed",
            LaunchError::AlreadyRunning { .. } => "already running",
            LaunchError::Capture { .. } => "no output pipe",
        }
    }
}

/// The forwarder terminated. Reported, never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("forwarder exited with {info}")]
pub struct ProcessExited {
    pub info: ExitInfo,
}
