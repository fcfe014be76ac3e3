use super::pump::{spawn_line_pump, spawn_stderr_drain};
use super::signal::{send_signal, should_send_sigkill, CancelToken, Signal};
use super::{ExitInfo, ForwarderState, LaunchError, ProcessExited};
use crate::{lock_or_recover, log_debug, log_debug_content};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Lines buffered between the stdout pump and the reader before the pump blocks.
pub(super) const LINE_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_STOP_GRACE: Duration = Duration::from_millis(500);
const REAP_POLL: Duration = Duration::from_millis(20);

/// Result of waiting a bounded time for the next output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineWait {
    Line(String),
    /// Nothing arrived within the timeout; the child may still be running.
    Idle,
    /// Output closed and the child has been reaped.
    Closed,
}

struct ChildSession {
    child: Child,
    pid: u32,
    lines: Receiver<String>,
    exit: Option<ExitInfo>,
    _stdout_pump: thread::JoinHandle<()>,
    _stderr_pump: thread::JoinHandle<()>,
}

/// Owns the packet forwarder child: start it, stream its stdout, notice its exit.
pub struct ForwarderSupervisor {
    program: PathBuf,
    args: Vec<OsString>,
    stop_grace: Duration,
    state: Arc<Mutex<ForwarderState>>,
    cancel: CancelToken,
    session: Option<ChildSession>,
}

impl ForwarderSupervisor {
    /// Supervise `program`, started with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::with_args(program, Vec::<OsString>::new())
    }

    pub fn with_args<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            stop_grace: DEFAULT_STOP_GRACE,
            state: Arc::new(Mutex::new(ForwarderState::NotStarted)),
            cancel: CancelToken::new(),
            session: None,
        }
    }

    /// Time between SIGTERM and SIGKILL in [`ForwarderSupervisor::stop`].
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Spawn the forwarder with stdout and stderr captured.
    pub fn start(&mut self) -> Result<(), LaunchError> {
        if let ForwarderState::Running { pid } = self.state() {
            return Err(LaunchError::AlreadyRunning { pid });
        }
        self.session = None;
        self.cancel.reset();
        *lock_or_recover(&self.state, "forwarder start") = ForwarderState::NotStarted;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| LaunchError::from_spawn(&self.program, err))?;
        let pid = child.id();

        match Self::attach_pumps(&mut child, self.cancel.clone()) {
            Ok((lines, stdout_pump, stderr_pump)) => {
                self.session = Some(ChildSession {
                    child,
                    pid,
                    lines,
                    exit: None,
                    _stdout_pump: stdout_pump,
                    _stderr_pump: stderr_pump,
                });
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(err);
            }
        }

        *lock_or_recover(&self.state, "forwarder start") = ForwarderState::Running { pid };
        tracing::info!(pid, program = %self.program.display(), "forwarder started");
        log_debug(&format!(
            "forwarder: started {} (pid {pid})",
            self.program.display()
        ));
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn attach_pumps(
        child: &mut Child,
        cancel: CancelToken,
    ) -> Result<(Receiver<String>, thread::JoinHandle<()>, thread::JoinHandle<()>), LaunchError>
    {
        let missing = |stream: &'static str| LaunchError::Capture {
            stream,
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe not attached"),
        };
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;
        let (tx, rx) = bounded(LINE_CHANNEL_CAPACITY);
        let stdout_pump = spawn_line_pump(stdout, tx, cancel).map_err(|source| {
            LaunchError::Capture {
                stream: "stdout",
                source,
            }
        })?;
        let stderr_pump = spawn_stderr_drain(stderr).map_err(|source| LaunchError::Capture {
            stream: "stderr",
            source,
        })?;
        Ok((rx, stdout_pump, stderr_pump))
    }

    /// Current lifecycle state; reaps the child if it has exited. Never blocks.
    pub fn state(&mut self) -> ForwarderState {
        self.try_reap();
        *lock_or_recover(&self.state, "forwarder state")
    }

    pub fn is_alive(&mut self) -> bool {
        self.state().is_running()
    }

    /// The exit as an error value, once the child has stopped.
    pub fn exit_error(&mut self) -> Option<ProcessExited> {
        match self.state() {
            ForwarderState::Exited(info) => Some(ProcessExited { info }),
            _ => None,
        }
    }

    /// Handle for stopping the forwarder from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            state: Arc::clone(&self.state),
            cancel: self.cancel.clone(),
        }
    }

    /// Blocking iterator over stdout lines in the order the forwarder wrote
    /// them. It ends when the forwarder closes stdout; by then the child has
    /// been reaped and the state is `Exited`.
    pub fn stream_output(&mut self) -> ForwarderLines<'_> {
        ForwarderLines { supervisor: self }
    }

    /// Wait at most `timeout` for the next stdout line. Never blocks past
    /// `timeout`: a child that closed stdout but is still running reads as
    /// `Idle` until it is reaped.
    pub fn next_line_timeout(&mut self, timeout: Duration) -> LineWait {
        let Some(session) = self.session.as_ref() else {
            return LineWait::Closed;
        };
        let deadline = Instant::now() + timeout;
        match session.lines.recv_timeout(timeout) {
            Ok(line) => {
                surface_line(&line);
                LineWait::Line(line)
            }
            Err(RecvTimeoutError::Timeout) => LineWait::Idle,
            Err(RecvTimeoutError::Disconnected) => self.reap_until(deadline),
        }
    }

    /// Stdout is gone; poll for the exit until `deadline`.
    fn reap_until(&mut self, deadline: Instant) -> LineWait {
        loop {
            if self.try_reap().is_some() {
                return LineWait::Closed;
            }
            let now = Instant::now();
            if now >= deadline {
                return LineWait::Idle;
            }
            thread::sleep(REAP_POLL.min(deadline - now));
        }
    }

    fn next_line_blocking(&mut self) -> Option<String> {
        let session = self.session.as_ref()?;
        match session.lines.recv() {
            Ok(line) => {
                surface_line(&line);
                Some(line)
            }
            Err(_) => {
                self.finish();
                None
            }
        }
    }

    /// Reap without blocking. Holds the state lock across `try_wait` so a
    /// [`StopHandle`] never signals a pid that was already reaped.
    fn try_reap(&mut self) -> Option<ExitInfo> {
        let session = self.session.as_mut()?;
        if let Some(exit) = session.exit {
            return Some(exit);
        }
        let mut state = lock_or_recover(&self.state, "forwarder reap");
        let exit = match session.child.try_wait() {
            Ok(Some(status)) => ExitInfo::from(status),
            Ok(None) => return None,
            Err(err) => {
                log_debug(&format!("forwarder: try_wait failed: {err}"));
                ExitInfo::unknown()
            }
        };
        session.exit = Some(exit);
        *state = ForwarderState::Exited(exit);
        drop(state);
        tracing::warn!(pid = session.pid, exit = %exit, "forwarder exited");
        log_debug(&format!("forwarder: pid {} exited with {exit}", session.pid));
        Some(exit)
    }

    /// Stdout has closed: wait for the child to go away. A pending stop
    /// request escalates to SIGKILL after the grace period.
    fn finish(&mut self) -> Option<ExitInfo> {
        let mut term_seen_at: Option<Instant> = None;
        let mut sigkill_sent = false;
        loop {
            if let Some(exit) = self.try_reap() {
                return Some(exit);
            }
            let pid = self.session.as_ref()?.pid;
            if self.cancel.is_cancelled() {
                let now = Instant::now();
                if term_seen_at.is_none() {
                    term_seen_at = Some(now);
                } else if should_send_sigkill(sigkill_sent, term_seen_at, now, self.stop_grace) {
                    log_debug("forwarder: escalating to SIGKILL");
                    send_signal(pid, Signal::Kill);
                    sigkill_sent = true;
                }
            }
            thread::sleep(REAP_POLL);
        }
    }

    /// Terminate the forwarder: SIGTERM, then SIGKILL after the grace period.
    /// Returns how it ended, or `None` if it was never started.
    pub fn stop(&mut self) -> Option<ExitInfo> {
        if let Some(exit) = self.try_reap() {
            return Some(exit);
        }
        let pid = self.session.as_ref()?.pid;
        self.cancel.cancel();
        log_debug(&format!("forwarder: stopping pid {pid}"));
        send_signal(pid, Signal::Term);

        let deadline = Instant::now() + self.stop_grace;
        while Instant::now() < deadline {
            if let Some(exit) = self.try_reap() {
                return Some(exit);
            }
            thread::sleep(REAP_POLL);
        }

        let session = self.session.as_mut()?;
        let mut state = lock_or_recover(&self.state, "forwarder stop");
        log_debug(&format!("forwarder: pid {pid} ignored SIGTERM; killing"));
        let _ = session.child.kill();
        let exit = session
            .child
            .wait()
            .map(ExitInfo::from)
            .unwrap_or_else(|_| ExitInfo::unknown());
        session.exit = Some(exit);
        *state = ForwarderState::Exited(exit);
        tracing::warn!(pid, exit = %exit, "forwarder killed");
        Some(exit)
    }
}

impl Drop for ForwarderSupervisor {
    fn drop(&mut self) {
        if self.session.as_ref().is_some_and(|s| s.exit.is_none()) {
            let _ = self.stop();
        }
    }
}

fn surface_line(line: &str) {
    tracing::debug!(stream = "stdout", "forwarder output");
    log_debug_content(&format!("forwarder: {line}"));
}

/// Stdout of the running forwarder as a blocking iterator.
pub struct ForwarderLines<'a> {
    supervisor: &'a mut ForwarderSupervisor,
}

impl Iterator for ForwarderLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.supervisor.next_line_blocking()
    }
}

/// Cloneable, `Send` handle that asks the forwarder to terminate.
#[derive(Clone)]
pub struct StopHandle {
    state: Arc<Mutex<ForwarderState>>,
    cancel: CancelToken,
}

impl StopHandle {
    /// Send SIGTERM if the forwarder is running. Returns whether a signal went out.
    /// The supervisor escalates to SIGKILL if the child outlives its grace period.
    pub fn stop(&self) -> bool {
        let state = lock_or_recover(&self.state, "forwarder stop handle");
        match *state {
            ForwarderState::Running { pid } => {
                self.cancel.cancel();
                send_signal(pid, Signal::Term);
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        lock_or_recover(&self.state, "forwarder stop handle").is_running()
    }
}
