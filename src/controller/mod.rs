//! The panel's polling loop.
//!
//! Every poll clears the frame, draws the title and samples the buttons. A
//! press hands the whole display to one mode handler, which runs to
//! completion before the next poll. Gateway mode holds the loop for as long as
//! the forwarder runs; buttons are not read in the meantime.

mod modes;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::config::{
    DEFAULT_DISPLAY_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_STARTUP_TIMEOUT_MS,
    DEFAULT_STOP_GRACE_MS, DEFAULT_TITLE,
};
use crate::display::StatusRenderer;
use crate::forwarder::ForwarderSupervisor;
use crate::input::{Button, InputSource, PressDetector, TriggerMode};
use crate::log_debug;
use crate::shutdown::ShutdownToken;
use crate::stats::StatsCollector;

pub(crate) const TITLE_X: i32 = 15;

/// What the panel is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Stats,
    Gateway,
    Info,
}

impl Mode {
    pub fn for_button(button: Button) -> Self {
        match button {
            Button::A => Mode::Stats,
            Button::B => Mode::Gateway,
            Button::C => Mode::Info,
        }
    }

    /// Banner logged when the mode is entered.
    pub fn banner(self) -> &'static str {
        match self {
            Mode::Idle => "MODE: Idle",
            Mode::Stats => "MODE: Pi Stats",
            Mode::Gateway => "MODE: Pi Gateway",
            Mode::Info => "MODE: Gateway Info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerTiming {
    /// Sleep after an idle frame.
    pub poll_interval: Duration,
    /// How long Stats, Info and failure frames stay up.
    pub display_duration: Duration,
    /// Silence from a live forwarder after which it is shown as running anyway.
    pub startup_timeout: Duration,
    /// SIGTERM to SIGKILL delay when the forwarder is stopped.
    pub stop_grace: Duration,
}

impl Default for ControllerTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            display_duration: Duration::from_millis(DEFAULT_DISPLAY_MS),
            startup_timeout: Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS),
            stop_grace: Duration::from_millis(DEFAULT_STOP_GRACE_MS),
        }
    }
}

pub struct ModeController<R, I, S> {
    renderer: R,
    input: I,
    stats: S,
    forwarder: ForwarderSupervisor,
    config_path: PathBuf,
    timing: ControllerTiming,
    title: String,
    detector: PressDetector,
    shutdown: ShutdownToken,
}

impl<R, I, S> ModeController<R, I, S>
where
    R: StatusRenderer,
    I: InputSource,
    S: StatsCollector,
{
    pub fn new(
        renderer: R,
        input: I,
        stats: S,
        forwarder: ForwarderSupervisor,
        config_path: impl Into<PathBuf>,
        timing: ControllerTiming,
    ) -> Self {
        Self {
            renderer,
            input,
            stats,
            forwarder: forwarder.with_stop_grace(timing.stop_grace),
            config_path: config_path.into(),
            timing,
            title: DEFAULT_TITLE.to_string(),
            detector: PressDetector::new(TriggerMode::default()),
            shutdown: ShutdownToken::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerMode) -> Self {
        self.detector = PressDetector::new(trigger);
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn forwarder_mut(&mut self) -> &mut ForwarderSupervisor {
        &mut self.forwarder
    }

    /// One poll: draw the idle frame, read the buttons, run at most one mode.
    /// Returns the mode that ran, `Mode::Idle` if nothing was pressed.
    pub fn step(&mut self) -> Result<Mode> {
        self.renderer.clear().context("clear display")?;
        self.renderer
            .text(&self.title, TITLE_X, 0)
            .context("draw title")?;
        let buttons = self.input.read().context("read buttons")?;

        let Some(button) = self.detector.observe(buttons) else {
            self.renderer.present().context("present idle frame")?;
            thread::sleep(self.timing.poll_interval);
            return Ok(Mode::Idle);
        };

        let mode = Mode::for_button(button);
        log_debug(mode.banner());
        tracing::info!(button = button.label(), ?mode, "mode selected");
        match mode {
            Mode::Stats => self.show_stats()?,
            Mode::Gateway => self.run_gateway()?,
            Mode::Info => self.show_info()?,
            Mode::Idle => {}
        }
        Ok(mode)
    }

    /// Poll until shutdown is requested. A collaborator failure is drawn as a
    /// diagnostic frame and returned; the forwarder is stopped either way.
    pub fn run(&mut self) -> Result<()> {
        log_debug("controller: polling started");
        let result = loop {
            if self.shutdown.is_requested() {
                break Ok(());
            }
            if let Err(err) = self.step() {
                break Err(err);
            }
        };

        if let Some(exit) = self.forwarder.stop() {
            log_debug(&format!("controller: forwarder ended with {exit}"));
        }
        match result {
            Ok(()) => {
                log_debug("controller: shutdown requested");
                tracing::info!("controller stopped");
                Ok(())
            }
            Err(err) => {
                log_debug(&format!("controller: fatal error: {err:#}"));
                tracing::error!(error = %format!("{err:#}"), "controller failed");
                if let Err(render_err) = self.render_fatal(&err) {
                    log_debug(&format!("controller: diagnostic frame failed: {render_err:#}"));
                }
                Err(err)
            }
        }
    }

    fn render_fatal(&mut self, err: &anyhow::Error) -> Result<()> {
        self.renderer.clear()?;
        self.renderer.text("Error", 0, 0)?;
        self.renderer.text(&err.to_string(), 0, 10)?;
        self.renderer.present()
    }

    /// Sleep in poll-sized slices so a shutdown request cuts a frame short.
    fn hold_frame(&self, duration: Duration) {
        let slice = self.timing.poll_interval.max(Duration::from_millis(1));
        let mut remaining = duration;
        while !remaining.is_zero() && !self.shutdown.is_requested() {
            let nap = remaining.min(slice);
            thread::sleep(nap);
            remaining -= nap;
        }
    }
}
