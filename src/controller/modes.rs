use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthChar;

use super::{ModeController, TITLE_X};
use crate::display::{StatusRenderer, DISPLAY_WIDTH};
use crate::forwarder::LineWait;
use crate::gateway_conf::GatewayConfig;
use crate::input::InputSource;
use crate::log_debug;
use crate::stats::{StatsCollector, StatsQuery};

/// Columns of the panel font (6 px per glyph).
pub(super) const LINE_COLS: usize = (DISPLAY_WIDTH / 6) as usize;

/// Quiet period after the forwarder exits before its leftover output is abandoned.
const EXIT_DRAIN_WAIT: Duration = Duration::from_millis(50);
/// Upper bound on that drain while something else keeps the pipe busy.
const EXIT_DRAIN_LIMIT: Duration = Duration::from_secs(1);

/// Stats lines and their y offsets. Hostname and disk are collected but not drawn.
const STATS_LAYOUT: [(StatsQuery, i32); 3] = [
    (StatsQuery::IpAddress, 0),
    (StatsQuery::CpuLoad, 15),
    (StatsQuery::Memory, 25),
];

impl<R, I, S> ModeController<R, I, S>
where
    R: StatusRenderer,
    I: InputSource,
    S: StatsCollector,
{
    pub(super) fn show_stats(&mut self) -> Result<()> {
        self.renderer.clear().context("clear display")?;
        let snapshot = self.stats.snapshot();
        for failure in snapshot.failures() {
            log_debug(&format!("stats: {failure}"));
            tracing::warn!(query = %failure.query, reason = %failure.reason, "stats query failed");
        }
        let hostname = snapshot.display_line(StatsQuery::Hostname);
        let disk = snapshot.display_line(StatsQuery::Disk);
        log_debug(&format!("stats: host {hostname}, {disk}"));
        tracing::info!(hostname = %hostname, disk = %disk, "host stats collected");

        for (query, y) in STATS_LAYOUT {
            self.renderer
                .text(&snapshot.display_line(query), 0, y)
                .context("draw stats")?;
        }
        self.renderer.present().context("present stats")?;
        self.hold_frame(self.timing.display_duration);
        Ok(())
    }

    pub(super) fn show_info(&mut self) -> Result<()> {
        self.renderer.clear().context("clear display")?;
        let loaded = GatewayConfig::load(&self.config_path).and_then(|config| {
            let address = config.primary_server()?.address.clone();
            Ok((config, address))
        });
        let (config, address) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                log_debug(&format!("info: {err}"));
                tracing::warn!(path = %self.config_path.display(), error = %err, "gateway config unusable");
                self.render_notice("Config error", err.short_reason())?;
                self.hold_frame(self.timing.display_duration);
                return Ok(());
            }
        };

        let freq = config.frequency_label();
        log_debug(&format!(
            "info: server {address}, freq {freq} MHz, SF {}, name {}",
            config.spread_factor, config.gateway_name
        ));
        tracing::info!(
            server = %address,
            freq_mhz = config.frequency_mhz(),
            spread_factor = config.spread_factor,
            gateway = %config.gateway_name,
            "gateway info"
        );

        let sf = config.spread_factor.to_string();
        let frame = [
            (freq.as_str(), 0, 0),
            ("MHz", 30, 0),
            ("SF: ", 65, 0),
            (sf.as_str(), 85, 0),
            (config.gateway_name.as_str(), 0, 10),
            (address.as_str(), 0, 20),
        ];
        for (text, x, y) in frame {
            self.renderer.text(text, x, y).context("draw gateway info")?;
        }
        self.renderer.present().context("present gateway info")?;
        self.hold_frame(self.timing.display_duration);
        Ok(())
    }

    /// Start the forwarder and mirror its output until it stops or shutdown
    /// is requested. Failures are shown on the panel, then control returns.
    pub(super) fn run_gateway(&mut self) -> Result<()> {
        self.renderer.clear().context("clear display")?;
        self.renderer
            .text("Starting Gateway...", TITLE_X, 0)
            .context("draw gateway banner")?;
        self.renderer.present().context("present gateway banner")?;

        if let Err(err) = self.forwarder.start() {
            log_debug(&format!("gateway: {err}"));
            tracing::error!(error = %err, "forwarder launch failed");
            self.render_notice("Gateway failed", err.short_reason())?;
            self.hold_frame(self.timing.display_duration);
            return Ok(());
        }

        let started = Instant::now();
        let mut shown_running = false;
        loop {
            if self.shutdown.is_requested() {
                if let Some(exit) = self.forwarder.stop() {
                    log_debug(&format!("gateway: stopped on shutdown ({exit})"));
                }
                return Ok(());
            }
            match self.forwarder.next_line_timeout(self.timing.poll_interval) {
                LineWait::Line(line) => {
                    self.render_running(Some(&line))?;
                    shown_running = true;
                }
                LineWait::Idle => {
                    if !self.forwarder.is_alive() {
                        self.drain_after_exit()?;
                        break;
                    }
                    if !shown_running
                        && started.elapsed() >= self.timing.startup_timeout
                    {
                        log_debug("gateway: no output yet, forwarder alive");
                        self.render_running(None)?;
                        shown_running = true;
                    }
                }
                LineWait::Closed => break,
            }
        }

        let summary = self
            .forwarder
            .exit_error()
            .map(|exited| {
                log_debug(&format!("gateway: {exited}"));
                exited.info.to_string()
            })
            .unwrap_or_else(|| "output closed".to_string());
        tracing::warn!(exit = %summary, "forwarder stopped");
        self.render_notice("Forwarder stopped", &summary)?;
        self.hold_frame(self.timing.display_duration);
        Ok(())
    }

    /// The child is reaped but its stdout may still be open (a background
    /// process inherited it). Show what it wrote before exiting, then stop
    /// waiting once the pipe goes quiet or the drain budget runs out.
    fn drain_after_exit(&mut self) -> Result<()> {
        let deadline = Instant::now() + EXIT_DRAIN_LIMIT;
        while Instant::now() < deadline {
            match self.forwarder.next_line_timeout(EXIT_DRAIN_WAIT) {
                LineWait::Line(line) => self.render_running(Some(&line))?,
                LineWait::Idle | LineWait::Closed => break,
            }
        }
        log_debug("gateway: forwarder exited");
        Ok(())
    }

    fn render_running(&mut self, last_line: Option<&str>) -> Result<()> {
        self.renderer.clear().context("clear display")?;
        self.renderer
            .text("Gateway running", TITLE_X, 0)
            .context("draw gateway status")?;
        if let Some(line) = last_line {
            self.renderer
                .text(&fit_line(line), 0, 10)
                .context("draw forwarder output")?;
        }
        self.renderer.present().context("present gateway status")
    }

    /// Two-line status frame: a heading and a short detail.
    fn render_notice(&mut self, heading: &str, detail: &str) -> Result<()> {
        self.renderer.clear().context("clear display")?;
        self.renderer.text(heading, 0, 0).context("draw notice")?;
        self.renderer.text(detail, 0, 10).context("draw notice")?;
        self.renderer.present().context("present notice")
    }
}

/// Forwarder output as one panel line: escape sequences and control
/// characters removed, cut to the panel width.
pub(super) fn fit_line(raw: &str) -> String {
    let plain = strip_ansi_escapes::strip_str(raw);
    let mut out = String::new();
    let mut cols = 0;
    for ch in plain.chars().filter(|ch| !ch.is_control()) {
        let width = ch.width().unwrap_or(0);
        if cols + width > LINE_COLS {
            break;
        }
        cols += width;
        out.push(ch);
    }
    out
}
