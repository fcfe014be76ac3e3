//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::controller::ControllerTiming;
use crate::input::TriggerMode;

pub use defaults::{
    default_input_kind, DEFAULT_DISPLAY_MS, DEFAULT_FORWARDER_CMD, DEFAULT_GATEWAY_CONF,
    DEFAULT_GPIO_CHIP, DEFAULT_PIN_A, DEFAULT_PIN_B, DEFAULT_PIN_C, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_STARTUP_TIMEOUT_MS, DEFAULT_STOP_GRACE_MS, DEFAULT_TITLE,
};

/// CLI options for the gateway panel. Validated before anything touches hardware.
#[derive(Debug, Parser, Clone)]
#[command(about = "LoRa gateway control panel", author, version)]
pub struct AppConfig {
    /// Packet forwarder executable started in Gateway mode
    #[arg(long = "forwarder-cmd", env = "LORA_PANEL_FORWARDER", default_value = DEFAULT_FORWARDER_CMD)]
    pub forwarder_cmd: PathBuf,

    /// Gateway configuration document read in Info mode
    #[arg(long = "gateway-conf", env = "LORA_PANEL_GATEWAY_CONF", default_value = DEFAULT_GATEWAY_CONF)]
    pub gateway_conf: PathBuf,

    /// Title drawn on the idle frame
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Delay between button polls (milliseconds)
    #[arg(long = "poll-interval-ms", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// How long Stats and Info frames stay up (milliseconds)
    #[arg(long = "display-ms", default_value_t = DEFAULT_DISPLAY_MS)]
    pub display_ms: u64,

    /// Wait for the forwarder's first output line before showing it as running (milliseconds)
    #[arg(long = "startup-timeout-ms", default_value_t = DEFAULT_STARTUP_TIMEOUT_MS)]
    pub startup_timeout_ms: u64,

    /// Time between SIGTERM and SIGKILL when stopping the forwarder (milliseconds)
    #[arg(long = "stop-grace-ms", default_value_t = DEFAULT_STOP_GRACE_MS)]
    pub stop_grace_ms: u64,

    /// Fire a mode on every poll while held (level) or once per press (edge)
    #[arg(long, value_enum, default_value_t = TriggerMode::Level)]
    pub trigger: TriggerMode,

    /// Where button presses come from
    #[arg(long, value_enum, default_value_t = default_input_kind())]
    pub input: InputKind,

    /// GPIO character device holding the button lines
    #[arg(long = "gpio-chip", default_value = DEFAULT_GPIO_CHIP)]
    pub gpio_chip: PathBuf,

    /// GPIO line for button A (stats)
    #[arg(long = "pin-a", default_value_t = DEFAULT_PIN_A)]
    pub pin_a: u32,

    /// GPIO line for button B (gateway)
    #[arg(long = "pin-b", default_value_t = DEFAULT_PIN_B)]
    pub pin_b: u32,

    /// GPIO line for button C (gateway info)
    #[arg(long = "pin-c", default_value_t = DEFAULT_PIN_C)]
    pub pin_c: u32,

    /// Where frames are presented
    #[arg(long, value_enum, default_value_t = DisplayKind::Console)]
    pub display: DisplayKind,

    /// Filesystem whose usage is reported in Stats mode
    #[arg(long = "stats-disk-path", default_value = "/")]
    pub stats_disk_path: PathBuf,

    /// Enable file logging (debug + JSON trace)
    #[arg(long = "logs", env = "LORA_PANEL_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "LORA_PANEL_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Also log raw forwarder output lines
    #[arg(long = "log-content", env = "LORA_PANEL_LOG_CONTENT", default_value_t = false)]
    pub log_content: bool,
}

/// Button source selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputKind {
    /// Type `a`, `b` or `c` followed by Enter.
    Stdin,
    /// Bonnet buttons on GPIO lines (requires the `gpio` feature).
    Gpio,
}

/// Frame sink selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DisplayKind {
    /// Draw frames as text on stdout.
    Console,
    /// Emit each frame as a trace event.
    Log,
}

impl AppConfig {
    pub fn logging_enabled(&self) -> bool {
        self.logs && !self.no_logs
    }

    /// Intervals the controller sleeps and waits on.
    pub fn timing(&self) -> ControllerTiming {
        ControllerTiming {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            display_duration: Duration::from_millis(self.display_ms),
            startup_timeout: Duration::from_millis(self.startup_timeout_ms),
            stop_grace: Duration::from_millis(self.stop_grace_ms),
        }
    }

    /// Button lines in A, B, C order. Pull-ups are not requested here; the boot
    /// overlay has to provide them.
    pub fn pins(&self) -> [u32; 3] {
        [self.pin_a, self.pin_b, self.pin_c]
    }
}
