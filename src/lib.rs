//! Control panel for a single-channel LoRa gateway.
//!
//! Three buttons pick between host stats, running the packet forwarder, and
//! the gateway configuration summary. Each mode draws onto a small status
//! display. The display, the buttons, the host stats and the config file are
//! collaborators behind traits so the controller can run against fakes.

mod app;
pub mod config;
pub mod controller;
pub mod display;
pub mod forwarder;
pub mod gateway_conf;
pub mod input;
mod lock;
pub mod shutdown;
pub mod stats;
mod telemetry;

pub(crate) use lock::lock_or_recover;

pub use app::{
    crash_log_path, init_logging, log_debug, log_debug_content, log_file_path, log_panic,
};
pub use controller::{ControllerTiming, Mode, ModeController};
pub use telemetry::{init_tracing, tracing_log_path};
