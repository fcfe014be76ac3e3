//! Entry point: wire the panel's collaborators from the command line and run the loop.

use anyhow::Result;
use std::panic;

use lora_panel::config::{AppConfig, DisplayKind, InputKind};
use lora_panel::display::{ConsoleRenderer, LogRenderer, StatusRenderer};
use lora_panel::forwarder::ForwarderSupervisor;
use lora_panel::input::{InputSource, StdinButtons};
use lora_panel::shutdown::install_shutdown_handler;
use lora_panel::stats::HostStats;
use lora_panel::{
    init_logging, init_tracing, log_debug, log_debug_content, log_file_path, log_panic,
    tracing_log_path, ModeController,
};

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    init_tracing(&config);
    install_panic_hook();
    log_debug("=== LoRa panel started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));
    log_debug(&format!("Trace file: {:?}", tracing_log_path()));

    let shutdown = install_shutdown_handler()?;
    let renderer = build_renderer(config.display);
    let input = build_input(&config)?;
    let stats = HostStats::new(&config.stats_disk_path);
    let forwarder = ForwarderSupervisor::new(&config.forwarder_cmd);
    tracing::info!(
        forwarder = %config.forwarder_cmd.display(),
        gateway_conf = %config.gateway_conf.display(),
        trigger = ?config.trigger,
        input = ?config.input,
        "panel starting"
    );

    let mut controller = ModeController::new(
        renderer,
        input,
        stats,
        forwarder,
        &config.gateway_conf,
        config.timing(),
    )
    .with_title(config.title.clone())
    .with_trigger(config.trigger)
    .with_shutdown(shutdown);

    let result = controller.run();
    log_debug("=== LoRa panel exiting ===");
    result
}

fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        log_debug(&format!("panic at {location}"));
        log_debug_content(&format!("panic: {info}"));
        previous(info);
    }));
}

fn build_renderer(kind: DisplayKind) -> Box<dyn StatusRenderer> {
    match kind {
        DisplayKind::Console => Box::new(ConsoleRenderer::stdout()),
        DisplayKind::Log => Box::new(LogRenderer::new()),
    }
}

fn build_input(config: &AppConfig) -> Result<Box<dyn InputSource>> {
    match config.input {
        InputKind::Stdin => {
            eprintln!("Type a, b or c then Enter to press buttons A, B or C.");
            Ok(Box::new(StdinButtons::spawn()))
        }
        InputKind::Gpio => open_gpio(config),
    }
}

#[cfg(all(feature = "gpio", target_os = "linux"))]
fn open_gpio(config: &AppConfig) -> Result<Box<dyn InputSource>> {
    use anyhow::Context;
    let buttons = lora_panel::input::GpioButtons::open(&config.gpio_chip, config.pins())
        .with_context(|| format!("open buttons on {}", config.gpio_chip.display()))?;
    Ok(Box::new(buttons))
}

#[cfg(not(all(feature = "gpio", target_os = "linux")))]
fn open_gpio(config: &AppConfig) -> Result<Box<dyn InputSource>> {
    anyhow::bail!(
        "--input gpio needs a Linux build with the `gpio` feature (chip {})",
        config.gpio_chip.display()
    )
}
