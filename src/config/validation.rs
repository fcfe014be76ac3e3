use super::defaults::{
    MAX_DISPLAY_MS, MAX_POLL_INTERVAL_MS, MAX_STARTUP_TIMEOUT_MS, MAX_STOP_GRACE_MS,
    MAX_TITLE_CHARS, MIN_POLL_INTERVAL_MS, MIN_STARTUP_TIMEOUT_MS, MIN_STOP_GRACE_MS,
};
use super::{AppConfig, InputKind};
use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values before any hardware or process is touched.
    pub fn validate(&mut self) -> Result<()> {
        validate_path_arg("--forwarder-cmd", &self.forwarder_cmd)?;
        validate_path_arg("--gateway-conf", &self.gateway_conf)?;
        validate_path_arg("--stats-disk-path", &self.stats_disk_path)?;

        self.title = self.title.trim().to_string();
        let title_chars = self.title.chars().count();
        if title_chars == 0 || title_chars > MAX_TITLE_CHARS {
            bail!("--title must be 1-{MAX_TITLE_CHARS} characters, got {title_chars}");
        }
        if self.title.chars().any(char::is_control) {
            bail!("--title cannot contain control characters");
        }

        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            bail!(
                "--poll-interval-ms must be between {MIN_POLL_INTERVAL_MS} and {MAX_POLL_INTERVAL_MS}, got {}",
                self.poll_interval_ms
            );
        }
        if self.display_ms > MAX_DISPLAY_MS {
            bail!(
                "--display-ms must be at most {MAX_DISPLAY_MS}, got {}",
                self.display_ms
            );
        }
        if !(MIN_STARTUP_TIMEOUT_MS..=MAX_STARTUP_TIMEOUT_MS).contains(&self.startup_timeout_ms) {
            bail!(
                "--startup-timeout-ms must be between {MIN_STARTUP_TIMEOUT_MS} and {MAX_STARTUP_TIMEOUT_MS}, got {}",
                self.startup_timeout_ms
            );
        }
        if !(MIN_STOP_GRACE_MS..=MAX_STOP_GRACE_MS).contains(&self.stop_grace_ms) {
            bail!(
                "--stop-grace-ms must be between {MIN_STOP_GRACE_MS} and {MAX_STOP_GRACE_MS}, got {}",
                self.stop_grace_ms
            );
        }

        let [a, b, c] = self.pins();
        if a == b || a == c || b == c {
            bail!("--pin-a, --pin-b and --pin-c must be distinct, got {a}, {b}, {c}");
        }
        if self.input == InputKind::Gpio && !gpio_supported() {
            bail!("--input gpio needs a Linux build with the `gpio` feature");
        }
        Ok(())
    }
}

fn gpio_supported() -> bool {
    cfg!(all(feature = "gpio", target_os = "linux"))
}

fn validate_path_arg(flag: &str, path: &Path) -> Result<()> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        bail!("{flag} cannot be empty");
    }
    if raw.to_string_lossy().contains('\0') {
        bail!("{flag} cannot contain NUL bytes");
    }
    Ok(())
}
