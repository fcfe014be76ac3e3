use super::InputKind;

pub const DEFAULT_FORWARDER_CMD: &str = "./single_chan_pkt_fwd";
pub const DEFAULT_GATEWAY_CONF: &str = "global_conf.json";
pub const DEFAULT_TITLE: &str = "LoRaWAN Gateway";
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_DISPLAY_MS: u64 = 5_000;
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_STOP_GRACE_MS: u64 = 500;

// Radio bonnet buttons sit on D5, D6 and D12. The lines are requested as plain
// inputs, so the boot overlay must enable pull-ups: GPIO12 is pulled down by default.
pub const DEFAULT_PIN_A: u32 = 5;
pub const DEFAULT_PIN_B: u32 = 6;
pub const DEFAULT_PIN_C: u32 = 12;

pub(super) const MIN_POLL_INTERVAL_MS: u64 = 10;
pub(super) const MAX_POLL_INTERVAL_MS: u64 = 1_000;
pub(super) const MAX_DISPLAY_MS: u64 = 60_000;
pub(super) const MIN_STARTUP_TIMEOUT_MS: u64 = 100;
pub(super) const MAX_STARTUP_TIMEOUT_MS: u64 = 60_000;
pub(super) const MIN_STOP_GRACE_MS: u64 = 50;
pub(super) const MAX_STOP_GRACE_MS: u64 = 10_000;
pub(super) const MAX_TITLE_CHARS: usize = 21;

pub fn default_input_kind() -> InputKind {
    if cfg!(all(feature = "gpio", target_os = "linux")) {
        InputKind::Gpio
    } else {
        InputKind::Stdin
    }
}
