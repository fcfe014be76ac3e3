//! Button sources and press detection.
//!
//! The controller only ever sees a [`ButtonState`] sampled fresh on every
//! poll. Whether a held button fires again on the next poll is decided by
//! [`PressDetector`], not by the source.

#[cfg(all(feature = "gpio", target_os = "linux"))]
mod gpio;
mod stdin;
#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::ValueEnum;

#[cfg(all(feature = "gpio", target_os = "linux"))]
pub use gpio::GpioButtons;
pub use stdin::{parse_button_line, StdinButtons};

/// One of the three bonnet buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    C,
}

impl Button {
    /// Dispatch order when several buttons are down at once.
    pub const PRIORITY: [Button; 3] = [Button::A, Button::B, Button::C];

    pub fn label(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::C => "C",
        }
    }
}

/// Pressed flags for the three buttons. Electrically active-low; here `true` means pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub a: bool,
    pub b: bool,
    pub c: bool,
}

impl ButtonState {
    pub const RELEASED: ButtonState = ButtonState {
        a: false,
        b: false,
        c: false,
    };

    /// Bit 0 is A, bit 1 is B, bit 2 is C.
    pub fn from_mask(mask: u8) -> Self {
        Self {
            a: mask & 0b001 != 0,
            b: mask & 0b010 != 0,
            c: mask & 0b100 != 0,
        }
    }

    pub fn pressed(button: Button) -> Self {
        let mut state = Self::RELEASED;
        state.set(button, true);
        state
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::C => self.c,
        }
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        match button {
            Button::A => self.a = pressed,
            Button::B => self.b = pressed,
            Button::C => self.c = pressed,
        }
    }

    pub fn any(&self) -> bool {
        self.a || self.b || self.c
    }

    /// First pressed button in [`Button::PRIORITY`] order.
    pub fn first_pressed(&self) -> Option<Button> {
        Button::PRIORITY
            .into_iter()
            .find(|button| self.is_pressed(*button))
    }

    /// Combine two samples; a button counts as pressed if either saw it.
    pub fn merge(self, other: ButtonState) -> Self {
        Self {
            a: self.a || other.a,
            b: self.b || other.b,
            c: self.c || other.c,
        }
    }
}

/// Anything that can report the current button state. Reads must not block for long.
pub trait InputSource {
    fn read(&mut self) -> Result<ButtonState>;
}

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn read(&mut self) -> Result<ButtonState> {
        (**self).read()
    }
}

/// When a held button triggers its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TriggerMode {
    /// Every poll while the button is down (the panel re-enters the mode after each pause).
    #[default]
    Level,
    /// Once per press; the button must be released before it fires again.
    Edge,
}

/// Turns raw samples into at most one button per poll.
#[derive(Debug, Clone)]
pub struct PressDetector {
    mode: TriggerMode,
    previous: ButtonState,
}

impl PressDetector {
    pub fn new(mode: TriggerMode) -> Self {
        Self {
            mode,
            previous: ButtonState::RELEASED,
        }
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    pub fn observe(&mut self, state: ButtonState) -> Option<Button> {
        let previous = std::mem::replace(&mut self.previous, state);
        match self.mode {
            TriggerMode::Level => state.first_pressed(),
            TriggerMode::Edge => Button::PRIORITY
                .into_iter()
                .find(|button| state.is_pressed(*button) && !previous.is_pressed(*button)),
        }
    }
}
