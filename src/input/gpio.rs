use super::{Button, ButtonState, InputSource};
use anyhow::{Context, Result};
use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use std::path::Path;

const CONSUMER: &str = "lora-panel";

struct ButtonLine {
    button: Button,
    handle: LineHandle,
}

impl ButtonLine {
    fn request(button: Button, pin: u32, chip: &mut Chip) -> Result<Self> {
        let line = chip
            .get_line(pin)
            .with_context(|| format!("requesting GPIO line {pin} for button {}", button.label()))?;
        // Bonnet buttons are active-low. The lines are plain inputs, so the
        // pull-ups must come from the boot overlay; the idle level is then 1.
        let handle = line
            .request(LineRequestFlags::INPUT, 1, CONSUMER)
            .with_context(|| format!("configuring GPIO line {pin}"))?;
        Ok(Self { button, handle })
    }

    fn is_pressed(&self) -> Result<bool> {
        Ok(self.handle.get_value()? == 0)
    }
}

/// The three radio bonnet buttons read through the GPIO character device.
pub struct GpioButtons {
    lines: Vec<ButtonLine>,
}

impl GpioButtons {
    /// `pins` are the line offsets for A, B and C.
    pub fn open(chip_path: &Path, pins: [u32; 3]) -> Result<Self> {
        let mut chip = Chip::new(chip_path)
            .with_context(|| format!("opening {}", chip_path.display()))?;
        let lines = Button::PRIORITY
            .into_iter()
            .zip(pins)
            .map(|(button, pin)| ButtonLine::request(button, pin, &mut chip))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { lines })
    }
}

impl InputSource for GpioButtons {
    fn read(&mut self) -> Result<ButtonState> {
        let mut state = ButtonState::RELEASED;
        for line in &self.lines {
            state.set(line.button, line.is_pressed()?);
        }
        Ok(state)
    }
}
