//! Status display abstraction.
//!
//! Mode handlers only issue "clear", "text at (x, y)" and "present" calls.
//! Coordinates use the 128x32 monochrome SSD1306 panel; each sink decides
//! how to turn those calls into something visible.

mod console;
#[cfg(test)]
mod tests;

use anyhow::Result;

pub use console::{ConsoleRenderer, LogRenderer};

pub const DISPLAY_WIDTH: i32 = 128;
pub const DISPLAY_HEIGHT: i32 = 32;

/// Sink for draw calls. Nothing is visible until [`StatusRenderer::present`].
pub trait StatusRenderer {
    /// Blank the back buffer.
    fn clear(&mut self) -> Result<()>;
    /// Draw `text` with its top-left corner at pixel (`x`, `y`).
    fn text(&mut self, text: &str, x: i32, y: i32) -> Result<()>;
    /// Push the back buffer to the panel.
    fn present(&mut self) -> Result<()>;
}

impl<T: StatusRenderer + ?Sized> StatusRenderer for Box<T> {
    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn text(&mut self, text: &str, x: i32, y: i32) -> Result<()> {
        (**self).text(text, x, y)
    }

    fn present(&mut self) -> Result<()> {
        (**self).present()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    Clear,
    Text { text: String, x: i32, y: i32 },
    Present,
}

/// Keeps every draw call in order. Used by tests and by anything that wants
/// to inspect frames after the fact.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    commands: Vec<DrawCommand>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Text of every draw call, in call order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text draw calls grouped by the frame they were presented in.
    pub fn presented_frames(&self) -> Vec<Vec<String>> {
        let mut frames = Vec::new();
        let mut current = Vec::new();
        for command in &self.commands {
            match command {
                DrawCommand::Clear => current.clear(),
                DrawCommand::Text { text, .. } => current.push(text.clone()),
                DrawCommand::Present => frames.push(current.clone()),
            }
        }
        frames
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl StatusRenderer for RecordingRenderer {
    fn clear(&mut self) -> Result<()> {
        self.commands.push(DrawCommand::Clear);
        Ok(())
    }

    fn text(&mut self, text: &str, x: i32, y: i32) -> Result<()> {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.commands.push(DrawCommand::Present);
        Ok(())
    }
}
