use super::{StatusRenderer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use anyhow::{Context, Result};
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

/// Glyph cell of the panel's built-in 5x7 font (plus spacing).
pub(super) const CELL_WIDTH: i32 = 6;
pub(super) const CELL_HEIGHT: i32 = 8;
pub(super) const GRID_COLS: usize = (DISPLAY_WIDTH / CELL_WIDTH) as usize;
pub(super) const GRID_ROWS: usize = (DISPLAY_HEIGHT / CELL_HEIGHT) as usize;

// Marks the second cell of a double-width glyph.
const WIDE_TAIL: char = '\0';

/// Character-cell approximation of the panel. Text is snapped to the cell
/// under its pixel origin and clipped at the right and bottom edges.
#[derive(Debug, Clone)]
pub(super) struct TextGrid {
    cells: Vec<Vec<char>>,
}

impl TextGrid {
    pub(super) fn new() -> Self {
        Self {
            cells: vec![vec![' '; GRID_COLS]; GRID_ROWS],
        }
    }

    pub(super) fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(' ');
        }
    }

    pub(super) fn put(&mut self, text: &str, x: i32, y: i32) {
        if x < 0 || y < 0 || x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return;
        }
        let row = (y / CELL_HEIGHT) as usize;
        let mut col = (x / CELL_WIDTH) as usize;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            if col + width > GRID_COLS {
                break;
            }
            self.cells[row][col] = ch;
            if width == 2 {
                self.cells[row][col + 1] = WIDE_TAIL;
            }
            col += width;
        }
    }

    pub(super) fn lines(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|ch| **ch != WIDE_TAIL).collect())
            .collect()
    }
}

/// Draws frames on a terminal (or any writer) as a boxed text block.
/// Identical consecutive frames are written once.
pub struct ConsoleRenderer<W: Write> {
    out: W,
    grid: TextGrid,
    last_frame: Option<Vec<String>>,
}

impl ConsoleRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            grid: TextGrid::new(),
            last_frame: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusRenderer for ConsoleRenderer<W> {
    fn clear(&mut self) -> Result<()> {
        self.grid.clear();
        Ok(())
    }

    fn text(&mut self, text: &str, x: i32, y: i32) -> Result<()> {
        self.grid.put(text, x, y);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        let frame = self.grid.lines();
        if self.last_frame.as_ref() == Some(&frame) {
            return Ok(());
        }
        let border = format!("+{}+", "-".repeat(GRID_COLS));
        let mut block = String::with_capacity((GRID_COLS + 3) * (GRID_ROWS + 2));
        block.push_str(&border);
        block.push('\n');
        for line in &frame {
            block.push('|');
            block.push_str(line);
            block.push_str("|\n");
        }
        block.push_str(&border);
        block.push('\n');
        self.out
            .write_all(block.as_bytes())
            .and_then(|_| self.out.flush())
            .context("writing frame to console")?;
        self.last_frame = Some(frame);
        Ok(())
    }
}

/// Headless sink: each changed frame becomes one `tracing` event.
pub struct LogRenderer {
    grid: TextGrid,
    last_frame: Option<Vec<String>>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self {
            grid: TextGrid::new(),
            last_frame: None,
        }
    }
}

impl Default for LogRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRenderer for LogRenderer {
    fn clear(&mut self) -> Result<()> {
        self.grid.clear();
        Ok(())
    }

    fn text(&mut self, text: &str, x: i32, y: i32) -> Result<()> {
        self.grid.put(text, x, y);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        let frame = self.grid.lines();
        if self.last_frame.as_ref() == Some(&frame) {
            return Ok(());
        }
        let joined = frame
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join(" | ");
        tracing::info!(frame = %joined, "display frame");
        crate::log_debug(&format!("frame: {joined}"));
        self.last_frame = Some(frame);
        Ok(())
    }
}
