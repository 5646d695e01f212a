//! Terminal matrix emulator.
//!
//! Each terminal cell shows two vertically stacked LEDs using the upper
//! half-block character: the foreground colour is the top LED, the
//! background colour the bottom one. A 64x32 panel fits in 64x16 cells.

use std::fmt::Write as _;
use std::io::{self, Write};

use ledtracker_core::{FrameBuffer, Rgb};
use tracing::debug;

use crate::{DisplayError, MatrixBackend};

const UPPER_HALF_BLOCK: char = '\u{2580}';
const CURSOR_HOME: &str = "\x1b[H";
const RESET: &str = "\x1b[0m";

/// Paints frames into a terminal with 24-bit ANSI colour.
pub struct TerminalEmulator {
    out: Box<dyn Write + Send>,
}

impl TerminalEmulator {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn push_err(source: io::Error) -> DisplayError {
        DisplayError::Push {
            backend: "emulator",
            source,
        }
    }
}

impl MatrixBackend for TerminalEmulator {
    fn push(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        debug!("Emulator frame:\n{}", render_ascii(frame));
        self.out
            .write_all(render_ansi(frame).as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(Self::push_err)
    }

    fn cleanup(&mut self) {
        let _ = self.out.write_all(RESET.as_bytes());
        let _ = self.out.flush();
    }

    fn name(&self) -> &'static str {
        "emulator"
    }
}

/// Render a frame as ANSI true-colour half blocks.
pub fn render_ansi(frame: &FrameBuffer) -> String {
    let rows: Vec<&[Rgb]> = frame.rows().collect();
    let mut out = String::from(CURSOR_HOME);

    for pair in rows.chunks(2) {
        let top = pair[0];
        let bottom = pair.get(1).copied();
        for (x, Rgb(r, g, b)) in top.iter().enumerate() {
            let Rgb(br, bg, bb) = bottom.map(|row| row[x]).unwrap_or(Rgb::BLACK);
            let _ = write!(
                out,
                "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m{}",
                r, g, b, br, bg, bb, UPPER_HALF_BLOCK
            );
        }
        out.push_str(RESET);
        out.push('\n');
    }
    out
}

/// Render a frame as text, `#` for lit LEDs and `.` for dark ones.
pub fn render_ascii(frame: &FrameBuffer) -> String {
    let mut out = String::new();
    for row in frame.rows() {
        out.extend(row.iter().map(|p| if p.is_black() { '.' } else { '#' }));
        out.push('\n');
    }
    out
}
