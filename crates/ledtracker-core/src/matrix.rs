//! RGB frame buffer for the LED matrix.
//!
//! Backends receive a complete [`FrameBuffer`] on every push; drawing never
//! touches hardware directly.

use serde::{Deserialize, Serialize};

use crate::font::{self, ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::model::SalesSnapshot;

/// Panel height in pixels.
pub const ROWS: usize = 32;

/// Panel width in pixels.
pub const COLS: usize = 64;

/// Where the sales headline is drawn.
pub const HEADLINE_X: i32 = 1;
pub const HEADLINE_Y: i32 = 12;
pub const HEADLINE_COLOUR: Rgb = Rgb(0, 255, 0);

/// A 24-bit colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub fn is_black(&self) -> bool {
        *self == Self::BLACK
    }
}

/// Pixel buffer of `ROWS` x `COLS`, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<Rgb>,
}

impl FrameBuffer {
    /// Create an all-black frame.
    pub fn new() -> Self {
        Self {
            pixels: vec![Rgb::BLACK; ROWS * COLS],
        }
    }

    /// Fill the whole frame with one colour.
    pub fn clear(&mut self, colour: Rgb) {
        self.pixels.fill(colour);
    }

    /// Set a pixel. Coordinates outside the panel are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, colour: Rgb) {
        if let Some(idx) = Self::index(x, y) {
            self.pixels[idx] = colour;
        }
    }

    /// Read a pixel, `None` outside the panel.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        Self::index(x, y).map(|idx| self.pixels[idx])
    }

    /// Iterate rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.pixels.chunks(COLS)
    }

    /// Number of non-black pixels.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| !p.is_black()).count()
    }

    /// Draw text with the built-in 5x7 font.
    ///
    /// Text is upper-cased; each character advances the cursor six columns.
    /// Pixels that fall outside the panel are clipped, so text may start at
    /// negative coordinates or run off the right edge.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, colour: Rgb) {
        let mut cursor = x;
        for c in text.chars().flat_map(char::to_uppercase) {
            let glyph = font::glyph(c);
            for (row, bits) in glyph.iter().enumerate().take(GLYPH_HEIGHT as usize) {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        self.set_pixel(cursor + col, y + row as i32, colour);
                    }
                }
            }
            cursor += ADVANCE;
        }
    }

    /// Raw RGB24 bytes, row-major, three bytes per pixel.
    pub fn to_rgb24(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for Rgb(r, g, b) in &self.pixels {
            bytes.extend_from_slice(&[*r, *g, *b]);
        }
        bytes
    }

    fn index(x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= COLS || y as usize >= ROWS {
            return None;
        }
        Some(y as usize * COLS + x as usize)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Width in pixels that `text` occupies when drawn.
pub fn text_width(text: &str) -> i32 {
    let chars = text.chars().flat_map(char::to_uppercase).count() as i32;
    if chars == 0 {
        0
    } else {
        chars * ADVANCE - 1
    }
}

/// Clear the frame and draw the sales headline.
pub fn render_snapshot(frame: &mut FrameBuffer, snapshot: &SalesSnapshot) {
    frame.clear(Rgb::BLACK);
    frame.draw_text(&snapshot.headline(), HEADLINE_X, HEADLINE_Y, HEADLINE_COLOUR);
}
