#![forbid(unsafe_code)]

//! Thresholded ASCII presentation of a coverage canvas.
//!
//! Rows are emitted visual-top-first: the canvas stores row 0 at the lowest
//! baseline-relative offset, so presentation walks the used rows in reverse.
//! Each cell becomes two characters to compensate for the roughly 2:1
//! height-to-width aspect ratio of terminal fonts.

use std::io::{self, Write};

use crate::grid::Canvas;

/// Presentation options for [`Canvas::render_ascii`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Character emitted (twice) for an inked cell.
    pub ink_char: char,
    /// Coverage cutoff. A cell is inked only when its coverage is strictly
    /// greater than this value.
    pub threshold: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ink_char: 'O',
            threshold: 0,
        }
    }
}

impl Canvas {
    /// Render the used region as thresholded ASCII art.
    ///
    /// Emits `used_height` lines of `used_width * 2` characters each, top of
    /// the glyph first, with a newline after every row. Pure formatting: the
    /// canvas is not mutated, and equal canvas state and config always
    /// produce byte-identical output.
    pub fn render_ascii<W: Write>(&self, out: &mut W, config: &RenderConfig) -> io::Result<()> {
        out.write_all(self.render_ascii_string(config).as_bytes())
    }

    /// [`Canvas::render_ascii`] into an owned `String`.
    pub fn render_ascii_string(&self, config: &RenderConfig) -> String {
        let mut text = String::with_capacity(self.used_height() * (self.used_width() * 2 + 1));
        for y in (0..self.used_height()).rev() {
            for x in 0..self.used_width() {
                let inked = self
                    .get(x, y)
                    .is_some_and(|coverage| coverage > config.threshold);
                let ch = if inked { config.ink_char } else { ' ' };
                text.push(ch);
                text.push(ch);
            }
            text.push('\n');
        }
        text
    }
}
