#![forbid(unsafe_code)]

//! Pen-tracked glyph compositing and per-line flushing.
//!
//! The compositor owns the session's single canvas. Characters stream in
//! order, one glyph in flight at a time; the rasterizer's span rows are
//! written straight into the canvas at pen-offset coordinates. A line break
//! flushes the canvas as an ASCII block, clears it, and resets the pen.
//!
//! # Failure tiers
//!
//! - Glyph lookup/load failures are recoverable: logged, the character is
//!   skipped with the pen untouched, and the line continues.
//! - A span row below the baseline floor or above the fixed canvas height is
//!   fatal to the current line: the rest of the line is skipped, the partial
//!   block still flushes at the break, and the next line starts fresh.
//! - Allocation failures abort the whole session.
//!
//! # Usage
//!
//! ```ignore
//! use inkgrid_canvas::RenderConfig;
//! use inkgrid_compose::{Compositor, FontFace};
//!
//! let face = FontFace::from_bytes(&font_bytes, 24.0, true)?;
//! let mut compositor = Compositor::new(&face, RenderConfig::default())?;
//! compositor.render_text("quux\nbaz", &mut std::io::stdout().lock())?;
//! ```

use std::error::Error;
use std::fmt;
use std::io::{self, Write};

use tracing::{debug, error, warn};

use inkgrid_canvas::{Canvas, CanvasError, RenderConfig};

use crate::font::{GlyphError, GlyphSource};
use crate::span::{CoverageSpan, SpanSink};

/// Horizontal pen state for one logical line.
///
/// The pen accumulates fractional advances; drawing rounds to whole cells.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pen {
    /// Current horizontal offset from the line start, in cells.
    pub x: f32,
}

/// Errors raised while compositing glyph spans into the canvas.
#[derive(Debug)]
pub enum ComposeError {
    /// The canvas rejected a write or could not grow.
    Canvas(CanvasError),
    /// A span row landed below the canvas's baseline floor.
    BaselineUnderflow { row: i32 },
    /// A glyph could not be resolved or loaded. Recoverable per character.
    Glyph(GlyphError),
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canvas(err) => write!(f, "canvas write failed: {}", err),
            Self::BaselineUnderflow { row } => {
                write!(f, "glyph extends below the baseline floor (row {})", row)
            }
            Self::Glyph(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ComposeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Canvas(err) => Some(err),
            Self::Glyph(err) => Some(err),
            Self::BaselineUnderflow { .. } => None,
        }
    }
}

impl From<CanvasError> for ComposeError {
    fn from(err: CanvasError) -> Self {
        Self::Canvas(err)
    }
}

impl From<GlyphError> for ComposeError {
    fn from(err: GlyphError) -> Self {
        Self::Glyph(err)
    }
}

/// Errors escaping a whole render session.
#[derive(Debug)]
pub enum RenderError {
    /// Writing a flushed block to the output failed.
    Io(io::Error),
    /// A session-fatal compositing failure, currently always allocation.
    Session(ComposeError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to write rendered output: {}", err),
            Self::Session(err) => write!(f, "render session aborted: {}", err),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Session(err) => Some(err),
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Canvas-backed span sink for one glyph at a fixed pen position.
struct CanvasSink<'a> {
    canvas: &'a mut Canvas,
    /// Leftmost ink column of the glyph. Non-negative after bearing
    /// compensation.
    origin_col: i32,
    /// Canvas row of the baseline.
    baseline_row: i32,
}

impl SpanSink for CanvasSink<'_> {
    fn accept_row(&mut self, y: i32, spans: &[CoverageSpan]) -> Result<(), ComposeError> {
        let row = self.baseline_row + y;
        if row < 0 {
            return Err(ComposeError::BaselineUnderflow { row });
        }
        for span in spans {
            for j in 0..span.len {
                let col = self.origin_col + span.x + j as i32;
                debug_assert!(col >= 0, "bearing compensation must keep columns non-negative");
                self.canvas
                    .set_extending(col as usize, row as usize, span.coverage)?;
            }
        }
        Ok(())
    }
}

/// Streams characters into ASCII blocks, one per logical line.
pub struct Compositor<'f, F: GlyphSource> {
    font: &'f F,
    canvas: Canvas,
    pen: Pen,
    baseline_row: i32,
    render: RenderConfig,
}

impl<'f, F: GlyphSource> Compositor<'f, F> {
    /// Set up a render session: fix the baseline row and the canvas height
    /// from font-wide metrics, and allocate the initial canvas.
    ///
    /// The height is an upper bound derived once per session; a glyph
    /// exceeding it is a per-line error at composite time, not a resize.
    pub fn new(font: &'f F, render: RenderConfig) -> Result<Self, ComposeError> {
        let metrics = font.font_metrics();
        let baseline_row = (-metrics.descent).ceil().max(0.0) as i32;
        let height = (metrics.line_height.ceil() as i32)
            .max(baseline_row + metrics.ascent.ceil() as i32)
            .max(1) as usize;
        let width = (metrics.line_height.ceil() as usize).max(1);
        let canvas = Canvas::new(width, height)?;
        Ok(Self {
            font,
            canvas,
            pen: Pen::default(),
            baseline_row,
            render,
        })
    }

    /// Current pen offset within the line being composited.
    #[inline]
    pub fn pen_x(&self) -> f32 {
        self.pen.x
    }

    /// Canvas row of the baseline, fixed for the session.
    #[inline]
    pub const fn baseline_row(&self) -> i32 {
        self.baseline_row
    }

    /// The session canvas.
    #[inline]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Render `text` as one ASCII block per logical line.
    ///
    /// Lines end at `'\n'` or end of input. Each break flushes the block
    /// followed by one blank separator line; the final block has no
    /// separator. Per-glyph failures are logged and skipped; line-fatal
    /// failures skip the rest of their line; only allocation and output
    /// failures escape.
    pub fn render_text<W: Write>(&mut self, text: &str, out: &mut W) -> Result<(), RenderError> {
        let mut line_poisoned = false;
        for ch in text.chars() {
            if ch == '\n' {
                self.flush(out)?;
                out.write_all(b"\n")?;
                self.reset_line();
                line_poisoned = false;
                continue;
            }
            if line_poisoned {
                continue;
            }
            match self.compose_char(ch) {
                Ok(()) => {}
                Err(ComposeError::Glyph(err)) => {
                    warn!(ch = %ch.escape_debug(), %err, "skipping character");
                }
                Err(err @ ComposeError::Canvas(CanvasError::Allocation { .. })) => {
                    return Err(RenderError::Session(err));
                }
                Err(err) => {
                    error!(ch = %ch.escape_debug(), %err, "abandoning rest of line");
                    line_poisoned = true;
                }
            }
        }
        self.flush(out)?;
        Ok(())
    }

    /// Composite one character at the current pen position.
    ///
    /// Lookup misses and load failures surface as [`ComposeError::Glyph`]
    /// with the pen and canvas untouched.
    fn compose_char(&mut self, ch: char) -> Result<(), ComposeError> {
        let glyph = self
            .font
            .lookup(ch)
            .ok_or(GlyphError::Missing { ch })?;
        let metrics = self.font.glyph_metrics(glyph)?;

        // Bearing compensation: an overhanging left bearing at the current
        // pen would put ink left of column 0. Advance the pen by whole cells
        // until the ink fits.
        let mut draw_left = self.pen.x + metrics.left_bearing;
        if draw_left < 0.0 {
            self.pen.x += (-draw_left).ceil();
            draw_left = self.pen.x + metrics.left_bearing;
        }

        let mut sink = CanvasSink {
            canvas: &mut self.canvas,
            origin_col: draw_left.round() as i32,
            baseline_row: self.baseline_row,
        };
        self.font.rasterize(glyph, &mut sink)?;

        self.pen.x += metrics.advance_width;
        debug!(ch = %ch.escape_debug(), pen_x = self.pen.x, "composited glyph");
        Ok(())
    }

    /// Write the current block to `out`.
    fn flush<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.canvas.render_ascii(out, &self.render)
    }

    /// Clear the canvas and return the pen to the line start.
    fn reset_line(&mut self) {
        self.canvas.clear();
        self.pen.x = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontMetrics, GlyphId, GlyphMetrics};
    use proptest::prelude::*;

    struct StubGlyph {
        id: u16,
        advance: f32,
        bearing: f32,
        rows: Vec<(i32, Vec<CoverageSpan>)>,
        broken: bool,
    }

    struct StubFont {
        metrics: FontMetrics,
        glyphs: Vec<(char, StubGlyph)>,
    }

    impl StubFont {
        fn find(&self, glyph: GlyphId) -> Result<&StubGlyph, GlyphError> {
            self.glyphs
                .iter()
                .map(|(_, g)| g)
                .find(|g| g.id == glyph.0)
                .ok_or(GlyphError::Metrics { glyph: glyph.0 })
        }
    }

    impl GlyphSource for StubFont {
        fn font_metrics(&self) -> FontMetrics {
            self.metrics
        }

        fn lookup(&self, ch: char) -> Option<GlyphId> {
            self.glyphs
                .iter()
                .find(|(c, _)| *c == ch)
                .map(|(_, g)| GlyphId(g.id))
        }

        fn glyph_metrics(&self, glyph: GlyphId) -> Result<GlyphMetrics, GlyphError> {
            let g = self.find(glyph)?;
            if g.broken {
                return Err(GlyphError::Metrics { glyph: glyph.0 });
            }
            Ok(GlyphMetrics {
                advance_width: g.advance,
                left_bearing: g.bearing,
            })
        }

        fn rasterize(&self, glyph: GlyphId, sink: &mut dyn SpanSink) -> Result<(), ComposeError> {
            let g = self.find(glyph).map_err(ComposeError::Glyph)?;
            for (y, spans) in &g.rows {
                sink.accept_row(*y, spans)?;
            }
            Ok(())
        }
    }

    fn span(x: i32, len: u32, coverage: u8) -> CoverageSpan {
        CoverageSpan { x, len, coverage }
    }

    /// ascent 4, descent -2, line height 6: baseline row 2, canvas 6x6.
    fn stub_font() -> StubFont {
        StubFont {
            metrics: FontMetrics {
                ascent: 4.0,
                descent: -2.0,
                line_height: 6.0,
            },
            glyphs: vec![
                (
                    'a',
                    StubGlyph {
                        id: 1,
                        advance: 2.0,
                        bearing: 0.0,
                        rows: vec![(0, vec![span(0, 2, 200)])],
                        broken: false,
                    },
                ),
                (
                    'b',
                    StubGlyph {
                        id: 2,
                        advance: 3.0,
                        bearing: 1.0,
                        rows: vec![(0, vec![span(0, 1, 255)]), (1, vec![span(0, 1, 255)])],
                        broken: false,
                    },
                ),
                (
                    'j',
                    StubGlyph {
                        id: 3,
                        advance: 2.0,
                        bearing: -1.5,
                        rows: vec![(0, vec![span(0, 1, 255)])],
                        broken: false,
                    },
                ),
                (
                    'q',
                    StubGlyph {
                        id: 4,
                        advance: 2.0,
                        bearing: 0.0,
                        rows: vec![(-3, vec![span(0, 1, 255)])],
                        broken: false,
                    },
                ),
                (
                    'T',
                    StubGlyph {
                        id: 5,
                        advance: 2.0,
                        bearing: 0.0,
                        rows: vec![(10, vec![span(0, 1, 255)])],
                        broken: false,
                    },
                ),
                (
                    'w',
                    StubGlyph {
                        id: 6,
                        advance: 5.0,
                        bearing: 0.0,
                        rows: vec![],
                        broken: true,
                    },
                ),
            ],
        }
    }

    fn compositor(font: &StubFont) -> Compositor<'_, StubFont> {
        Compositor::new(font, RenderConfig::default()).unwrap()
    }

    #[test]
    fn session_geometry_comes_from_font_metrics() {
        let font = stub_font();
        let c = compositor(&font);
        assert_eq!(c.baseline_row(), 2);
        assert_eq!(c.canvas().capacity_height(), 6);
        assert_eq!(c.canvas().capacity_width(), 6);
    }

    #[test]
    fn glyph_ink_lands_at_the_baseline_row() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("a", &mut out).unwrap();
        assert_eq!(c.canvas().get(0, 2), Some(200));
        assert_eq!(c.canvas().get(1, 2), Some(200));
        assert_eq!(c.pen_x(), 2.0);
    }

    #[test]
    fn lookup_miss_leaves_pen_and_canvas_untouched() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("x", &mut out).unwrap();
        assert_eq!(c.pen_x(), 0.0);
        assert!(c.canvas().is_empty());
        assert_eq!(out, b"");
    }

    #[test]
    fn lookup_miss_does_not_stop_the_line() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("xa", &mut out).unwrap();
        // 'a' composited as if 'x' were never there.
        assert_eq!(c.canvas().get(0, 2), Some(200));
        assert_eq!(c.pen_x(), 2.0);
    }

    #[test]
    fn broken_glyph_load_is_skipped_like_a_miss() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("wa", &mut out).unwrap();
        assert_eq!(c.pen_x(), 2.0);
        assert_eq!(c.canvas().get(0, 2), Some(200));
    }

    #[test]
    fn overhanging_bearing_shifts_the_pen_not_the_clip() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("j", &mut out).unwrap();
        // draw_left starts at -1.5; the pen pre-advances by 2 cells, placing
        // ink at round(0.5) = column 1, then advances by the glyph's 2.
        assert_eq!(c.canvas().get(1, 2), Some(255));
        assert_eq!(c.pen_x(), 4.0);
    }

    #[test]
    fn positive_bearing_offsets_ink_from_the_pen() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("b", &mut out).unwrap();
        // bearing 1.0: ink starts one column right of the pen.
        assert_eq!(c.canvas().get(0, 2), Some(0));
        assert_eq!(c.canvas().get(1, 2), Some(255));
        assert_eq!(c.canvas().get(1, 3), Some(255));
        assert_eq!(c.pen_x(), 3.0);
    }

    #[test]
    fn advances_accumulate_across_glyphs() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("aa", &mut out).unwrap();
        assert_eq!(c.canvas().get(2, 2), Some(200));
        assert_eq!(c.canvas().get(3, 2), Some(200));
        assert_eq!(c.pen_x(), 4.0);
    }

    #[test]
    fn line_break_flushes_and_fully_resets() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("a\n", &mut out).unwrap();
        assert!(c.canvas().is_empty());
        assert_eq!(c.canvas().used_height(), 0);
        assert_eq!(c.pen_x(), 0.0);
        // One block (used region 2x3, rows top-first: the inked baseline
        // row is the highest used row) plus the separator; the final flush
        // of the now-empty canvas adds nothing.
        assert_eq!(out, b"OOOO\n    \n    \n\n");
    }

    #[test]
    fn blocks_are_separated_by_one_blank_line() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("a\na", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let block = "OOOO\n    \n    \n";
        assert_eq!(text, format!("{block}\n{block}"));
    }

    #[test]
    fn baseline_underflow_abandons_the_line_only() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("qa\nb", &mut out).unwrap();
        // 'q' failed the line, 'a' was skipped with it; 'b' on the next
        // line rendered normally.
        assert_eq!(c.canvas().get(1, 2), Some(255));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains('O'));
    }

    #[test]
    fn row_overflow_abandons_the_line_only() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("Ta\na", &mut out).unwrap();
        assert_eq!(c.canvas().get(0, 2), Some(200));
        assert_eq!(c.pen_x(), 2.0);
    }

    #[test]
    fn wide_lines_grow_the_canvas_columns() {
        let font = stub_font();
        let mut c = compositor(&font);
        let mut out = Vec::new();
        c.render_text("aaaaa", &mut out).unwrap();
        // Five glyphs of advance 2 need 10 columns; initial capacity was 6.
        assert!(c.canvas().capacity_width() >= 10);
        assert_eq!(c.canvas().get(8, 2), Some(200));
    }

    proptest! {
        #[test]
        fn pen_is_the_sum_of_advances(text in "[ab]{0,12}") {
            let font = stub_font();
            let mut c = compositor(&font);
            let mut out = Vec::new();
            c.render_text(&text, &mut out).unwrap();
            let expected: f32 = text
                .chars()
                .map(|ch| if ch == 'a' { 2.0 } else { 3.0 })
                .sum();
            prop_assert_eq!(c.pen_x(), expected);
        }
    }
}
