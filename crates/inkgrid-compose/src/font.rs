#![forbid(unsafe_code)]

//! Glyph sources: the font-metrics-and-rasterizer capability seam, plus the
//! fontdue-backed implementation used by the CLI.
//!
//! The compositor only ever talks to [`GlyphSource`]. [`FontFace`] adapts
//! fontdue's whole-bitmap rasterization into the span-row protocol: each
//! bitmap row is compressed into runs of identical nonzero coverage and
//! handed to the sink bottom-up in baseline-relative coordinates.

use std::error::Error;
use std::fmt;

use smallvec::SmallVec;

use crate::compose::ComposeError;
use crate::span::{CoverageSpan, SpanSink};

/// Identifier of a glyph within its font. Id 0 is the conventional
/// missing-glyph slot and never comes out of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphId(pub u16);

/// Font-wide vertical metrics in pixel units at the session size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Height above the baseline reached by the tallest glyphs. Positive.
    pub ascent: f32,
    /// Depth below the baseline reached by the deepest glyphs. Zero or
    /// negative.
    pub descent: f32,
    /// Baseline-to-baseline distance.
    pub line_height: f32,
}

/// Horizontal metrics of a single glyph in pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    /// Pen advance after drawing the glyph.
    pub advance_width: f32,
    /// Offset from the pen position to the glyph's ink left edge. Negative
    /// for overhanging glyphs.
    pub left_bearing: f32,
}

/// Recoverable per-glyph failures. The compositor reports these and moves
/// on to the next character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphError {
    /// The font maps no glyph to this character.
    Missing { ch: char },
    /// The font file could not be parsed or lacks horizontal metrics.
    Parse { detail: String },
    /// The glyph's metrics or outline could not be loaded.
    Metrics { glyph: u16 },
}

impl fmt::Display for GlyphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { ch } => {
                write!(f, "no glyph found for '{}'", ch.escape_debug())
            }
            Self::Parse { detail } => write!(f, "unusable font: {}", detail),
            Self::Metrics { glyph } => {
                write!(f, "failed to load metrics for glyph {}", glyph)
            }
        }
    }
}

impl Error for GlyphError {}

/// A synchronous font capability: glyph lookup, metrics, and span-based
/// rasterization.
pub trait GlyphSource {
    /// Font-wide vertical metrics, fixed for the session.
    fn font_metrics(&self) -> FontMetrics;

    /// Map a character to its glyph, or `None` on a lookup miss.
    fn lookup(&self, ch: char) -> Option<GlyphId>;

    /// Horizontal metrics for a glyph.
    fn glyph_metrics(&self, glyph: GlyphId) -> Result<GlyphMetrics, GlyphError>;

    /// Rasterize a glyph, reporting each covered row to `sink`. Row
    /// coordinates are baseline-relative (up is positive); span columns are
    /// relative to the glyph's ink left edge.
    fn rasterize(&self, glyph: GlyphId, sink: &mut dyn SpanSink) -> Result<(), ComposeError>;
}

/// A fontdue-backed [`GlyphSource`] at a fixed pixel size.
///
/// With `anti_alias` enabled, fontdue's grayscale coverage flows through
/// unchanged; without it, coverage is binarized at the midpoint before span
/// emission, giving 1-bit rendering.
///
/// # Example
///
/// ```
/// use inkgrid_compose::FontFace;
///
/// assert!(FontFace::from_bytes(&[0u8; 4], 24.0, true).is_err());
/// ```
#[derive(Debug)]
pub struct FontFace {
    font: fontdue::Font,
    px: f32,
    anti_alias: bool,
    metrics: FontMetrics,
}

impl FontFace {
    /// Parse a TTF/OTF font and fix the rendering size in pixels.
    pub fn from_bytes(bytes: &[u8], px: f32, anti_alias: bool) -> Result<Self, GlyphError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|detail| GlyphError::Parse {
                detail: detail.to_string(),
            })?;
        let line = font
            .horizontal_line_metrics(px)
            .ok_or_else(|| GlyphError::Parse {
                detail: "font has no horizontal line metrics".to_string(),
            })?;
        let metrics = FontMetrics {
            ascent: line.ascent,
            descent: line.descent,
            line_height: line.new_line_size,
        };
        Ok(Self {
            font,
            px,
            anti_alias,
            metrics,
        })
    }

    #[inline]
    fn coverage(&self, raw: u8) -> u8 {
        if self.anti_alias {
            raw
        } else if raw >= 128 {
            255
        } else {
            0
        }
    }
}

impl GlyphSource for FontFace {
    fn font_metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn lookup(&self, ch: char) -> Option<GlyphId> {
        match self.font.lookup_glyph_index(ch) {
            0 => None,
            index => Some(GlyphId(index)),
        }
    }

    fn glyph_metrics(&self, glyph: GlyphId) -> Result<GlyphMetrics, GlyphError> {
        let metrics = self.font.metrics_indexed(glyph.0, self.px);
        Ok(GlyphMetrics {
            advance_width: metrics.advance_width,
            left_bearing: metrics.xmin as f32,
        })
    }

    fn rasterize(&self, glyph: GlyphId, sink: &mut dyn SpanSink) -> Result<(), ComposeError> {
        let (metrics, bitmap) = self.font.rasterize_indexed(glyph.0, self.px);
        let mut spans: SmallVec<[CoverageSpan; 16]> = SmallVec::new();
        for row in 0..metrics.height {
            // fontdue bitmaps are top-down; row 0 is the glyph's highest row.
            let y = metrics.ymin + (metrics.height - 1 - row) as i32;
            let line = &bitmap[row * metrics.width..(row + 1) * metrics.width];
            spans.clear();
            let mut x = 0;
            while x < line.len() {
                let coverage = self.coverage(line[x]);
                if coverage == 0 {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < line.len() && self.coverage(line[x]) == coverage {
                    x += 1;
                }
                spans.push(CoverageSpan {
                    x: start as i32,
                    len: (x - start) as u32,
                    coverage,
                });
            }
            if !spans.is_empty() {
                sink.accept_row(y, &spans)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let err = FontFace::from_bytes(&[0, 1, 2, 3], 16.0, true).unwrap_err();
        assert!(matches!(err, GlyphError::Parse { .. }));
    }

    #[test]
    fn glyph_error_messages_name_the_subject() {
        let missing = GlyphError::Missing { ch: 'ß' };
        assert!(missing.to_string().contains('ß'));
        let metrics = GlyphError::Metrics { glyph: 42 };
        assert!(metrics.to_string().contains("42"));
    }
}
