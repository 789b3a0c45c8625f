#![forbid(unsafe_code)]

//! Glyph compositing and line layout over a coverage canvas.
//!
//! A [`Compositor`] walks a decoded character stream, asks a [`GlyphSource`]
//! for metrics and coverage spans per glyph, and accumulates the spans into
//! an [`inkgrid_canvas::Canvas`] at pen-tracked positions. Line breaks flush
//! the canvas as a thresholded ASCII block and reset the pen.

pub mod compose;
pub mod font;
pub mod span;

pub use compose::{ComposeError, Compositor, Pen, RenderError};
pub use font::{FontFace, FontMetrics, GlyphError, GlyphId, GlyphMetrics, GlyphSource};
pub use span::{CoverageSpan, SpanSink};
