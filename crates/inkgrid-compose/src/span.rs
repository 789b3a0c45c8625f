#![forbid(unsafe_code)]

//! Coverage spans and the sink seam between rasterizer and canvas.
//!
//! A rasterizer reports each output row of a glyph as a run-length list of
//! horizontal coverage spans. Spans are ephemeral: a sink consumes them
//! during the callback and never stores them.

use crate::compose::ComposeError;

/// One horizontal run of equal coverage within a glyph row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageSpan {
    /// Column offset from the glyph's ink left edge.
    pub x: i32,
    /// Run length in cells.
    pub len: u32,
    /// Coverage value for every cell of the run.
    pub coverage: u8,
}

/// Receiver for the coverage rows of a single glyph.
///
/// `y` is baseline-relative and increases upward: descender rows are
/// negative, the row just above the baseline is 0. Calls arrive in the
/// rasterizer's own order; sinks must not assume top-down or bottom-up.
pub trait SpanSink {
    /// Accept one row of spans. Errors abort the glyph's rasterization.
    fn accept_row(&mut self, y: i32, spans: &[CoverageSpan]) -> Result<(), ComposeError>;
}
