#![forbid(unsafe_code)]

//! Coverage grid kernel: auto-growing 2D coverage storage and ASCII thresholding.

pub mod ascii;
pub mod grid;

pub use ascii::RenderConfig;
pub use grid::{Canvas, CanvasError, GrowthPolicy};
