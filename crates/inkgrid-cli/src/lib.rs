#![forbid(unsafe_code)]

//! Command-line surface for the inkgrid renderer.

pub mod cli;
