#![forbid(unsafe_code)]

//! Core: glyph widths, display geometry, and configuration.
//!
//! # Role in the shelf label pipeline
//! `shelf-core` holds the pieces every other crate agrees on: how many cells
//! a glyph takes, how a physical position on the shelf is represented and
//! rounded, and how a display's geometry is configured and validated. The
//! layout engine (`shelf-layout`) builds on these without re-deriving any
//! of them, so measurement and placement stay in lockstep.

pub mod config;
pub mod geometry;
pub mod glyph_width;

pub use config::{ConfigError, LayoutConfig, LayoutConfigParse};
pub use geometry::{
    Centi, DisplayGeometry, ExactDecimal, GeometryError, ParseCentiError, chars_per_line_for,
};
pub use glyph_width::GlyphPolicy;
