#![forbid(unsafe_code)]

//! Collision-free three-line label layout for shelf-edge displays.
//!
//! This crate provides:
//! - [`PositionNormalizer`] to map camera pixels onto the display and thin
//!   crowded detections
//! - [`CellGrid`] and [`BlockPlacer`] for atomic, non-overlapping placement
//! - [`RenderedLines`] to turn a grid into display text
//! - [`LayoutEngine`] to run whole passes and report what was skipped

/// Display cells and label lines.
pub mod cell;
/// Layout passes and their reports.
pub mod engine;
/// Three-line grid with occupancy tracking.
pub mod grid;
/// Name/price/promotion label triples.
pub mod label;
/// Pixel normalization, ordering, and minimum-distance dedup.
pub mod normalize;
/// Block computation and atomic placement.
pub mod placer;
/// Grid to text.
pub mod render;

pub use cell::{Cell, Line};
pub use engine::{DisplayPayload, LayoutEngine, LayoutOutcome, LayoutPass, PassReport};
pub use grid::{CellGrid, Span, SpanConflict};
pub use label::{LabelError, LabelTriple, NO_PROMOTION_MARKER};
pub use normalize::{
    Detection, DetectionId, NormalizeError, NormalizeReport, Normalized, PositionNormalizer,
    RawDetection, dedup_by_distance, order_by_position,
};
pub use placer::{BlockPlacer, Placement, PlacementPlan, SkipReason};
pub use render::{LINE_SEPARATOR, RenderedLines, render_line, render_text};
