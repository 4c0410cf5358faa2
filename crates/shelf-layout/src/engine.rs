#![forbid(unsafe_code)]

//! Layout passes: one fresh grid, detections placed in input order, text out.
//!
//! A [`LayoutEngine`] holds validated geometry and a glyph policy and is
//! reusable across displays. Each call to [`LayoutEngine::begin`] or
//! [`LayoutEngine::layout`] starts a [`LayoutPass`] that owns its own
//! [`CellGrid`]; nothing carries over between passes.
//!
//! # Example
//!
//! ```
//! use shelf_core::{DisplayGeometry, GlyphPolicy};
//! use shelf_layout::{Detection, LayoutEngine};
//!
//! let geometry = DisplayGeometry::new(20, 10, "10".parse().unwrap()).unwrap();
//! let engine = LayoutEngine::new(geometry, GlyphPolicy::Hangul);
//! let outcome = engine.layout(&[Detection::new(1, "5".parse().unwrap(), "AB,10,(X)")]);
//! assert_eq!(outcome.text(), "         AB\n         10\n        (X)");
//! assert_eq!(outcome.report.placed, 1);
//! ```

use shelf_core::{DisplayGeometry, GeometryError, GlyphPolicy, LayoutConfig};
use tracing::{debug, info, info_span};

use crate::grid::CellGrid;
use crate::normalize::{Detection, NormalizeReport};
use crate::placer::{BlockPlacer, Placement, SkipReason};
use crate::render::RenderedLines;

/// Per-pass placement counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PassReport {
    pub placed: usize,
    pub skipped_collision: usize,
    pub skipped_overflow: usize,
    pub skipped_malformed: usize,
    /// Counts from the normalizer, when the pass was fed raw detections.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub normalize: Option<NormalizeReport>,
}

impl PassReport {
    /// Detections handed to the placer.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.placed + self.skipped()
    }

    /// Detections left off the display for any reason.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped_collision + self.skipped_overflow + self.skipped_malformed
    }

    fn record(&mut self, placement: &Placement) {
        match placement {
            Placement::Placed(_) => self.placed += 1,
            Placement::Skipped(SkipReason::Collision { .. }) => self.skipped_collision += 1,
            Placement::Skipped(SkipReason::Overflow { .. }) => self.skipped_overflow += 1,
            Placement::Skipped(SkipReason::MalformedLabel(_)) => self.skipped_malformed += 1,
        }
    }
}

/// Result of a finished pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOutcome {
    pub grid: CellGrid,
    pub lines: RenderedLines,
    pub report: PassReport,
}

impl LayoutOutcome {
    /// The three-line display text.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.to_text()
    }
}

/// Reusable layout configuration.
#[derive(Debug, Clone, Copy)]
pub struct LayoutEngine {
    placer: BlockPlacer,
}

impl LayoutEngine {
    #[must_use]
    pub fn new(geometry: DisplayGeometry, policy: GlyphPolicy) -> Self {
        Self {
            placer: BlockPlacer::new(geometry, policy),
        }
    }

    /// # Errors
    ///
    /// Returns the first invalid geometry parameter in `config`.
    pub fn from_config(config: &LayoutConfig) -> Result<Self, GeometryError> {
        Ok(Self::new(config.geometry()?, config.glyph_policy))
    }

    #[must_use]
    pub fn geometry(&self) -> &DisplayGeometry {
        self.placer.geometry()
    }

    #[must_use]
    pub fn policy(&self) -> GlyphPolicy {
        self.placer.policy()
    }

    #[must_use]
    pub fn placer(&self) -> &BlockPlacer {
        &self.placer
    }

    /// Start a pass on a fresh grid.
    #[must_use]
    pub fn begin(&self) -> LayoutPass<'_> {
        LayoutPass {
            placer: &self.placer,
            grid: CellGrid::new(self.placer.geometry().chars_per_line()),
            report: PassReport::default(),
        }
    }

    /// Place `detections` in the given order and render the result.
    ///
    /// The order is the caller's: normalized input arrives sorted by
    /// position, and an earlier detection wins any collision.
    #[must_use]
    pub fn layout(&self, detections: &[Detection]) -> LayoutOutcome {
        let mut pass = self.begin();
        pass.place_all(detections);
        pass.finish()
    }
}

/// One in-progress pass over a single display.
#[derive(Debug)]
pub struct LayoutPass<'a> {
    placer: &'a BlockPlacer,
    grid: CellGrid,
    report: PassReport,
}

impl LayoutPass<'_> {
    #[must_use]
    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    #[must_use]
    pub fn report(&self) -> &PassReport {
        &self.report
    }

    /// Attach normalizer counts to this pass's report.
    pub fn set_normalize_report(&mut self, report: NormalizeReport) {
        self.report.normalize = Some(report);
    }

    /// Place one detection and record the outcome.
    pub fn place(&mut self, detection: &Detection) -> Placement {
        let placement = self.placer.place(&mut self.grid, detection);
        match &placement {
            Placement::Placed(plan) => debug!(
                id = detection.id,
                logical_x = %detection.logical_x,
                block_start = plan.block_start(),
                "placed"
            ),
            Placement::Skipped(reason) => debug!(
                id = detection.id,
                logical_x = %detection.logical_x,
                reason = reason.as_str(),
                detail = %reason,
                "skipped"
            ),
        }
        self.report.record(&placement);
        placement
    }

    pub fn place_all<'d, I>(&mut self, detections: I)
    where
        I: IntoIterator<Item = &'d Detection>,
    {
        let _span = info_span!(
            "layout_pass",
            chars_per_line = self.grid.width(),
            block_width = self.placer.geometry().block_width()
        )
        .entered();
        for detection in detections {
            self.place(detection);
        }
        info!(
            placed = self.report.placed,
            skipped_collision = self.report.skipped_collision,
            skipped_overflow = self.report.skipped_overflow,
            skipped_malformed = self.report.skipped_malformed,
            "layout pass complete"
        );
    }

    /// Render the grid and hand back everything the pass produced.
    #[must_use]
    pub fn finish(self) -> LayoutOutcome {
        LayoutOutcome {
            lines: RenderedLines::from_grid(&self.grid),
            grid: self.grid,
            report: self.report,
        }
    }
}

/// Text addressed to one physical display.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayPayload {
    pub display_id: String,
    pub text: String,
}

impl DisplayPayload {
    pub fn new(display_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            display_id: display_id.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn from_outcome(display_id: impl Into<String>, outcome: &LayoutOutcome) -> Self {
        Self::new(display_id, outcome.text())
    }
}
