//! Atomic placement of label triples onto the grid.
//!
//! Placement is two-phase. [`BlockPlacer::plan`] is pure: it computes the
//! block for a position, centers each of the three lines inside it and
//! checks every span against the grid. Only if all three lines are
//! feasible does [`BlockPlacer::place`] commit them. A rejected triple never
//! touches the grid, so there is nothing to roll back.
//!
//! ```text
//! base_cell   = round_half_even(x / display_width * chars_per_line)
//! block_start = clamp(base_cell - block_width / 2, 0, chars_per_line - block_width)
//! start_cell  = block_start + floor((block_width - text_width) / 2)   (per line)
//! ```

use std::fmt;

use shelf_core::{Centi, DisplayGeometry, GlyphPolicy};

use crate::cell::Line;
use crate::grid::{CellGrid, Span, SpanConflict};
use crate::label::{LabelError, LabelTriple};
use crate::normalize::Detection;

/// Why a detection was left off the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The label text is not a valid triple.
    MalformedLabel(LabelError),
    /// A line's text cannot fit inside the display from its centered start.
    Overflow { line: Line },
    /// A line's text would overwrite an earlier placement.
    Collision { line: Line, cell: usize },
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedLabel(_) => "malformed_label",
            Self::Overflow { .. } => "overflow",
            Self::Collision { .. } => "collision",
        }
    }

    fn from_conflict(line: Line, conflict: SpanConflict) -> Self {
        match conflict {
            SpanConflict::OutOfBounds { .. } => Self::Overflow { line },
            SpanConflict::Occupied { cell } => Self::Collision { line, cell },
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedLabel(err) => write!(f, "malformed label: {err}"),
            Self::Overflow { line } => write!(f, "{} line does not fit the display", line.as_str()),
            Self::Collision { line, cell } => {
                write!(f, "{} line collides at cell {cell}", line.as_str())
            }
        }
    }
}

/// A feasible placement of one triple: the shared block and one span per
/// line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementPlan {
    block_start: usize,
    spans: [Span; 3],
}

impl PlacementPlan {
    #[must_use]
    pub fn block_start(&self) -> usize {
        self.block_start
    }

    #[must_use]
    pub fn span(&self, line: Line) -> Span {
        self.spans[line.index()]
    }

    #[must_use]
    pub fn spans(&self) -> &[Span; 3] {
        &self.spans
    }
}

/// Outcome for one detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Placed(PlacementPlan),
    Skipped(SkipReason),
}

impl Placement {
    #[must_use]
    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Placed(_))
    }
}

/// Computes blocks and commits label triples onto a [`CellGrid`].
#[derive(Debug, Clone, Copy)]
pub struct BlockPlacer {
    geometry: DisplayGeometry,
    policy: GlyphPolicy,
}

impl BlockPlacer {
    #[must_use]
    pub fn new(geometry: DisplayGeometry, policy: GlyphPolicy) -> Self {
        Self { geometry, policy }
    }

    #[must_use]
    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn policy(&self) -> GlyphPolicy {
        self.policy
    }

    /// First cell of the block for a display position.
    #[must_use]
    pub fn block_start(&self, logical_x: Centi) -> usize {
        self.geometry
            .block_start(self.geometry.base_cell(logical_x))
    }

    /// Start cell of `text` centered in the block at `block_start`.
    ///
    /// Negative when the text is wider than the block and the block sits at
    /// the left edge.
    #[must_use]
    pub fn line_start(&self, block_start: usize, text: &str) -> i64 {
        let slack = self.geometry.block_width() as i64 - self.policy.text_width(text) as i64;
        block_start as i64 + slack.div_euclid(2)
    }

    /// Check all three lines of `label` at `logical_x` without writing.
    ///
    /// # Errors
    ///
    /// The first infeasible line, in name/price/promo order.
    pub fn plan(
        &self,
        grid: &CellGrid,
        logical_x: Centi,
        label: &LabelTriple,
    ) -> Result<PlacementPlan, SkipReason> {
        let block_start = self.block_start(logical_x);
        let mut spans = [Span {
            line: Line::Name,
            start: 0,
            width: 0,
        }; 3];
        for line in Line::ALL {
            let text = label.text(line);
            let start = self.line_start(block_start, text);
            spans[line.index()] = grid
                .check_span(line, start, text, self.policy)
                .map_err(|conflict| SkipReason::from_conflict(line, conflict))?;
        }
        Ok(PlacementPlan { block_start, spans })
    }

    /// Parse, plan and, if every line fits, commit one detection.
    pub fn place(&self, grid: &mut CellGrid, detection: &Detection) -> Placement {
        let label = match LabelTriple::parse(&detection.label) {
            Ok(label) => label,
            Err(err) => return Placement::Skipped(SkipReason::MalformedLabel(err)),
        };
        match self.plan(grid, detection.logical_x, &label) {
            Ok(plan) => {
                for span in plan.spans {
                    grid.commit_span(span, label.text(span.line), self.policy);
                }
                Placement::Placed(plan)
            }
            Err(reason) => Placement::Skipped(reason),
        }
    }
}
