#![forbid(unsafe_code)]

//! Three-line cell grid with occupancy tracking.
//!
//! # Invariants
//!
//! 1. **Fixed shape**: every line holds exactly `width` cells and `width`
//!    occupancy flags for the lifetime of the grid.
//!
//! 2. **Occupancy mirrors writes**: `occupied[i]` is true iff cell `i` was
//!    written by a committed span, including the continuation half of a
//!    double-width glyph.
//!
//! 3. **Monotonic**: cells are never cleared or overwritten. A span is only
//!    committed after [`CellGrid::check_span`] has accepted it.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Out of bounds | Span starts before cell 0 or ends past `width` | `SpanConflict::OutOfBounds` |
//! | Occupied | Any target cell already written | `SpanConflict::Occupied` |

use std::fmt;

use shelf_core::GlyphPolicy;

use crate::cell::{Cell, Line};

/// Why a span cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanConflict {
    /// The text does not fit inside the line from the requested start.
    OutOfBounds { start: i64, width: usize },
    /// A target cell is already occupied.
    Occupied { cell: usize },
}

impl fmt::Display for SpanConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { start, width } => {
                write!(f, "span of {width} cells at {start} leaves the line")
            }
            Self::Occupied { cell } => write!(f, "cell {cell} already occupied"),
        }
    }
}

/// A checked, writable range on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: Line,
    pub start: usize,
    pub width: usize,
}

impl Span {
    /// One past the last cell.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.width
    }
}

/// Three fixed-length cell buffers plus parallel occupancy maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    width: usize,
    cells: [Vec<Cell>; 3],
    occupied: [Vec<bool>; 3],
}

impl CellGrid {
    /// Create an empty grid with `width` cells per line.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width,
            cells: std::array::from_fn(|_| vec![Cell::Blank; width]),
            occupied: std::array::from_fn(|_| vec![false; width]),
        }
    }

    /// Cells per line.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn cells(&self, line: Line) -> &[Cell] {
        &self.cells[line.index()]
    }

    #[must_use]
    pub fn occupancy(&self, line: Line) -> &[bool] {
        &self.occupied[line.index()]
    }

    /// Whether `cell` on `line` has been written. Out-of-range cells are not.
    #[must_use]
    pub fn is_occupied(&self, line: Line, cell: usize) -> bool {
        self.occupied[line.index()]
            .get(cell)
            .copied()
            .unwrap_or(false)
    }

    /// Number of written cells on `line`.
    #[must_use]
    pub fn occupied_count(&self, line: Line) -> usize {
        self.occupied[line.index()].iter().filter(|&&o| o).count()
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied.iter().all(|line| line.iter().all(|&o| !o))
    }

    /// Check that `text` can be written on `line` starting at `start`.
    ///
    /// Pure: the grid is not modified. Bounds are checked before occupancy,
    /// so a span that leaves the line reports `OutOfBounds` even if it also
    /// overlaps written cells.
    pub fn check_span(
        &self,
        line: Line,
        start: i64,
        text: &str,
        policy: GlyphPolicy,
    ) -> Result<Span, SpanConflict> {
        let width = policy.text_width(text);
        let fits = usize::try_from(start)
            .ok()
            .filter(|&s| s.checked_add(width).is_some_and(|end| end <= self.width));
        let Some(start) = fits else {
            return Err(SpanConflict::OutOfBounds { start, width });
        };

        let occupied = &self.occupied[line.index()];
        let mut pos = start;
        for ch in text.chars() {
            let w = policy.width(ch);
            if let Some(offset) = occupied[pos..pos + w].iter().position(|&o| o) {
                return Err(SpanConflict::Occupied { cell: pos + offset });
            }
            pos += w;
        }
        Ok(Span { line, start, width })
    }

    /// Write `text` into a span previously accepted by [`check_span`].
    ///
    /// The span must come from `check_span` on this grid with the same text
    /// and policy, with no other write in between.
    ///
    /// [`check_span`]: CellGrid::check_span
    pub(crate) fn commit_span(&mut self, span: Span, text: &str, policy: GlyphPolicy) {
        let idx = span.line.index();
        let cells = &mut self.cells[idx];
        let occupied = &mut self.occupied[idx];
        let mut pos = span.start;
        for ch in text.chars() {
            let w = policy.width(ch);
            debug_assert!(!occupied[pos], "commit over occupied cell {pos}");
            cells[pos] = Cell::Glyph(ch);
            occupied[pos] = true;
            if w == 2 && pos + 1 < self.width {
                cells[pos + 1] = Cell::Continuation;
                occupied[pos + 1] = true;
            }
            pos += w;
        }
    }

    /// Check and write a single line.
    ///
    /// # Errors
    ///
    /// Returns the conflict and leaves the grid untouched if the span does
    /// not fit.
    pub fn write_text(
        &mut self,
        line: Line,
        start: i64,
        text: &str,
        policy: GlyphPolicy,
    ) -> Result<Span, SpanConflict> {
        let span = self.check_span(line, start, text, policy)?;
        self.commit_span(span, text, policy);
        Ok(span)
    }
}
