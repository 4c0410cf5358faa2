//! Grid → display text.
//!
//! Continuation cells contribute nothing, blank cells become spaces, and
//! each line loses its trailing whitespace. Leading spaces are kept: they
//! are what positions the first label under its product.

use std::fmt;

use crate::cell::{Cell, Line};
use crate::grid::CellGrid;

/// Line separator between the three output lines.
pub const LINE_SEPARATOR: &str = "\n";

/// Rendered text of the three display lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedLines {
    lines: [String; 3],
}

impl RenderedLines {
    /// Render every line of `grid`.
    #[must_use]
    pub fn from_grid(grid: &CellGrid) -> Self {
        Self {
            lines: Line::ALL.map(|line| render_line(grid.cells(line))),
        }
    }

    #[must_use]
    pub fn line(&self, line: Line) -> &str {
        &self.lines[line.index()]
    }

    #[must_use]
    pub fn lines(&self) -> &[String; 3] {
        &self.lines
    }

    /// The three lines joined by [`LINE_SEPARATOR`], name line first.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.lines.join(LINE_SEPARATOR)
    }
}

impl fmt::Display for RenderedLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Serialize one line of cells, stripping trailing whitespace.
#[must_use]
pub fn render_line(cells: &[Cell]) -> String {
    let mut out: String = cells.iter().filter_map(|cell| cell.rendered()).collect();
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}

/// Render `grid` straight to the display text blob.
#[must_use]
pub fn render_text(grid: &CellGrid) -> String {
    RenderedLines::from_grid(grid).to_text()
}
