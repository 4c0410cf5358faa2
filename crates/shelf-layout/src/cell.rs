//! Display cell: the fundamental unit of a label line.
//!
//! A cell is either unwritten, holds one glyph, or is the trailing half of a
//! double-width glyph written into the cell before it.

/// One of the three label lines, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Line {
    Name,
    Price,
    Promo,
}

impl Line {
    /// All lines in output order.
    pub const ALL: [Line; 3] = [Line::Name, Line::Price, Line::Promo];

    /// Zero-based row index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Line::Name => 0,
            Line::Price => 1,
            Line::Promo => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Line::Name => "name",
            Line::Price => "price",
            Line::Promo => "promo",
        }
    }
}

/// A single cell in a label line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    /// Never written in this pass. Renders as a space.
    #[default]
    Blank,
    /// Leading cell of a glyph.
    Glyph(char),
    /// Trailing half of a double-width glyph. Renders as nothing.
    Continuation,
}

impl Cell {
    /// Create a double-width glyph as a `(leading, continuation)` pair.
    #[must_use]
    pub const fn wide(ch: char) -> (Self, Self) {
        (Self::Glyph(ch), Self::Continuation)
    }

    #[must_use]
    pub const fn is_blank(self) -> bool {
        matches!(self, Self::Blank)
    }

    #[must_use]
    pub const fn is_continuation(self) -> bool {
        matches!(self, Self::Continuation)
    }

    /// The character this cell contributes to rendered text, if any.
    #[must_use]
    pub const fn rendered(self) -> Option<char> {
        match self {
            Self::Blank => Some(' '),
            Self::Glyph(ch) => Some(ch),
            Self::Continuation => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_is_blank() {
        let cell = Cell::default();
        assert!(cell.is_blank());
        assert!(!cell.is_continuation());
        assert_eq!(cell.rendered(), Some(' '));
    }

    #[test]
    fn wide_glyph_pair() {
        let (lead, cont) = Cell::wide('가');
        assert_eq!(lead, Cell::Glyph('가'));
        assert_eq!(lead.rendered(), Some('가'));
        assert!(cont.is_continuation());
        assert_eq!(cont.rendered(), None);
    }

    #[test]
    fn line_order_is_name_price_promo() {
        let indices: Vec<usize> = Line::ALL.iter().map(|line| line.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(Line::Promo.as_str(), "promo");
    }
}
