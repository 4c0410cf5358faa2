//! Label triples: the three text lines shown under one product.
//!
//! Collaborators hand labels over as a single `"<name>,<price>,<promo>"`
//! string. Commas inside a field cannot be represented, so a string that
//! does not split into exactly three fields is rejected as a whole. A field
//! holding a line break is rejected too: each field renders on one line.

use std::fmt;

use crate::cell::Line;

/// Promotion marker used when a product has no active promotion.
pub const NO_PROMOTION_MARKER: &str = "(행사X)";

const FIELD_SEPARATOR: char = ',';

const FIELD_NAMES: [&str; 3] = ["name", "price", "promo"];

fn has_line_break(value: &str) -> bool {
    value.contains(['\n', '\r'])
}

/// Errors from label parsing and composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// The label text did not split into exactly three fields.
    WrongFieldCount { found: usize },
    /// A catalog field contains the field separator.
    CommaInField { field: &'static str },
    /// A field contains `\n` or `\r`.
    LineBreakInField { field: &'static str },
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongFieldCount { found } => {
                write!(f, "expected 3 comma-separated fields, found {found}")
            }
            Self::CommaInField { field } => write!(f, "field '{field}' contains a comma"),
            Self::LineBreakInField { field } => {
                write!(f, "field '{field}' contains a line break")
            }
        }
    }
}

impl std::error::Error for LabelError {}

/// Name, price and promotion text for one product.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelTriple {
    name: String,
    price: String,
    promo: String,
}

impl LabelTriple {
    /// Parse collaborator label text. Each field is whitespace-trimmed.
    ///
    /// # Errors
    ///
    /// [`LabelError::WrongFieldCount`] unless the text has exactly two commas;
    /// [`LabelError::LineBreakInField`] if a trimmed field still holds a line
    /// break.
    pub fn parse(text: &str) -> Result<Self, LabelError> {
        let fields: Vec<&str> = text.split(FIELD_SEPARATOR).map(str::trim).collect();
        let [name, price, promo] = fields.as_slice() else {
            return Err(LabelError::WrongFieldCount {
                found: fields.len(),
            });
        };
        for (field, value) in FIELD_NAMES.into_iter().zip([name, price, promo]) {
            if has_line_break(value) {
                return Err(LabelError::LineBreakInField { field });
            }
        }
        Ok(Self {
            name: (*name).to_string(),
            price: (*price).to_string(),
            promo: (*promo).to_string(),
        })
    }

    /// Compose a label from catalog data.
    ///
    /// The promotion is wrapped in parentheses; an absent or empty promotion
    /// becomes [`NO_PROMOTION_MARKER`].
    ///
    /// # Errors
    ///
    /// [`LabelError::CommaInField`] or [`LabelError::LineBreakInField`] if any
    /// field would break the text format.
    pub fn from_catalog(
        name: &str,
        price: impl fmt::Display,
        promotion: Option<&str>,
    ) -> Result<Self, LabelError> {
        let price = price.to_string();
        let promo = match promotion {
            Some(event) if !event.is_empty() => format!("({event})"),
            _ => NO_PROMOTION_MARKER.to_string(),
        };
        for (field, value) in FIELD_NAMES
            .into_iter()
            .zip([name, price.as_str(), promo.as_str()])
        {
            if value.contains(FIELD_SEPARATOR) {
                return Err(LabelError::CommaInField { field });
            }
            if has_line_break(value) {
                return Err(LabelError::LineBreakInField { field });
            }
        }
        Ok(Self {
            name: name.to_string(),
            price,
            promo,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn price(&self) -> &str {
        &self.price
    }

    #[must_use]
    pub fn promo(&self) -> &str {
        &self.promo
    }

    /// Text shown on `line`.
    #[must_use]
    pub fn text(&self, line: Line) -> &str {
        match line {
            Line::Name => &self.name,
            Line::Price => &self.price,
            Line::Promo => &self.promo,
        }
    }

    /// Serialize back into collaborator label text.
    #[must_use]
    pub fn to_label_text(&self) -> String {
        format!("{},{},{}", self.name, self.price, self.promo)
    }
}
