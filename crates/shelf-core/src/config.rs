//! Layout configuration from defaults and environment.
//!
//! Every knob has a default matching the stock shelf display and an
//! environment override. Parsing never stops at the first bad value: all
//! problems are collected into [`LayoutConfigParse::errors`] so an operator
//! sees them together.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `SHELF_CHARS_PER_LINE` | `chars_per_line` | 147 |
//! | `SHELF_BLOCK_WIDTH` | `block_width` | 20 |
//! | `SHELF_DISPLAY_WIDTH` | `display_width` | 30.00 |
//! | `SHELF_MIN_DISTANCE` | `min_distance` | 3.00 |
//! | `SHELF_GLYPH_POLICY` | `glyph_policy` | `hangul` |

use std::env;
use std::fmt;

use crate::geometry::{Centi, DisplayGeometry, GeometryError};
use crate::glyph_width::GlyphPolicy;

pub const ENV_CHARS_PER_LINE: &str = "SHELF_CHARS_PER_LINE";
pub const ENV_BLOCK_WIDTH: &str = "SHELF_BLOCK_WIDTH";
pub const ENV_DISPLAY_WIDTH: &str = "SHELF_DISPLAY_WIDTH";
pub const ENV_MIN_DISTANCE: &str = "SHELF_MIN_DISTANCE";
pub const ENV_GLYPH_POLICY: &str = "SHELF_GLYPH_POLICY";

pub const DEFAULT_CHARS_PER_LINE: usize = 147;
pub const DEFAULT_BLOCK_WIDTH: usize = 20;
pub const DEFAULT_DISPLAY_WIDTH: Centi = Centi::from_units(30);
pub const DEFAULT_MIN_DISTANCE: Centi = Centi::from_units(3);

/// Tunables for one layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Character cells per display line.
    pub chars_per_line: usize,
    /// Width of the block each label triple is centered in.
    pub block_width: usize,
    /// Physical width of the display, in the same unit as positions.
    pub display_width: Centi,
    /// Detections closer than this collapse to the leftmost one.
    pub min_distance: Centi,
    /// Which glyphs take two cells.
    pub glyph_policy: GlyphPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            chars_per_line: DEFAULT_CHARS_PER_LINE,
            block_width: DEFAULT_BLOCK_WIDTH,
            display_width: DEFAULT_DISPLAY_WIDTH,
            min_distance: DEFAULT_MIN_DISTANCE,
            glyph_policy: GlyphPolicy::default(),
        }
    }
}

/// Configuration parse diagnostics.
#[derive(Debug, Clone)]
pub struct LayoutConfigParse {
    pub config: LayoutConfig,
    pub errors: Vec<ConfigError>,
}

/// One rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    pub fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<GeometryError> for ConfigError {
    fn from(err: GeometryError) -> Self {
        let (field, value) = match &err {
            GeometryError::ZeroCharsPerLine => ("chars_per_line", "0".to_string()),
            GeometryError::ZeroBlockWidth => ("block_width", "0".to_string()),
            GeometryError::BlockWiderThanLine { block_width, .. } => {
                ("block_width", block_width.to_string())
            }
            GeometryError::NonPositiveDisplayWidth(width) => ("display_width", width.to_string()),
            GeometryError::NegativeMinDistance(distance) => ("min_distance", distance.to_string()),
        };
        Self::new(field, value, err.to_string())
    }
}

impl LayoutConfig {
    /// Parse config from environment variables, dropping diagnostics.
    #[must_use]
    pub fn from_env() -> LayoutConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> LayoutConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse config through a custom environment lookup.
    ///
    /// Values that fail to parse keep their default and are reported, as is
    /// every constraint the resulting config violates.
    pub fn from_env_with<F>(get: F) -> LayoutConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = LayoutConfig::default();
        let mut errors = config.apply_env_with(get);
        if let Err(violations) = config.validate() {
            errors.extend(violations);
        }
        LayoutConfigParse { config, errors }
    }

    /// Overlay environment values onto `self` without validating.
    ///
    /// Returns the values that failed to parse; those fields are unchanged.
    /// Callers that apply further overrides (command-line flags) validate
    /// once at the end.
    pub fn apply_env_with<F>(&mut self, mut get: F) -> Vec<ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let config = self;
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_CHARS_PER_LINE) {
            match parse_usize(&value) {
                Some(parsed) => config.chars_per_line = parsed,
                None => errors.push(ConfigError::new(
                    "chars_per_line",
                    value,
                    "expected positive integer",
                )),
            }
        }

        if let Some(value) = get(ENV_BLOCK_WIDTH) {
            match parse_usize(&value) {
                Some(parsed) => config.block_width = parsed,
                None => errors.push(ConfigError::new(
                    "block_width",
                    value,
                    "expected positive integer",
                )),
            }
        }

        if let Some(value) = get(ENV_DISPLAY_WIDTH) {
            match value.trim().parse::<Centi>() {
                Ok(parsed) => config.display_width = parsed,
                Err(_) => errors.push(ConfigError::new(
                    "display_width",
                    value,
                    "expected decimal length",
                )),
            }
        }

        if let Some(value) = get(ENV_MIN_DISTANCE) {
            match value.trim().parse::<Centi>() {
                Ok(parsed) => config.min_distance = parsed,
                Err(_) => errors.push(ConfigError::new(
                    "min_distance",
                    value,
                    "expected decimal length",
                )),
            }
        }

        if let Some(value) = get(ENV_GLYPH_POLICY) {
            match GlyphPolicy::parse(&value) {
                Some(parsed) => config.glyph_policy = parsed,
                None => errors.push(ConfigError::new(
                    "glyph_policy",
                    value,
                    "expected hangul|unicode",
                )),
            }
        }

        errors
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if let Err(err) =
            DisplayGeometry::new(self.chars_per_line, self.block_width, self.display_width)
        {
            errors.push(err.into());
        }
        if self.min_distance.is_negative() {
            errors.push(GeometryError::NegativeMinDistance(self.min_distance).into());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validated display geometry for this config.
    ///
    /// # Errors
    ///
    /// Returns the first geometry constraint the config violates.
    pub fn geometry(&self) -> Result<DisplayGeometry, GeometryError> {
        DisplayGeometry::new(self.chars_per_line, self.block_width, self.display_width)
    }

    /// Short human-readable summary for logs.
    #[must_use]
    pub fn summary_short(&self) -> String {
        format!(
            "{} cells · block {} · {} wide · min gap {} · {}",
            self.chars_per_line,
            self.block_width,
            self.display_width,
            self.min_distance,
            self.glyph_policy
        )
    }
}

#[inline]
fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}
