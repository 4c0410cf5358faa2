//! Display geometry and fixed-point positions.
//!
//! Physical positions along the shelf are decimals with two fractional
//! digits. They are stored as [`Centi`] (integer hundredths) so that the
//! rounding rules below give the same answer on every platform:
//!
//! - pixel → physical conversion rounds **half up** (away from zero) to two
//!   decimals ([`Centi::from_ratio_half_up`]);
//! - physical → cell index conversion rounds **half to even**
//!   ([`DisplayGeometry::base_cell`]).
//!
//! All intermediate arithmetic is exact rational arithmetic on `i128`;
//! nothing goes through binary floating point.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// A signed decimal with exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Centi(i64);

impl Centi {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    #[must_use]
    pub const fn hundredths(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Lossy conversion for display and benchmarks only.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Convert a binary float through its shortest decimal representation.
    ///
    /// `0.1_f64` becomes exactly `0.10`, not `0.1000000000000000055…`.
    /// Returns `None` for non-finite input or magnitudes that do not fit.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        ExactDecimal::from_f64(value)?.to_centi()
    }

    /// `num / den` rounded half away from zero to two decimals.
    ///
    /// Both operands are exact decimals; `den` must be non-zero.
    #[must_use]
    pub fn from_ratio_half_up(num: ExactDecimal, den: ExactDecimal) -> Option<Self> {
        if den.mantissa == 0 {
            return None;
        }
        // num/den * 100 = (n_m * 10^d_s * 100) / (d_m * 10^n_s)
        let mut n = num
            .mantissa
            .checked_mul(pow10(den.scale)?)?
            .checked_mul(100)?;
        let mut d = den.mantissa.checked_mul(pow10(num.scale)?)?;
        if d < 0 {
            n = n.checked_neg()?;
            d = d.checked_neg()?;
        }
        let hundredths = div_round_half_up(n, d);
        i64::try_from(hundredths).ok().map(Self)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl Add for Centi {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Centi {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Centi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Error parsing a decimal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCentiError {
    pub input: String,
}

impl fmt::Display for ParseCentiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid decimal: {:?}", self.input)
    }
}

impl std::error::Error for ParseCentiError {}

impl FromStr for Centi {
    type Err = ParseCentiError;

    /// Parse a plain decimal (`"30"`, `"4.5"`, `"-0.125"`). Extra fractional
    /// digits are rounded half up.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExactDecimal::parse(s)
            .and_then(ExactDecimal::to_centi)
            .ok_or_else(|| ParseCentiError {
                input: s.to_string(),
            })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Centi {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Centi {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Centi::from_f64(value)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal: {value}"))),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// An exact decimal `mantissa × 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactDecimal {
    mantissa: i128,
    scale: u32,
}

/// 10^36 is the largest power of ten that leaves headroom in `i128`.
const MAX_DIGITS: usize = 36;

/// Fraction digits kept by [`ExactDecimal::parse`]. Later digits are
/// truncated toward zero, which never moves a value across a two-decimal
/// half-up boundary.
const MAX_FRACTION_DIGITS: usize = 18;

impl ExactDecimal {
    #[must_use]
    pub const fn new(mantissa: i128, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    #[must_use]
    pub fn from_centi(value: Centi) -> Self {
        Self::new(i128::from(value.0), 2)
    }

    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        // `Display` for f64 is the shortest round-trip form and never uses
        // exponent notation.
        Self::parse(&value.to_string())
    }

    /// Parse plain decimal text. Fractions longer than 18 places are
    /// truncated; `None` for anything else that is not a decimal number.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, digits) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let int_part = int_part.trim_start_matches('0');
        let kept_frac = frac_part.len().min(MAX_FRACTION_DIGITS);
        let frac_part = frac_part[..kept_frac].trim_end_matches('0');
        if int_part.len() + frac_part.len() > MAX_DIGITS {
            return None;
        }
        let mut mantissa: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa * 10 + i128::from(b - b'0');
        }
        if negative {
            mantissa = -mantissa;
        }
        Some(Self::new(mantissa, frac_part.len() as u32))
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.mantissa == 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.mantissa < 0
    }

    #[must_use]
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        Some(Self::new(
            self.mantissa.checked_mul(rhs.mantissa)?,
            self.scale.checked_add(rhs.scale)?,
        ))
    }

    /// Round half up to two decimals.
    #[must_use]
    pub fn to_centi(self) -> Option<Centi> {
        Centi::from_ratio_half_up(self, Self::new(1, 0))
    }
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

/// `num / den` rounded half away from zero. `den > 0`.
fn div_round_half_up(num: i128, den: i128) -> i128 {
    let q = num / den;
    let r = num % den;
    if r.unsigned_abs() * 2 >= den.unsigned_abs() {
        q + num.signum()
    } else {
        q
    }
}

/// `num / den` rounded half to even. `den > 0`.
fn div_round_half_even(num: i128, den: i128) -> i128 {
    let q = num.div_euclid(den);
    let twice_r = num.rem_euclid(den) * 2;
    match twice_r.cmp(&den) {
        Ordering::Greater => q + 1,
        Ordering::Equal if q % 2 != 0 => q + 1,
        _ => q,
    }
}

/// Error for an invalid display geometry parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// `chars_per_line` must be at least 1.
    ZeroCharsPerLine,
    /// `block_width` must be at least 1.
    ZeroBlockWidth,
    /// The block must fit on one line.
    BlockWiderThanLine {
        block_width: usize,
        chars_per_line: usize,
    },
    /// The physical display width must be positive.
    NonPositiveDisplayWidth(Centi),
    /// The minimum separation between detections cannot be negative.
    NegativeMinDistance(Centi),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCharsPerLine => write!(f, "chars_per_line must be >= 1"),
            Self::ZeroBlockWidth => write!(f, "block_width must be >= 1"),
            Self::BlockWiderThanLine {
                block_width,
                chars_per_line,
            } => write!(
                f,
                "block_width {block_width} exceeds chars_per_line {chars_per_line}"
            ),
            Self::NonPositiveDisplayWidth(width) => {
                write!(f, "display_width must be > 0 (got {width})")
            }
            Self::NegativeMinDistance(distance) => {
                write!(f, "min_distance must be >= 0 (got {distance})")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Validated geometry of one physical display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    chars_per_line: usize,
    block_width: usize,
    display_width: Centi,
}

impl DisplayGeometry {
    /// Validate and build a geometry.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint: `chars_per_line >= 1`,
    /// `1 <= block_width <= chars_per_line`, `display_width > 0`.
    pub fn new(
        chars_per_line: usize,
        block_width: usize,
        display_width: Centi,
    ) -> Result<Self, GeometryError> {
        if chars_per_line == 0 {
            return Err(GeometryError::ZeroCharsPerLine);
        }
        if block_width == 0 {
            return Err(GeometryError::ZeroBlockWidth);
        }
        if block_width > chars_per_line {
            return Err(GeometryError::BlockWiderThanLine {
                block_width,
                chars_per_line,
            });
        }
        if !display_width.is_positive() {
            return Err(GeometryError::NonPositiveDisplayWidth(display_width));
        }
        Ok(Self {
            chars_per_line,
            block_width,
            display_width,
        })
    }

    #[must_use]
    pub const fn chars_per_line(&self) -> usize {
        self.chars_per_line
    }

    #[must_use]
    pub const fn block_width(&self) -> usize {
        self.block_width
    }

    #[must_use]
    pub const fn display_width(&self) -> Centi {
        self.display_width
    }

    /// Cell nearest to a physical position, ties to even.
    ///
    /// May be negative or past the end for positions outside the display.
    #[must_use]
    pub fn base_cell(&self, logical_x: Centi) -> i64 {
        let num = i128::from(logical_x.hundredths()) * self.chars_per_line as i128;
        let den = i128::from(self.display_width.hundredths());
        let cell = div_round_half_even(num, den);
        cell.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// First cell of the block centered on `base_cell`, clamped so the whole
    /// block stays on the line.
    #[must_use]
    pub fn block_start(&self, base_cell: i64) -> usize {
        let half = (self.block_width / 2) as i64;
        let max_start = (self.chars_per_line - self.block_width) as i64;
        base_cell.saturating_sub(half).clamp(0, max_start) as usize
    }
}

/// Characters per line for a screen of `screen_width_px` pixels rendered in
/// a fixed-pitch font whose narrow glyph is `glyph_width_px` wide.
#[must_use]
pub fn chars_per_line_for(screen_width_px: u32, glyph_width_px: u32) -> Option<usize> {
    if glyph_width_px == 0 {
        return None;
    }
    Some((screen_width_px / glyph_width_px) as usize)
}
