//! Pixel → display position normalization and minimum-distance dedup.
//!
//! Detections arrive with pixel x-centers from the camera image. They are
//! mapped onto the physical display width, rounded half up to two decimals,
//! sorted left to right, and thinned so that no two kept detections are
//! closer than the configured minimum distance.
//!
//! The sort is stable: detections at the same position keep their input
//! order, and with a positive minimum distance only the first survives.

use std::fmt;

use shelf_core::{Centi, ExactDecimal, GeometryError};
use tracing::{debug, warn};

/// Identifier of one product instance, opaque to the layout engine.
pub type DetectionId = u64;

/// A detection as reported by the image pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawDetection {
    pub id: DetectionId,
    /// Horizontal center of the bounding box, in image pixels.
    pub pixel_x: f64,
    /// `"<name>,<price>,<promo>"` label text.
    pub label: String,
}

/// A detection positioned in display space, ready for layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Detection {
    pub id: DetectionId,
    /// Position along the display, in display length units.
    #[cfg_attr(feature = "serde", serde(rename = "x"))]
    pub logical_x: Centi,
    /// `"<name>,<price>,<promo>"` label text.
    pub label: String,
}

impl Detection {
    pub fn new(id: DetectionId, logical_x: Centi, label: impl Into<String>) -> Self {
        Self {
            id,
            logical_x,
            label: label.into(),
        }
    }
}

/// Errors constructing a [`PositionNormalizer`].
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// The source image width must be finite and positive.
    InvalidImageWidth(f64),
    /// Display width or minimum distance is invalid.
    Geometry(GeometryError),
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidImageWidth(width) => {
                write!(f, "image width must be finite and > 0 (got {width})")
            }
            Self::Geometry(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for NormalizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Geometry(err) => Some(err),
            Self::InvalidImageWidth(_) => None,
        }
    }
}

impl From<GeometryError> for NormalizeError {
    fn from(err: GeometryError) -> Self {
        Self::Geometry(err)
    }
}

/// Counts from one normalization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NormalizeReport {
    /// Detections handed on to layout.
    pub kept: usize,
    /// Dropped for being closer than the minimum distance to a kept one.
    pub too_close: usize,
    /// Dropped because the pixel position was not a usable number.
    pub invalid_position: usize,
}

/// Output of [`PositionNormalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Normalized {
    /// Kept detections, ascending by position.
    pub detections: Vec<Detection>,
    pub report: NormalizeReport,
}

/// Maps image pixels onto the display and thins crowded detections.
#[derive(Debug, Clone, Copy)]
pub struct PositionNormalizer {
    image_width: ExactDecimal,
    display_width: Centi,
    min_distance: Centi,
}

impl PositionNormalizer {
    /// # Errors
    ///
    /// Fails if `image_width` is not finite and positive, `display_width` is
    /// not positive, or `min_distance` is negative.
    pub fn new(
        image_width: f64,
        display_width: Centi,
        min_distance: Centi,
    ) -> Result<Self, NormalizeError> {
        let exact = ExactDecimal::from_f64(image_width)
            .filter(|w| !w.is_zero() && !w.is_negative())
            .ok_or(NormalizeError::InvalidImageWidth(image_width))?;
        if !display_width.is_positive() {
            return Err(GeometryError::NonPositiveDisplayWidth(display_width).into());
        }
        if min_distance.is_negative() {
            return Err(GeometryError::NegativeMinDistance(min_distance).into());
        }
        Ok(Self {
            image_width: exact,
            display_width,
            min_distance,
        })
    }

    #[must_use]
    pub fn min_distance(&self) -> Centi {
        self.min_distance
    }

    /// `round_half_up(pixel_x / image_width * display_width, 2)`.
    ///
    /// Returns `None` for non-finite or unrepresentable pixel values.
    #[must_use]
    pub fn to_logical(&self, pixel_x: f64) -> Option<Centi> {
        let scaled = ExactDecimal::from_f64(pixel_x)?
            .checked_mul(ExactDecimal::from_centi(self.display_width))?;
        Centi::from_ratio_half_up(scaled, self.image_width)
    }

    /// Convert, sort and dedup a batch of raw detections.
    pub fn normalize<I>(&self, raw: I) -> Normalized
    where
        I: IntoIterator<Item = RawDetection>,
    {
        let mut invalid_position = 0;
        let mut positioned = Vec::new();
        for det in raw {
            match self.to_logical(det.pixel_x) {
                Some(logical_x) => positioned.push(Detection {
                    id: det.id,
                    logical_x,
                    label: det.label,
                }),
                None => {
                    warn!(id = det.id, pixel_x = det.pixel_x, "dropping detection with unusable position");
                    invalid_position += 1;
                }
            }
        }

        order_by_position(&mut positioned);
        let (detections, too_close) = dedup_by_distance(positioned, self.min_distance);
        let report = NormalizeReport {
            kept: detections.len(),
            too_close,
            invalid_position,
        };
        Normalized { detections, report }
    }
}

/// Stable ascending sort by display position.
pub fn order_by_position(detections: &mut [Detection]) {
    detections.sort_by_key(|det| det.logical_x);
}

/// Greedy left-to-right thinning of position-sorted detections.
///
/// The first detection is always kept; each later one is kept only if it is
/// at least `min_distance` to the right of the last kept one. Returns the
/// kept detections and the number dropped.
pub fn dedup_by_distance(sorted: Vec<Detection>, min_distance: Centi) -> (Vec<Detection>, usize) {
    let total = sorted.len();
    let mut kept: Vec<Detection> = Vec::with_capacity(total);
    for det in sorted {
        match kept.last() {
            // A gap too wide for `Centi` is wider than any minimum distance.
            Some(last)
                if det
                    .logical_x
                    .checked_sub(last.logical_x)
                    .is_some_and(|gap| gap < min_distance) =>
            {
                debug!(
                    id = det.id,
                    logical_x = %det.logical_x,
                    kept_x = %last.logical_x,
                    "detection too close to previous one"
                );
            }
            _ => kept.push(det),
        }
    }
    let dropped = total - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> Centi {
        s.parse().unwrap()
    }

    fn raw(id: DetectionId, pixel_x: f64) -> RawDetection {
        RawDetection {
            id,
            pixel_x,
            label: format!("P{id},100,(행사X)"),
        }
    }

    fn normalizer() -> PositionNormalizer {
        PositionNormalizer::new(1000.0, c("30"), c("3")).unwrap()
    }

    #[test]
    fn converts_pixels_to_display_units() {
        let n = normalizer();
        assert_eq!(n.to_logical(0.0), Some(Centi::ZERO));
        assert_eq!(n.to_logical(500.0), Some(c("15")));
        assert_eq!(n.to_logical(1000.0), Some(c("30")));
        assert_eq!(n.to_logical(123.0), Some(c("3.69")));
    }

    #[test]
    fn conversion_rounds_half_up() {
        // 0.5 / 1000 * 30 = 0.015 -> 0.02
        assert_eq!(normalizer().to_logical(0.5), Some(c("0.02")));
        // 2.5 / 1000 * 30 = 0.075 -> 0.08
        assert_eq!(normalizer().to_logical(2.5), Some(c("0.08")));
        // 1 / 3 * 10 = 3.333… -> 3.33
        let n = PositionNormalizer::new(3.0, c("10"), Centi::ZERO).unwrap();
        assert_eq!(n.to_logical(1.0), Some(c("3.33")));
        assert_eq!(n.to_logical(2.0), Some(c("6.67")));
    }

    #[test]
    fn unusable_pixels_are_dropped() {
        let n = normalizer();
        assert_eq!(n.to_logical(f64::NAN), None);
        let out = n.normalize(vec![raw(1, f64::NAN), raw(2, 100.0), raw(3, f64::INFINITY)]);
        assert_eq!(out.detections.len(), 1);
        assert_eq!(out.detections[0].id, 2);
        assert_eq!(out.report.invalid_position, 2);
        assert_eq!(out.report.kept, 1);
    }

    #[test]
    fn sorts_then_dedups() {
        // 40 px = 1.20, 300 px = 9.00, 150 px = 4.50, 160 px = 4.80
        let out = normalizer().normalize(vec![raw(1, 300.0), raw(2, 40.0), raw(3, 150.0), raw(4, 160.0)]);
        let ids: Vec<_> = out.detections.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(out.report.too_close, 1);
        assert_eq!(out.report.kept, 3);
    }

    #[test]
    fn dedup_keeps_first_of_close_pair() {
        let dets = vec![
            Detection::new(1, c("4.00"), "a,b,c"),
            Detection::new(2, c("4.50"), "a,b,c"),
        ];
        let (kept, dropped) = dedup_by_distance(dets, c("3.00"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn dedup_distance_is_inclusive() {
        let dets = vec![
            Detection::new(1, c("1.00"), "a,b,c"),
            Detection::new(2, c("4.00"), "a,b,c"),
            Detection::new(3, c("6.99"), "a,b,c"),
        ];
        let (kept, _) = dedup_by_distance(dets, c("3.00"));
        let ids: Vec<_> = kept.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn dedup_compares_against_last_kept_not_last_seen() {
        let dets = vec![
            Detection::new(1, c("0"), "a,b,c"),
            Detection::new(2, c("2"), "a,b,c"),
            Detection::new(3, c("3"), "a,b,c"),
        ];
        let (kept, dropped) = dedup_by_distance(dets, c("3"));
        let ids: Vec<_> = kept.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn dedup_keeps_positions_at_opposite_extremes() {
        let far_left = Centi::from_hundredths(-5_000_000_000_000_000_000);
        let far_right = Centi::from_hundredths(5_000_000_000_000_000_000);
        let dets = vec![
            Detection::new(1, far_left, "a,b,c"),
            Detection::new(2, far_right, "a,b,c"),
        ];
        let (kept, dropped) = dedup_by_distance(dets, c("3"));
        let ids: Vec<_> = kept.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn widely_separated_pixels_normalize_without_overflow() {
        let n = PositionNormalizer::new(1.0, c("1"), c("3")).unwrap();
        let out = n.normalize(vec![raw(1, 5e16), raw(2, -5e16)]);
        let ids: Vec<_> = out.detections.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(out.report.kept, 2);
        assert_eq!(out.report.too_close, 0);
    }

    #[test]
    fn tiny_pixels_round_to_zero() {
        assert_eq!(normalizer().to_logical(1e-40), Some(Centi::ZERO));
        assert_eq!(normalizer().to_logical(-1e-40), Some(Centi::ZERO));
    }

    #[test]
    fn zero_min_distance_keeps_ties_in_input_order() {
        let n = PositionNormalizer::new(100.0, c("10"), Centi::ZERO).unwrap();
        let out = n.normalize(vec![raw(7, 50.0), raw(3, 50.0), raw(5, 10.0)]);
        let ids: Vec<_> = out.detections.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![5, 7, 3]);
    }

    #[test]
    fn constructor_rejects_bad_parameters() {
        assert_eq!(
            PositionNormalizer::new(0.0, c("30"), c("3")).unwrap_err(),
            NormalizeError::InvalidImageWidth(0.0)
        );
        assert!(PositionNormalizer::new(-5.0, c("30"), c("3")).is_err());
        assert!(PositionNormalizer::new(f64::NAN, c("30"), c("3")).is_err());
        assert_eq!(
            PositionNormalizer::new(100.0, Centi::ZERO, c("3")).unwrap_err(),
            NormalizeError::Geometry(GeometryError::NonPositiveDisplayWidth(Centi::ZERO))
        );
        assert_eq!(
            PositionNormalizer::new(100.0, c("30"), c("-1")).unwrap_err(),
            NormalizeError::Geometry(GeometryError::NegativeMinDistance(c("-1")))
        );
    }

    #[test]
    fn empty_input_is_empty_output() {
        let out = normalizer().normalize(Vec::new());
        assert!(out.detections.is_empty());
        assert_eq!(out.report, NormalizeReport::default());
    }
}
