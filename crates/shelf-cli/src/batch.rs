//! Detection batches: JSON in, display text or payload out.

use std::fmt;

use serde::{Deserialize, Serialize};
use shelf_core::{Centi, GeometryError};
use shelf_layout::{
    Detection, DetectionId, DisplayPayload, LayoutEngine, LayoutOutcome, NormalizeError,
    NormalizeReport, PassReport, PositionNormalizer, RawDetection, order_by_position,
};
use tracing::{debug, warn};

use crate::cli::{Opts, OutputFormat};

/// Display id used when neither the batch nor the command line names one.
pub const DEFAULT_DISPLAY_ID: &str = "display";

/// One detection batch for a single display.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub display_id: Option<String>,
    /// Width of the source image in pixels. Selects pixel positions.
    #[serde(default)]
    pub image_width: Option<f64>,
    pub detections: Vec<BatchDetection>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchDetection {
    pub id: DetectionId,
    #[serde(default)]
    pub pixel_x: Option<f64>,
    #[serde(default)]
    pub x: Option<Centi>,
    pub label: String,
}

/// JSON output: the display payload plus what happened in the pass.
#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    payload: &'a DisplayPayload,
    report: &'a PassReport,
}

#[derive(Debug)]
pub enum BatchError {
    /// The batch is not valid JSON of the expected shape.
    Parse(serde_json::Error),
    /// `image_width` is unusable for normalization.
    Normalize(NormalizeError),
    /// The configured geometry is invalid.
    Geometry(GeometryError),
    /// Serializing JSON output failed.
    Output(serde_json::Error),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid detection batch: {err}"),
            Self::Normalize(err) => write!(f, "cannot normalize positions: {err}"),
            Self::Geometry(err) => write!(f, "invalid display geometry: {err}"),
            Self::Output(err) => write!(f, "cannot encode output: {err}"),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) | Self::Output(err) => Some(err),
            Self::Normalize(err) => Some(err),
            Self::Geometry(err) => Some(err),
        }
    }
}

impl From<NormalizeError> for BatchError {
    fn from(err: NormalizeError) -> Self {
        Self::Normalize(err)
    }
}

impl From<GeometryError> for BatchError {
    fn from(err: GeometryError) -> Self {
        Self::Geometry(err)
    }
}

impl Batch {
    /// # Errors
    ///
    /// Fails if `text` is not a batch object.
    pub fn from_json(text: &str) -> Result<Self, BatchError> {
        serde_json::from_str(text).map_err(BatchError::Parse)
    }

    /// Position, order and (for pixel input) thin the detections.
    ///
    /// Detections missing the position field for their path are dropped and
    /// counted as invalid positions.
    ///
    /// # Errors
    ///
    /// Fails only for an unusable `image_width` or normalizer parameters.
    pub fn into_detections(
        self,
        opts: &Opts,
    ) -> Result<(Vec<Detection>, NormalizeReport), BatchError> {
        match self.image_width {
            Some(image_width) => {
                let normalizer = PositionNormalizer::new(
                    image_width,
                    opts.config.display_width,
                    opts.config.min_distance,
                )?;
                let raw = self.detections.into_iter().map(|det| RawDetection {
                    id: det.id,
                    pixel_x: det.pixel_x.unwrap_or(f64::NAN),
                    label: det.label,
                });
                let normalized = normalizer.normalize(raw);
                Ok((normalized.detections, normalized.report))
            }
            None => {
                let mut invalid_position = 0;
                let mut detections = Vec::with_capacity(self.detections.len());
                for det in self.detections {
                    match det.x {
                        Some(x) => detections.push(Detection::new(det.id, x, det.label)),
                        None => {
                            warn!(id = det.id, "dropping detection without a display position");
                            invalid_position += 1;
                        }
                    }
                }
                order_by_position(&mut detections);
                let report = NormalizeReport {
                    kept: detections.len(),
                    too_close: 0,
                    invalid_position,
                };
                Ok((detections, report))
            }
        }
    }
}

/// Lay out one batch and render it in the requested format.
///
/// # Errors
///
/// Configuration and input errors only; skipped detections are reported,
/// not returned as errors.
pub fn run(opts: &Opts, input: &str) -> Result<String, BatchError> {
    let engine = LayoutEngine::from_config(&opts.config)?;
    let batch = Batch::from_json(input)?;
    let display_id = opts
        .display_id
        .clone()
        .or_else(|| batch.display_id.clone())
        .unwrap_or_else(|| DEFAULT_DISPLAY_ID.to_string());
    debug!(
        display_id = %display_id,
        detections = batch.detections.len(),
        pixel_input = batch.image_width.is_some(),
        "batch loaded"
    );

    let (detections, normalize_report) = batch.into_detections(opts)?;
    let mut pass = engine.begin();
    pass.set_normalize_report(normalize_report);
    pass.place_all(&detections);
    let outcome = pass.finish();

    render(&display_id, &outcome, opts.format)
}

fn render(
    display_id: &str,
    outcome: &LayoutOutcome,
    format: OutputFormat,
) -> Result<String, BatchError> {
    match format {
        OutputFormat::Text => Ok(outcome.text()),
        OutputFormat::Json => {
            let payload = DisplayPayload::from_outcome(display_id, outcome);
            serde_json::to_string(&JsonOutput {
                payload: &payload,
                report: &outcome.report,
            })
            .map_err(BatchError::Output)
        }
    }
}
