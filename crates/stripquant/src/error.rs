//! Error taxonomy for one image analysis.
//!
//! Every variant is terminal for the image being analysed: the pipeline never
//! retries or substitutes defaults, it reports the failing stage and lets the
//! caller decide whether to re-capture.

use crate::roles::SampleRole;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AssayError>;

/// Top-level pipeline error, one family per stage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssayError {
    /// No marker-colored pixels survived thresholding and erosion.
    #[error("segmentation failed: {found} marker pixels, need at least {needed}")]
    Segmentation {
        /// Pixels left in the mask.
        found: usize,
        /// Minimum required to form the clusters.
        needed: usize,
    },

    /// Spot centers could not be mapped onto sample roles.
    #[error("layout resolution failed: {0}")]
    Layout(#[from] LayoutError),

    /// A role's measurement region contained no pixels.
    #[error("intensity sampling failed: {0}")]
    Sampling(#[from] SamplingError),

    /// The calibration curve could not be fitted.
    #[error("calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    /// A configuration value was rejected before running.
    #[error("invalid configuration: {parameter} = {value}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        parameter: String,
        /// Rendered offending value.
        value: String,
    },
}

impl AssayError {
    pub(crate) fn invalid_config(parameter: &str, value: impl std::fmt::Display) -> Self {
        Self::InvalidConfig {
            parameter: parameter.to_string(),
            value: value.to_string(),
        }
    }
}

/// Failures of the centroid-to-role assignment.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// The resolver needs exactly one centroid per visible role.
    #[error("expected {expected} spot centers, got {got}")]
    WrongSpotCount {
        /// Number of visible roles.
        expected: usize,
        /// Number of centroids supplied.
        got: usize,
    },

    /// Two centroids coincide (or are non-finite), so no cell size exists.
    #[error("degenerate spot spacing: min pairwise distance {min_dist}")]
    DegenerateSpacing {
        /// Smallest pairwise centroid distance.
        min_dist: f64,
    },

    /// Column grouping did not produce the expected card columns.
    #[error("inconsistent column grouping: got column sizes {got:?}, expected {expected:?}")]
    InconsistentColumns {
        /// Observed member count per column, left to right.
        got: Vec<usize>,
        /// Expected member count per column.
        expected: Vec<usize>,
    },
}

/// Failures while measuring one role's intensity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    /// The role's point lies outside the image.
    #[error("{role} point ({x:.1}, {y:.1}) is outside the {width}x{height} image")]
    OutOfBounds {
        /// Role being sampled.
        role: SampleRole,
        /// Point x.
        x: f64,
        /// Point y.
        y: f64,
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// The measurement region had zero pixels.
    #[error("{role} measurement region is empty")]
    EmptyRegion {
        /// Role being sampled.
        role: SampleRole,
    },
}

/// Failures of the robust calibration fit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    /// Too few calibration points for a line.
    #[error("too few calibration points: need {needed}, got {got}")]
    TooFewPoints {
        /// Required minimum.
        needed: usize,
        /// Provided count.
        got: usize,
    },

    /// Calibration intensities have (numerically) no spread.
    #[error("degenerate calibration: intensity spread {spread} not above {min_spread}")]
    Degenerate {
        /// Max minus min calibration intensity.
        spread: f64,
        /// Minimum spread the fit required.
        min_spread: f64,
    },

    /// A calibration role lacks a reference concentration or intensity.
    #[error("missing calibration input for {role}")]
    MissingInput {
        /// Role with no usable data.
        role: SampleRole,
    },

    /// The weighted normal equations were singular or produced non-finite values.
    #[error("calibration fit produced a non-finite model")]
    NonFinite,
}
