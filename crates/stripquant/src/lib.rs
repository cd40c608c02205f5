//! stripquant — concentration estimates from photographs of colorimetric
//! multi-spot test cards.
//!
//! The card carries six calibrator spots, two quality-control spots and one
//! tested spot on a 3×3 grid. The pipeline stages are:
//!
//! 1. **Segment** – HSV thresholding of the red marker color plus disk erosion.
//! 2. **Locate** – k-means++ clustering of mask pixels into eight spot centers.
//! 3. **Layout** – column-major role assignment and extrapolation of the
//!    blank calibrator's corner.
//! 4. **Sample** – per-role gray intensity (region growing or fixed window).
//! 5. **Calibrate** – least-absolute-deviation fit of `ln(c + 1)` against
//!    intensity over the calibrators.
//! 6. **Estimate** – inversion for every role and QC percent variation.
//!
//! # Public API
//! - [`Analyzer`] as the primary entry point
//! - [`AssayConfig`] for tuning and reference tables
//! - [`LayoutResolver`] for alternative role-assignment strategies
//! - stage functions for recomposition and testing

mod analyzer;
pub mod calibration;
mod config;
mod error;
pub mod intensity;
pub mod layout;
mod pipeline;
mod roles;
pub mod spot;

#[cfg(test)]
pub(crate) mod test_utils;

pub use analyzer::Analyzer;
pub use calibration::{CalibrationModel, QcReport};
pub use config::{
    AssayConfig, ClusterConfig, ExtrapolatedSampling, FitConfig, HueBand, SamplingConfig,
    SamplingStrategy, SegmentConfig,
};
pub use error::{AssayError, CalibrationError, LayoutError, Result, SamplingError};
pub use layout::{GridLayoutResolver, LayoutResolver, SpotLayout};
pub use pipeline::{blur_rgb, AssayResult};
pub use roles::{
    ConcentrationMap, IntensityMap, ReferenceTable, RoleKind, RoleMap, SampleRole, ROLE_COUNT,
};
