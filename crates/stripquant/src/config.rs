//! Tunable parameters of the analysis pipeline.
//!
//! All sections use `#[serde(default)]`, so a JSON file only needs to name
//! the values it overrides.

use std::path::Path;

use crate::error::{AssayError, Result};
use crate::roles::ReferenceTable;

/// Inclusive hue band in degrees, `0.0 <= lo <= hi <= 360.0`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HueBand {
    pub lo: f32,
    pub hi: f32,
}

impl HueBand {
    pub const fn new(lo: f32, hi: f32) -> Self {
        Self { lo, hi }
    }

    #[inline]
    pub fn contains(&self, hue_deg: f32) -> bool {
        hue_deg >= self.lo && hue_deg <= self.hi
    }
}

/// Marker color thresholding and mask cleanup.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Hue bands unioned into the marker color. Red wraps around 0°, hence two.
    pub hue_bands: [HueBand; 2],
    /// Minimum HSV saturation in `[0, 1]`.
    pub min_saturation: f32,
    /// Minimum HSV value in `[0, 1]`.
    pub min_value: f32,
    /// Radius (px) of the disk-shaped erosion element; 0 disables erosion.
    pub erode_radius: u8,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            hue_bands: [HueBand::new(0.0, 20.0), HueBand::new(320.0, 360.0)],
            min_saturation: 0.35,
            min_value: 0.35,
            erode_radius: 3,
        }
    }
}

/// k-means clustering of mask pixels into spot centers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of clusters; the card has eight visible spots.
    pub k: usize,
    /// Independent restarts; the most compact result wins.
    pub attempts: usize,
    /// Iteration cap per restart.
    pub max_iters: usize,
    /// Convergence threshold on the largest centroid shift (px).
    pub epsilon: f64,
    /// Seed of the deterministic RNG used for k-means++ seeding.
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: 8,
            attempts: 5,
            max_iters: 10_000,
            epsilon: 1e-3,
            seed: 0x5eed_5107,
        }
    }
}

/// How a detected role's intensity is measured.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Mean gray over the connected mask region containing the spot center.
    RegionGrowing,
    /// Median gray over a fixed rectangle around the spot center.
    FixedWindow { half_width: u32, half_height: u32 },
}

/// How the extrapolated role (no marker of its own) is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolatedSampling {
    /// Assume no absorption: full-scale white (255).
    ///
    /// Only holds for a blank calibrator on white paper; see `Window`.
    AssumeBlank,
    /// Median gray over a window of `SamplingConfig::extrapolated_half_window`
    /// around the extrapolated point.
    Window,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub strategy: SamplingStrategy,
    pub extrapolated: ExtrapolatedSampling,
    /// Half-size (px) of the square used by [`ExtrapolatedSampling::Window`].
    pub extrapolated_half_window: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::RegionGrowing,
            extrapolated: ExtrapolatedSampling::AssumeBlank,
            extrapolated_half_window: 5,
        }
    }
}

/// Robust (least-absolute-deviation) line fit controls.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Maximum reweighting iterations.
    pub max_iters: usize,
    /// Stop when slope and intercept change by less than this.
    pub tolerance: f64,
    /// Residual floor for the `1 / |r|` weights.
    pub residual_floor: f64,
    /// Minimum calibration intensity spread (gray levels) for a usable fit.
    pub min_intensity_spread: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            tolerance: 1e-10,
            residual_floor: 1e-6,
            min_intensity_spread: 1e-9,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssayConfig {
    /// Gaussian blur applied to the input before segmentation and sampling.
    pub blur_sigma: Option<f32>,
    pub segment: SegmentConfig,
    pub cluster: ClusterConfig,
    pub sampling: SamplingConfig,
    pub references: ReferenceTable,
    pub fit: FitConfig,
    /// QC variation (%) above which a warning is logged.
    pub qc_warn_percent: f64,
}

impl Default for AssayConfig {
    fn default() -> Self {
        Self {
            blur_sigma: Some(1.5),
            segment: SegmentConfig::default(),
            cluster: ClusterConfig::default(),
            sampling: SamplingConfig::default(),
            references: ReferenceTable::default(),
            fit: FitConfig::default(),
            qc_warn_percent: 15.0,
        }
    }
}

impl AssayConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if let Some(sigma) = self.blur_sigma {
            if !sigma.is_finite() || sigma < 0.0 {
                return Err(AssayError::invalid_config("blur_sigma", sigma));
            }
        }
        for band in &self.segment.hue_bands {
            let in_range = |deg: f32| (0.0..=360.0).contains(&deg);
            if !in_range(band.lo) || !in_range(band.hi) || band.lo > band.hi {
                return Err(AssayError::invalid_config(
                    "segment.hue_bands",
                    format!("[{}, {}]", band.lo, band.hi),
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.segment.min_saturation) {
            return Err(AssayError::invalid_config(
                "segment.min_saturation",
                self.segment.min_saturation,
            ));
        }
        if !(0.0..=1.0).contains(&self.segment.min_value) {
            return Err(AssayError::invalid_config(
                "segment.min_value",
                self.segment.min_value,
            ));
        }
        if self.cluster.k != crate::layout::VISIBLE_SPOTS {
            return Err(AssayError::invalid_config("cluster.k", self.cluster.k));
        }
        if self.cluster.attempts == 0 {
            return Err(AssayError::invalid_config("cluster.attempts", 0));
        }
        if self.cluster.max_iters == 0 {
            return Err(AssayError::invalid_config("cluster.max_iters", 0));
        }
        if !(self.cluster.epsilon.is_finite() && self.cluster.epsilon >= 0.0) {
            return Err(AssayError::invalid_config(
                "cluster.epsilon",
                self.cluster.epsilon,
            ));
        }
        for (i, &c) in self.references.calibrators.iter().enumerate() {
            if !(c.is_finite() && c > -1.0) {
                return Err(AssayError::invalid_config(
                    &format!("references.calibrators[{i}]"),
                    c,
                ));
            }
        }
        for (i, &c) in self.references.quality_controls.iter().enumerate() {
            // QC variation divides by the reference.
            if !(c.is_finite() && c > 0.0) {
                return Err(AssayError::invalid_config(
                    &format!("references.quality_controls[{i}]"),
                    c,
                ));
            }
        }
        if self.fit.max_iters == 0 {
            return Err(AssayError::invalid_config("fit.max_iters", 0));
        }
        if !(self.fit.residual_floor.is_finite() && self.fit.residual_floor > 0.0) {
            return Err(AssayError::invalid_config(
                "fit.residual_floor",
                self.fit.residual_floor,
            ));
        }
        if !(self.fit.tolerance.is_finite() && self.fit.tolerance >= 0.0) {
            return Err(AssayError::invalid_config(
                "fit.tolerance",
                self.fit.tolerance,
            ));
        }
        // A negative or NaN spread would switch off the degeneracy guard.
        let spread = self.fit.min_intensity_spread;
        if !(spread.is_finite() && spread >= 0.0) {
            return Err(AssayError::invalid_config(
                "fit.min_intensity_spread",
                spread,
            ));
        }
        if !self.qc_warn_percent.is_finite() {
            return Err(AssayError::invalid_config(
                "qc_warn_percent",
                self.qc_warn_percent,
            ));
        }
        Ok(())
    }
}
