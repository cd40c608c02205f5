//! Calibration curve: fit from the calibrator spots, inversion for every spot.
//!
//! The model is log-linear, `ln(c + 1) = slope * intensity + intercept`.

mod estimate;
mod fit;

pub use estimate::{estimate_concentrations, percent_variation, qc_report, QcReport};
pub use fit::{fit_calibration, fit_lad_line};

/// Fitted calibration line in log-concentration space.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationModel {
    pub slope: f64,
    pub intercept: f64,
}

impl CalibrationModel {
    /// `ln(c + 1)` predicted for `intensity`.
    #[inline]
    pub fn log_concentration(&self, intensity: f64) -> f64 {
        self.slope * intensity + self.intercept
    }

    /// Concentration predicted for `intensity`.
    #[inline]
    pub fn concentration(&self, intensity: f64) -> f64 {
        self.log_concentration(intensity).exp() - 1.0
    }

    /// Intensity at which the model predicts `concentration`.
    ///
    /// `None` for a flat model.
    pub fn intensity_for(&self, concentration: f64) -> Option<f64> {
        if self.slope == 0.0 || !self.slope.is_finite() {
            return None;
        }
        Some(((concentration + 1.0).ln() - self.intercept) / self.slope)
    }
}
