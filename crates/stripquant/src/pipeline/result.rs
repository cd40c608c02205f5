use std::fmt;

use crate::calibration::{CalibrationModel, QcReport};
use crate::layout::SpotLayout;
use crate::roles::{ConcentrationMap, IntensityMap, ROLE_COUNT};

/// Full analysis result for a single card image.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssayResult {
    /// Estimated concentration per role, in role order (C1..C6, QC1, QC2, Tested).
    pub concentrations: ConcentrationMap,
    /// QC percent variations.
    #[serde(flatten)]
    pub qc: QcReport,
    /// Measured intensity per role.
    pub intensities: IntensityMap,
    /// Fitted calibration line.
    pub model: CalibrationModel,
    /// Role locations in image pixels.
    pub layout: SpotLayout,
    /// Marker pixels left after segmentation.
    pub mask_pixels: usize,
    /// Image dimensions [width, height].
    pub image_size: [u32; 2],
}

impl AssayResult {
    /// Concentrations as a plain array in role order.
    pub fn values(&self) -> [f64; ROLE_COUNT] {
        *self.concentrations.values()
    }

    /// Estimated concentration of the tested spot.
    pub fn tested_concentration(&self) -> f64 {
        self.concentrations[crate::SampleRole::Tested]
    }
}

impl fmt::Display for AssayResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in self.concentrations.values() {
            writeln!(f, "Value: {:.6}", value)?;
        }
        writeln!(f, "QC1 VAR: {:.6}", self.qc.qc1_variation)?;
        writeln!(f, "QC2 VAR: {:.6}", self.qc.qc2_variation)
    }
}
