//! Inversion of the calibration curve and QC self-check.

use super::CalibrationModel;
use crate::roles::{ConcentrationMap, IntensityMap, ReferenceTable, RoleKind, SampleRole};

/// Percent deviation of each QC spot from its reference concentration.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QcReport {
    pub qc1_variation: f64,
    pub qc2_variation: f64,
}

impl QcReport {
    /// Larger of the two variations.
    pub fn worst(&self) -> f64 {
        self.qc1_variation.max(self.qc2_variation)
    }
}

/// `|estimated - reference| / reference * 100`.
#[inline]
pub fn percent_variation(estimated: f64, reference: f64) -> f64 {
    (estimated - reference).abs() / reference * 100.0
}

/// Concentration for every role, calibrators included.
pub fn estimate_concentrations(
    model: &CalibrationModel,
    intensities: &IntensityMap,
) -> ConcentrationMap {
    intensities.map(|_, &i| model.concentration(i))
}

/// QC variation from estimated concentrations and the kit's references.
pub fn qc_report(concentrations: &ConcentrationMap, references: &ReferenceTable) -> QcReport {
    let mut variation = [0.0; 2];
    for role in SampleRole::QUALITY_CONTROLS {
        if let RoleKind::QualityControl(level) = role.kind() {
            let reference = references.quality_controls[level];
            variation[level] = percent_variation(concentrations[role], reference);
        }
    }
    QcReport {
        qc1_variation: variation[0],
        qc2_variation: variation[1],
    }
}
