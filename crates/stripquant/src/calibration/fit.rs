//! Least-absolute-deviation line fit via iteratively reweighted least squares.

use nalgebra::{Matrix2, Vector2};

use super::CalibrationModel;
use crate::config::FitConfig;
use crate::error::{CalibrationError, Result};
use crate::roles::{IntensityMap, ReferenceTable, SampleRole};

fn weighted_line(points: &[[f64; 2]], weights: &[f64]) -> Option<(f64, f64)> {
    let mut normal = Matrix2::<f64>::zeros();
    let mut rhs = Vector2::<f64>::zeros();
    for (&[x, y], &w) in points.iter().zip(weights) {
        normal[(0, 0)] += w * x * x;
        normal[(0, 1)] += w * x;
        normal[(1, 1)] += w;
        rhs[0] += w * x * y;
        rhs[1] += w * y;
    }
    normal[(1, 0)] = normal[(0, 1)];
    let sol = normal.lu().solve(&rhs)?;
    if sol.iter().all(|v| v.is_finite()) {
        Some((sol[0], sol[1]))
    } else {
        None
    }
}

/// Fit `y = slope * x + intercept` minimizing `Σ |residual|`.
///
/// Starts from ordinary least squares and reweights with `1 / max(|r|, floor)`
/// until slope and intercept settle. Fails explicitly when the x spread is
/// not above `config.min_intensity_spread` (clamped to zero), where the line
/// is undefined.
pub fn fit_lad_line(
    points: &[[f64; 2]],
    config: &FitConfig,
) -> std::result::Result<CalibrationModel, CalibrationError> {
    if points.len() < 2 {
        return Err(CalibrationError::TooFewPoints {
            needed: 2,
            got: points.len(),
        });
    }
    let finite = |p: &[f64; 2]| p[0].is_finite() && p[1].is_finite();
    if !points.iter().all(finite) {
        return Err(CalibrationError::NonFinite);
    }
    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[0]), hi.max(p[0]))
        });
    let spread = hi - lo;
    let min_spread = config.min_intensity_spread.max(0.0);
    if spread <= min_spread {
        return Err(CalibrationError::Degenerate { spread, min_spread });
    }

    let mut weights = vec![1.0; points.len()];
    let (mut slope, mut intercept) =
        weighted_line(points, &weights).ok_or(CalibrationError::NonFinite)?;

    for iter in 0..config.max_iters {
        for (w, &[x, y]) in weights.iter_mut().zip(points) {
            let r = y - (slope * x + intercept);
            *w = 1.0 / r.abs().max(config.residual_floor);
        }
        let (s, b) = weighted_line(points, &weights).ok_or(CalibrationError::NonFinite)?;
        let delta = (s - slope).abs() + (b - intercept).abs();
        slope = s;
        intercept = b;
        if delta < config.tolerance {
            tracing::trace!("LAD fit converged after {} reweightings", iter + 1);
            break;
        }
    }

    Ok(CalibrationModel { slope, intercept })
}

/// Fit the calibration curve from the six calibrator intensities.
pub fn fit_calibration(
    intensities: &IntensityMap,
    references: &ReferenceTable,
    config: &FitConfig,
) -> Result<CalibrationModel> {
    let mut points = Vec::with_capacity(SampleRole::CALIBRATORS.len());
    for role in SampleRole::CALIBRATORS {
        let conc = references
            .reference(role)
            .ok_or(CalibrationError::MissingInput { role })?;
        let intensity = intensities[role];
        let log_conc = (conc + 1.0).ln();
        if !intensity.is_finite() || !log_conc.is_finite() {
            return Err(CalibrationError::MissingInput { role }.into());
        }
        points.push([intensity, log_conc]);
    }

    let model = fit_lad_line(&points, config)?;
    let mad = points
        .iter()
        .map(|&[x, y]| (y - model.log_concentration(x)).abs())
        .sum::<f64>()
        / points.len() as f64;
    tracing::info!(
        "calibration: ln(c+1) = {:.6} * I + {:.6} (mean |residual| {:.4})",
        model.slope,
        model.intercept,
        mad
    );
    Ok(model)
}
