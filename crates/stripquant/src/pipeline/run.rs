//! Top-level orchestrator for one image.

use image::RgbImage;

use super::preprocess::smooth;
use super::AssayResult;
use crate::calibration::{estimate_concentrations, fit_calibration, qc_report};
use crate::config::AssayConfig;
use crate::error::{AssayError, Result};
use crate::intensity::measure_intensities;
use crate::layout::LayoutResolver;
use crate::spot::{locate_spots, segment_markers};

pub(crate) fn run(
    image: &RgbImage,
    config: &AssayConfig,
    resolver: &dyn LayoutResolver,
) -> Result<AssayResult> {
    config.validate()?;
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(AssayError::Segmentation {
            found: 0,
            needed: config.cluster.k,
        });
    }

    let smoothed = smooth(image, config.blur_sigma);

    let mask = segment_markers(&smoothed, &config.segment);
    let points = mask.points();
    tracing::info!("{} marker pixels in {}x{} image", points.len(), w, h);

    let clusters = locate_spots(&points, &config.cluster)?;
    tracing::info!(
        "{} spot centers located (cluster sizes {:?})",
        clusters.centers.len(),
        clusters.sizes
    );

    let layout = resolver.resolve(&clusters.centers)?;
    let intensities = measure_intensities(&smoothed, &mask, &layout, &config.sampling)?;
    let model = fit_calibration(&intensities, &config.references, &config.fit)?;
    let concentrations = estimate_concentrations(&model, &intensities);
    let qc = qc_report(&concentrations, &config.references);

    tracing::info!(
        "tested concentration {:.4}, QC1 {:.2}%, QC2 {:.2}%",
        concentrations[crate::SampleRole::Tested],
        qc.qc1_variation,
        qc.qc2_variation
    );
    if qc.worst() > config.qc_warn_percent {
        tracing::warn!(
            "QC variation {:.2}% exceeds {:.2}%",
            qc.worst(),
            config.qc_warn_percent
        );
    }

    Ok(AssayResult {
        concentrations,
        qc,
        intensities,
        model,
        layout,
        mask_pixels: points.len(),
        image_size: [w, h],
    })
}
