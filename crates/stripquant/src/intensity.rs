//! Per-role grayscale intensity measurement.
//!
//! Two strategies are available (see [`SamplingStrategy`]). Region growing
//! labels the connected components of the color mask once and averages the
//! gray level over the component under each spot center, which adapts to the
//! real spot size. The fixed window takes the median of a rectangle around
//! the center.
//!
//! The extrapolated role has no marker region of its own; it is either
//! assumed blank (full-scale white) or measured with a window at its
//! extrapolated location, per [`ExtrapolatedSampling`].

use image::{GrayImage, Luma, RgbImage};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::config::{ExtrapolatedSampling, SamplingConfig, SamplingStrategy};
use crate::error::{Result, SamplingError};
use crate::layout::SpotLayout;
use crate::roles::{IntensityMap, RoleMap, SampleRole};
use crate::spot::ColorMask;

/// Gray level of an unabsorbing (white) spot.
pub const FULL_SCALE_INTENSITY: f64 = 255.0;

/// Luma conversion shared by every sampling path.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

fn pixel_of(
    role: SampleRole,
    p: [f64; 2],
    (w, h): (u32, u32),
) -> std::result::Result<(u32, u32), SamplingError> {
    let x = p[0].round();
    let y = p[1].round();
    let inside = |v: f64, n: u32| v.is_finite() && v >= 0.0 && v < n as f64;
    if !(inside(x, w) && inside(y, h)) {
        return Err(SamplingError::OutOfBounds {
            role,
            x: p[0],
            y: p[1],
            width: w,
            height: h,
        });
    }
    Ok((x as u32, y as u32))
}

/// Median gray value of the window `center ± (half_w, half_h)`, clipped to the image.
pub fn window_median(
    gray: &GrayImage,
    role: SampleRole,
    center: [f64; 2],
    half_w: u32,
    half_h: u32,
) -> std::result::Result<f64, SamplingError> {
    let (cx, cy) = pixel_of(role, center, gray.dimensions())?;
    let (w, h) = gray.dimensions();
    let x0 = cx.saturating_sub(half_w);
    let y0 = cy.saturating_sub(half_h);
    let x1 = cx.saturating_add(half_w).min(w - 1);
    let y1 = cy.saturating_add(half_h).min(h - 1);

    let mut values: Vec<u8> = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize);
    for y in y0..=y1 {
        for x in x0..=x1 {
            values.push(gray.get_pixel(x, y)[0]);
        }
    }
    median_u8(&mut values).ok_or(SamplingError::EmptyRegion { role })
}

fn median_u8(values: &mut [u8]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let n = values.len();
    let mid = n / 2;
    if n % 2 == 1 {
        Some(values[mid] as f64)
    } else {
        Some(0.5 * (values[mid - 1] as f64 + values[mid] as f64))
    }
}

/// Gray sum and pixel count per connected mask component.
struct RegionStats {
    labels: image::ImageBuffer<Luma<u32>, Vec<u32>>,
    sums: Vec<u64>,
    counts: Vec<u64>,
}

impl RegionStats {
    fn new(gray: &GrayImage, mask: &ColorMask) -> Self {
        let labels = connected_components(mask.as_gray(), Connectivity::Eight, Luma([0u8]));
        let n_labels = labels.as_raw().iter().copied().max().unwrap_or(0) as usize + 1;
        let mut sums = vec![0u64; n_labels];
        let mut counts = vec![0u64; n_labels];
        for (&label, &g) in labels.as_raw().iter().zip(gray.as_raw()) {
            if label != 0 {
                sums[label as usize] += g as u64;
                counts[label as usize] += 1;
            }
        }
        Self {
            labels,
            sums,
            counts,
        }
    }

    /// Mean gray of the component containing `(x, y)`.
    fn mean_at(&self, role: SampleRole, x: u32, y: u32) -> std::result::Result<f64, SamplingError> {
        let label = self.labels.get_pixel(x, y)[0] as usize;
        let count = self.counts.get(label).copied().unwrap_or(0);
        if label == 0 || count == 0 {
            return Err(SamplingError::EmptyRegion { role });
        }
        Ok(self.sums[label] as f64 / count as f64)
    }
}

/// Measure one intensity per role.
///
/// `image` must be the same (possibly blurred) image the mask was built from.
pub fn measure_intensities(
    image: &RgbImage,
    mask: &ColorMask,
    layout: &SpotLayout,
    config: &SamplingConfig,
) -> Result<IntensityMap> {
    let gray = to_gray(image);
    let dims = gray.dimensions();
    let regions = match config.strategy {
        SamplingStrategy::RegionGrowing => Some(RegionStats::new(&gray, mask)),
        SamplingStrategy::FixedWindow { .. } => None,
    };

    let intensities = RoleMap::try_from_fn(|role| -> std::result::Result<f64, SamplingError> {
        let p = layout.point(role);
        if layout.is_extrapolated(role) {
            return match config.extrapolated {
                ExtrapolatedSampling::AssumeBlank => Ok(FULL_SCALE_INTENSITY),
                ExtrapolatedSampling::Window => {
                    let half = config.extrapolated_half_window;
                    window_median(&gray, role, p, half, half)
                }
            };
        }
        match (&regions, config.strategy) {
            (Some(stats), _) => {
                let (x, y) = pixel_of(role, p, dims)?;
                stats.mean_at(role, x, y)
            }
            (
                None,
                SamplingStrategy::FixedWindow {
                    half_width,
                    half_height,
                },
            ) => window_median(&gray, role, p, half_width, half_height),
            (None, SamplingStrategy::RegionGrowing) => Err(SamplingError::EmptyRegion { role }),
        }
    })?;

    for (role, value) in intensities.iter() {
        tracing::debug!("intensity {}: {:.2}", role, value);
    }
    Ok(intensities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SegmentConfig;
    use crate::spot::segment_markers;
    use crate::test_utils::{draw_disk, gray_of, white_card};
    use approx::assert_abs_diff_eq;

    fn layout_at(points: RoleMap<[f64; 2]>) -> SpotLayout {
        SpotLayout {
            points,
            extrapolated: SampleRole::C1,
        }
    }

    /// Nine spots on a 3x3 grid; every visible one drawn in `color_of(role)`.
    fn card(color_of: impl Fn(SampleRole) -> [u8; 3]) -> (RgbImage, SpotLayout) {
        let mut img = white_card(200, 200);
        let points = RoleMap::from_fn(|role| {
            let i = role.index();
            [40.0 + 60.0 * (i % 3) as f64, 40.0 + 60.0 * (i / 3) as f64]
        });
        for (role, &p) in points.iter() {
            if role != SampleRole::C1 {
                draw_disk(&mut img, p, 15.0, color_of(role));
            }
        }
        (img, layout_at(points))
    }

    fn shade(role: SampleRole) -> [u8; 3] {
        let g = 10 * role.index() as u8;
        [230, g, g]
    }

    fn measure_default(img: &RgbImage, layout: &SpotLayout) -> Result<IntensityMap> {
        let mask = segment_markers(img, &SegmentConfig::default());
        measure_intensities(img, &mask, layout, &SamplingConfig::default())
    }

    #[test]
    fn region_growing_averages_each_spot() {
        let (img, layout) = card(shade);
        let map = measure_default(&img, &layout).unwrap();

        for role in SampleRole::ALL {
            if role == SampleRole::C1 {
                assert_eq!(map[role], FULL_SCALE_INTENSITY);
            } else {
                assert_abs_diff_eq!(map[role], gray_of(shade(role)), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn fixed_window_takes_median() {
        let (img, layout) = card(shade);
        let mask = segment_markers(&img, &SegmentConfig::default());
        let cfg = SamplingConfig {
            strategy: SamplingStrategy::FixedWindow {
                half_width: 4,
                half_height: 4,
            },
            ..SamplingConfig::default()
        };
        let map = measure_intensities(&img, &mask, &layout, &cfg).unwrap();
        let tested = gray_of(shade(SampleRole::Tested));
        let qc2 = gray_of(shade(SampleRole::QC2));
        assert_abs_diff_eq!(map[SampleRole::Tested], tested, epsilon = 1e-9);
        assert_abs_diff_eq!(map[SampleRole::QC2], qc2, epsilon = 1e-9);
    }

    #[test]
    fn window_median_is_robust_to_a_hot_pixel() {
        let mut gray = GrayImage::from_pixel(9, 9, Luma([100]));
        gray.put_pixel(4, 4, Luma([255]));
        let m = window_median(&gray, SampleRole::C3, [4.0, 4.0], 1, 1).unwrap();
        assert_eq!(m, 100.0);
    }

    #[test]
    fn window_is_clipped_at_image_border() {
        let gray = GrayImage::from_pixel(5, 5, Luma([42]));
        let m = window_median(&gray, SampleRole::C2, [0.0, 0.0], 10, 10).unwrap();
        assert_eq!(m, 42.0);
    }

    #[test]
    fn extrapolated_role_can_be_measured_with_window() {
        let (mut img, layout) = card(shade);
        let c1 = layout.point(SampleRole::C1);
        draw_disk(&mut img, c1, 10.0, [180, 180, 180]);
        let mask = segment_markers(&img, &SegmentConfig::default());
        let cfg = SamplingConfig {
            extrapolated: ExtrapolatedSampling::Window,
            ..SamplingConfig::default()
        };
        let map = measure_intensities(&img, &mask, &layout, &cfg).unwrap();
        let blank = gray_of([180, 180, 180]);
        assert_abs_diff_eq!(map[SampleRole::C1], blank, epsilon = 1e-9);
    }

    #[test]
    fn point_outside_image_is_out_of_bounds() {
        let (img, mut layout) = card(shade);
        layout.points[SampleRole::C5] = [500.0, 20.0];
        let err = measure_default(&img, &layout).unwrap_err();
        assert!(matches!(
            err,
            crate::AssayError::Sampling(SamplingError::OutOfBounds {
                role: SampleRole::C5,
                ..
            })
        ));
    }

    #[test]
    fn seed_off_the_mask_is_empty_region() {
        let (img, mut layout) = card(shade);
        // Background between spots.
        layout.points[SampleRole::QC1] = [70.0, 70.0];
        let err = measure_default(&img, &layout).unwrap_err();
        assert_eq!(
            err,
            crate::AssayError::Sampling(SamplingError::EmptyRegion {
                role: SampleRole::QC1,
            })
        );
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        let mut v = vec![1u8, 9, 3, 7];
        assert_eq!(median_u8(&mut v), Some(5.0));
        assert_eq!(median_u8(&mut []), None);
    }
}
