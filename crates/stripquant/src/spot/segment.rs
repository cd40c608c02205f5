//! Marker-color segmentation: HSV thresholding followed by disk erosion.

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use palette::{FromColor, Hsv, Srgb};

use crate::config::SegmentConfig;

const ON: u8 = 255;

/// Binary mask of marker-colored pixels, same size as the source image.
#[derive(Debug, Clone)]
pub struct ColorMask {
    image: GrayImage,
}

impl ColorMask {
    /// Wrap a gray image; any non-zero pixel counts as set.
    pub fn from_gray(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[inline]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] != 0
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.image.as_raw().iter().filter(|&&v| v != 0).count()
    }

    /// Coordinates `[x, y]` of every set pixel, row-major.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.image
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] != 0)
            .map(|(x, y, _)| [x as f64, y as f64])
            .collect()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }
}

/// HSV test of a single pixel against the configured marker color.
#[inline]
pub fn is_marker_color(rgb: [u8; 3], config: &SegmentConfig) -> bool {
    let color = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format::<f32>();
    let hsv: Hsv = Hsv::from_color(color);
    if hsv.saturation < config.min_saturation || hsv.value < config.min_value {
        return false;
    }
    let hue = hsv.hue.into_positive_degrees();
    config.hue_bands.iter().any(|band| band.contains(hue))
}

/// Threshold `image` to the marker color and erode the result.
pub fn segment_markers(image: &RgbImage, config: &SegmentConfig) -> ColorMask {
    let (w, h) = image.dimensions();
    let mut mask = GrayImage::new(w, h);
    for (x, y, px) in image.enumerate_pixels() {
        if is_marker_color(px.0, config) {
            mask.put_pixel(x, y, Luma([ON]));
        }
    }
    let raw_count = mask.as_raw().iter().filter(|&&v| v != 0).count();

    if config.erode_radius > 0 {
        mask = imageproc::morphology::erode(&mask, Norm::L2, config.erode_radius);
    }

    let mask = ColorMask::from_gray(mask);
    tracing::debug!(
        "segmentation: {} pixels after threshold, {} after erosion (r={})",
        raw_count,
        mask.count(),
        config.erode_radius
    );
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{draw_disk, white_card};

    #[test]
    fn red_passes_and_neutral_fails() {
        let cfg = SegmentConfig::default();
        assert!(is_marker_color([220, 30, 30], &cfg));
        assert!(is_marker_color([200, 20, 60], &cfg)); // hue near 348°
        assert!(!is_marker_color([255, 255, 255], &cfg));
        assert!(!is_marker_color([128, 128, 128], &cfg));
        assert!(!is_marker_color([30, 200, 30], &cfg));
        assert!(!is_marker_color([30, 30, 200], &cfg));
        // Dark red is rejected by the value threshold.
        assert!(!is_marker_color([60, 5, 5], &cfg));
    }

    #[test]
    fn both_hue_bands_are_unioned() {
        let mut cfg = SegmentConfig::default();
        let magenta_red = [230, 20, 80];
        assert!(is_marker_color(magenta_red, &cfg));
        cfg.hue_bands[1] = cfg.hue_bands[0];
        assert!(!is_marker_color(magenta_red, &cfg));
    }

    #[test]
    fn erosion_removes_speckle_but_keeps_disk_core() {
        let mut img = white_card(120, 80);
        draw_disk(&mut img, [40.0, 40.0], 12.0, [220, 30, 30]);
        // Isolated speckle, smaller than the erosion element.
        for (x, y) in [(100, 10), (101, 10), (100, 11)] {
            img.put_pixel(x, y, image::Rgb([220, 30, 30]));
        }

        let cfg = SegmentConfig {
            erode_radius: 3,
            ..SegmentConfig::default()
        };
        let mask = segment_markers(&img, &cfg);
        assert!(mask.is_set(40, 40));
        assert!(!mask.is_set(100, 10));
        assert!(!mask.is_set(40, 40 + 11));
        assert!(mask.count() > 0);
        assert!(mask.points().iter().all(|p| (p[0] - 40.0).abs() <= 12.0));
    }

    #[test]
    fn blank_image_gives_empty_mask() {
        let img = white_card(32, 32);
        let mask = segment_markers(&img, &SegmentConfig::default());
        assert_eq!(mask.count(), 0);
        assert!(mask.points().is_empty());
    }
}
