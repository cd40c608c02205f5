use std::borrow::Cow;

use image::{ImageBuffer, Rgb, RgbImage};

/// Gaussian-blur an RGB image via `imageproc`, rounding back to 8 bits.
///
/// The filter runs in `f32` so uniform regions come back unchanged.
pub fn blur_rgb(img: &RgbImage, sigma: f32) -> RgbImage {
    let (w, h) = img.dimensions();
    let mut f = ImageBuffer::<Rgb<f32>, Vec<f32>>::new(w, h);
    for (dst, src) in f.pixels_mut().zip(img.pixels()) {
        *dst = Rgb(src.0.map(|c| c as f32));
    }
    let blurred = imageproc::filter::gaussian_blur_f32(&f, sigma);
    let mut out = RgbImage::new(w, h);
    for (dst, src) in out.pixels_mut().zip(blurred.pixels()) {
        *dst = Rgb(src.0.map(|c| c.clamp(0.0, 255.0).round() as u8));
    }
    out
}

/// Apply the configured smoothing, borrowing the input when there is none.
pub(super) fn smooth(img: &RgbImage, sigma: Option<f32>) -> Cow<'_, RgbImage> {
    match sigma {
        Some(s) if s > 0.0 && img.width() > 0 && img.height() > 0 => Cow::Owned(blur_rgb(img, s)),
        _ => Cow::Borrowed(img),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{draw_disk, white_card};

    #[test]
    fn uniform_regions_survive_blur() {
        let mut img = white_card(64, 64);
        draw_disk(&mut img, [32.0, 32.0], 20.0, [201, 37, 90]);
        let out = blur_rgb(&img, 1.5);
        assert_eq!(out.get_pixel(32, 32).0, [201, 37, 90]);
        assert_eq!(out.get_pixel(1, 1).0, [255, 255, 255]);
        // Edge pixels are mixed.
        let edge = out.get_pixel(52, 32).0;
        assert!(edge[1] > 37 && edge[1] < 255);
    }

    #[test]
    fn no_sigma_borrows_input() {
        let img = white_card(8, 8);
        assert!(matches!(smooth(&img, None), Cow::Borrowed(_)));
        assert!(matches!(smooth(&img, Some(0.0)), Cow::Borrowed(_)));
        assert!(matches!(smooth(&img, Some(1.0)), Cow::Owned(_)));
    }
}
