//! Shared test utilities: synthetic card images.

use image::{Rgb, RgbImage};

use crate::roles::{RoleMap, SampleRole};

/// White background of the given size.
pub(crate) fn white_card(w: u32, h: u32) -> RgbImage {
    RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
}

/// Fill every pixel within `radius` of `center` with `color`.
pub(crate) fn draw_disk(img: &mut RgbImage, center: [f64; 2], radius: f64, color: [u8; 3]) {
    let (w, h) = img.dimensions();
    let r2 = radius * radius;
    for y in 0..h {
        for x in 0..w {
            let dx = x as f64 - center[0];
            let dy = y as f64 - center[1];
            if dx * dx + dy * dy <= r2 {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }
}

/// Grid cell `(col, row)` of each role on the card.
pub(crate) fn grid_cell(role: SampleRole) -> (usize, usize) {
    match role {
        SampleRole::C1 => (0, 0),
        SampleRole::C2 => (0, 1),
        SampleRole::C3 => (0, 2),
        SampleRole::QC1 => (1, 0),
        SampleRole::Tested => (1, 1),
        SampleRole::QC2 => (1, 2),
        SampleRole::C4 => (2, 0),
        SampleRole::C5 => (2, 1),
        SampleRole::C6 => (2, 2),
    }
}

/// Pixel center of each role for a card at `origin` with cell `pitch`.
pub(crate) fn grid_points(origin: [f64; 2], pitch: f64) -> RoleMap<[f64; 2]> {
    RoleMap::from_fn(|role| {
        let (col, row) = grid_cell(role);
        [
            origin[0] + col as f64 * pitch,
            origin[1] + row as f64 * pitch,
        ]
    })
}

/// Draw a full card; roles mapped to `None` are left blank.
pub(crate) fn draw_card(
    size: (u32, u32),
    origin: [f64; 2],
    pitch: f64,
    radius: f64,
    colors: &RoleMap<Option<[u8; 3]>>,
) -> RgbImage {
    let mut img = white_card(size.0, size.1);
    let points = grid_points(origin, pitch);
    for (role, color) in colors.iter() {
        if let Some(color) = color {
            draw_disk(&mut img, points[role], radius, *color);
        }
    }
    img
}

/// Gray level the pipeline assigns to a uniform patch of `rgb`.
pub(crate) fn gray_of(rgb: [u8; 3]) -> f64 {
    let px = RgbImage::from_pixel(1, 1, Rgb(rgb));
    crate::intensity::to_gray(&px).get_pixel(0, 0)[0] as f64
}
