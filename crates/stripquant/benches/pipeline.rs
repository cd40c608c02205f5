use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stripquant::{spot, Analyzer, ClusterConfig, SegmentConfig};

/// 3x3 card without the top-left spot, light sensor noise on top.
fn synthetic_card(pitch: f64, radius: f64) -> RgbImage {
    let size = (pitch * 4.0) as u32;
    let mut img = RgbImage::from_pixel(size, size, Rgb([250, 250, 248]));
    let shades = [150u8, 120, 100, 70, 30, 90, 50, 10];
    let mut k = 0;
    for col in 0..3 {
        for row in 0..3 {
            if (col, row) == (0, 0) {
                continue;
            }
            let cx = pitch * (col as f64 + 1.0);
            let cy = pitch * (row as f64 + 1.0);
            let g = shades[k];
            k += 1;
            for y in 0..size {
                for x in 0..size {
                    let dx = x as f64 - cx;
                    let dy = y as f64 - cy;
                    if dx * dx + dy * dy <= radius * radius {
                        img.put_pixel(x, y, Rgb([245, g, g]));
                    }
                }
            }
        }
    }
    let mut rng = StdRng::seed_from_u64(3);
    for px in img.pixels_mut() {
        for c in px.0.iter_mut() {
            *c = (*c as i16 + rng.gen_range(-3..=3)).clamp(0, 255) as u8;
        }
    }
    img
}

fn bench_locate(c: &mut Criterion) {
    let img = synthetic_card(80.0, 24.0);
    let mask = spot::segment_markers(&img, &SegmentConfig::default());
    let points = mask.points();
    let cfg = ClusterConfig::default();

    c.bench_function("locate_spots_8x24px", |b| {
        b.iter(|| {
            let clusters = spot::locate_spots(black_box(&points), &cfg);
            black_box(clusters.is_ok())
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let img = synthetic_card(80.0, 24.0);
    let analyzer = Analyzer::new();

    c.bench_function("analyze_320px_card", |b| {
        b.iter(|| {
            let result = analyzer.analyze(black_box(&img));
            black_box(result.is_ok())
        })
    });
}

criterion_group!(benches, bench_locate, bench_pipeline);
criterion_main!(benches);
