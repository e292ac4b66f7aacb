//! Synthetic scenes shared by the integration tests.

#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use stripcrop_pipeline::Rect;

/// Background level of every synthetic scene.
pub const BACKGROUND: u8 = 128;

/// Level of the strip or block painted onto the background.
pub const FOREGROUND: u8 = 30;

/// Uniform background with one solid rectangle.
pub fn scene(width: u32, height: u32, block: Rect) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let inside = x >= block.x
            && y >= block.y
            && u64::from(x) < block.right()
            && u64::from(y) < block.bottom();
        let v = if inside { FOREGROUND } else { BACKGROUND };
        Rgb([v, v, v])
    }))
}

/// The 400x800 reference scene: strip over columns 150..=250 and rows
/// 50..=750.
pub fn reference_scene() -> DynamicImage {
    scene(400, 800, reference_strip())
}

/// Strip painted by [`reference_scene`].
pub const fn reference_strip() -> Rect {
    Rect::new(150, 50, 101, 701)
}

/// Single-color image.
pub fn uniform(width: u32, height: u32, level: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([level, level, level])))
}

/// Deterministic pseudo-random noise (64-bit LCG), reproducible across
/// runs and platforms.
pub fn noise(width: u32, height: u32, seed: u64) -> DynamicImage {
    let mut state = seed;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let [r, g, b, ..] = (state >> 32).to_le_bytes();
        Rgb([r, g, b])
    }))
}

/// Mixed set of scenes for property checks: blank, noisy, strips in
/// various positions, and strips touching the image border.
pub fn assorted_scenes() -> Vec<(&'static str, DynamicImage)> {
    vec![
        ("reference", reference_scene()),
        ("blank", uniform(120, 200, 200)),
        ("noise", noise(97, 151, 7)),
        ("noise_small", noise(3, 3, 11)),
        ("sideways", scene(300, 150, Rect::new(20, 60, 240, 30))),
        ("left_edge", scene(120, 240, Rect::new(0, 10, 20, 200))),
        ("bottom_right", scene(100, 100, Rect::new(80, 40, 20, 60))),
        ("full_frame", scene(60, 90, Rect::new(0, 0, 60, 90))),
        ("thin_line", scene(200, 200, Rect::new(100, 0, 1, 200))),
    ]
}
