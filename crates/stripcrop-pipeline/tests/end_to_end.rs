//! Integration test: encoded bytes in, cropped and re-encoded bytes out,
//! on the 400x800 reference scene.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::io::Cursor;

use stripcrop_pipeline::{
    CropConfig, CropError, DetectionMethod, FailureReport, OutputFormat, Padding, Rect,
    StrategyKind, crop, encode, process,
};
use stripcrop_pipeline::types::FailureKind;

fn png_bytes(image: &image::DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn assert_close(actual: Rect, expected: Rect, tolerance: u32) {
    let pairs = [
        ("x", actual.x, expected.x),
        ("y", actual.y, expected.y),
        ("width", actual.width, expected.width),
        ("height", actual.height, expected.height),
    ];
    for (field, a, e) in pairs {
        assert!(
            a.abs_diff(e) <= tolerance,
            "{field}: got {actual}, expected about {expected}",
        );
    }
}

#[test]
fn reference_scene_density_crop() {
    let bytes = png_bytes(&common::reference_scene());
    let config = CropConfig {
        edge_threshold: 30,
        min_vertical_continuity: 0.1,
        padding: Padding::Ratio(0.02),
        ..CropConfig::default()
    };

    let result = process(&bytes, &config).expect("density strategy should succeed");
    eprintln!(
        "detected {:?}, padded {}",
        result.detection.rect, result.padded
    );

    assert_eq!(result.detection.method, DetectionMethod::DensityProfile);
    assert_close(result.detection.rect.unwrap(), Rect::new(150, 50, 101, 701), 2);
    assert_close(result.padded, Rect::new(148, 36, 105, 729), 3);
    assert_eq!(
        (result.image.width(), result.image.height()),
        (result.padded.width, result.padded.height),
    );

    let report = result.report();
    assert!(report.success);
    assert_eq!(report.original_size.width, 400);
    assert_eq!(report.cropped_size.height, result.padded.height);

    let encoded = encode::encode(&result.image, OutputFormat::Png).unwrap();
    let decoded = image::load_from_memory(&encoded).unwrap();
    assert_eq!(decoded.width(), result.padded.width);
    assert_eq!(decoded.height(), result.padded.height);

    // The crop is dominated by the strip: its center pixel is strip-dark.
    let center = decoded
        .to_luma8()
        .get_pixel(decoded.width() / 2, decoded.height() / 2)
        .0[0];
    assert!(center < 60, "center of crop should be the strip, got {center}");
}

#[test]
fn reference_scene_contour_crop() {
    let bytes = png_bytes(&common::reference_scene());
    let config = CropConfig {
        strategy: StrategyKind::ContourPolygon,
        padding: Padding::Pixels(5),
        ..CropConfig::default()
    };

    let result = process(&bytes, &config).expect("contour strategy should succeed");
    assert_eq!(result.detection.method, DetectionMethod::ContourStrict);
    let detected = result.detection.rect.unwrap();
    assert!(crop::iou(detected, common::reference_strip()) > 0.85);
    assert_eq!(result.padded.width, detected.width + 10);
}

#[test]
fn uniform_image_with_contour_strategy_finds_nothing() {
    let bytes = png_bytes(&common::uniform(200, 300, 180));
    let config = CropConfig {
        strategy: StrategyKind::ContourPolygon,
        ..CropConfig::default()
    };

    let err = process(&bytes, &config).unwrap_err();
    assert!(matches!(err, CropError::NoRegionFound(_)), "got {err}");

    let report = FailureReport::from(&err);
    assert!(!report.success);
    assert_eq!(report.reason, FailureKind::NoRegionFound);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["success"], serde_json::json!(false));
    assert_eq!(json["reason"], serde_json::json!("NoRegionFound"));
}

#[test]
fn uniform_image_with_density_strategy_uses_fallback() {
    let bytes = png_bytes(&common::uniform(200, 300, 180));
    let result = process(&bytes, &CropConfig::default()).unwrap();
    assert_eq!(result.detection.method, DetectionMethod::DensityFallback);
    assert!(result.report().success);
}

#[test]
fn garbage_bytes_are_a_decode_failure() {
    let err = process(b"definitely not an image", &CropConfig::default()).unwrap_err();
    assert_eq!(FailureReport::from(&err).reason, FailureKind::DecodeFailed);
}

#[test]
fn tiny_image_is_too_small() {
    let bytes = png_bytes(&common::uniform(2, 2, 0));
    let err = process(&bytes, &CropConfig::default()).unwrap_err();
    assert_eq!(
        err,
        CropError::ImageTooSmall {
            width: 2,
            height: 2
        }
    );
}
