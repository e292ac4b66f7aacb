//! Integration tests: run the `stripcrop` binary against files on disk.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::process::{Command, Output};

use image::{DynamicImage, Rgb, RgbImage};

fn stripcrop(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stripcrop"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run stripcrop")
}

/// Gray 400x800 background with a dark strip over columns 150..=250 and
/// rows 50..=750.
fn write_reference_scene(path: &Path) {
    let image = RgbImage::from_fn(400, 800, |x, y| {
        if (150..=250).contains(&x) && (50..=750).contains(&y) {
            Rgb([30, 30, 30])
        } else {
            Rgb([128, 128, 128])
        }
    });
    DynamicImage::ImageRgb8(image).save(path).unwrap();
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn crops_to_explicit_output_and_reports_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("strip.png");
    let output_path = dir.path().join("out/cropped.png");
    write_reference_scene(&input);

    let output = stripcrop(&[
        "--json",
        "--padding-ratio",
        "0.02",
        "--output",
        output_path.to_str().unwrap(),
        input.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = stdout_json(&output);
    assert_eq!(report["success"], serde_json::json!(true));
    assert_eq!(report["method"], serde_json::json!("density_profile"));
    assert_eq!(report["original_size"]["width"], serde_json::json!(400));
    assert_eq!(
        report["saved_to"],
        serde_json::json!(output_path.display().to_string())
    );
    assert_eq!(report["mime_type"], serde_json::json!("image/png"));

    let cropped = image::open(&output_path).unwrap();
    assert_eq!(
        serde_json::json!(cropped.width()),
        report["cropped_size"]["width"]
    );
    assert_eq!(
        serde_json::json!(cropped.height()),
        report["cropped_size"]["height"]
    );
}

#[test]
fn output_dir_uses_sanitized_name() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("strip.png");
    let out_dir = dir.path().join("results");
    write_reference_scene(&input);

    let output = stripcrop(&[
        "--output-dir",
        out_dir.to_str().unwrap(),
        "--name",
        "pool/reading 1",
        "--format",
        "bmp",
        input.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(out_dir.join("poolreading1.bmp").is_file());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(image/bmp)"), "stdout: {stdout}");
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("strip.png");
    write_reference_scene(&input);

    let output = stripcrop(&["--dry-run", input.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("density_profile"), "stdout: {stdout}");
    assert!(!stdout.contains("saved to"), "stdout: {stdout}");

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "only the input should remain");
}

#[test]
fn unsupported_extension_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("strip.gif");
    std::fs::write(&input, b"GIF89a").unwrap();

    let output = stripcrop(&[input.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn blank_image_with_contour_strategy_reports_no_region() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("blank.png");
    DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 300, Rgb([180, 180, 180])))
        .save(&input)
        .unwrap();

    let output = stripcrop(&[
        "--strategy",
        "contour",
        "--json",
        input.to_str().unwrap(),
    ]);
    assert!(!output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["success"], serde_json::json!(false));
    assert_eq!(report["reason"], serde_json::json!("NoRegionFound"));
}

#[test]
fn undecodable_file_reports_decode_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.jpg");
    std::fs::write(&input, b"not a jpeg at all").unwrap();

    let output = stripcrop(&["--json", input.to_str().unwrap()]);
    assert!(!output.status.success());
    assert_eq!(stdout_json(&output)["reason"], serde_json::json!("DecodeFailed"));
}
