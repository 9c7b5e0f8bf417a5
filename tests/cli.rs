//! End-to-end runs of the `slotfit` binary.

use std::process::Command;

use image::{Rgba, RgbaImage};
use tempfile::tempdir;

fn slotfit() -> Command {
    Command::new(env!("CARGO_BIN_EXE_slotfit"))
}

#[test]
fn fit_writes_image_of_slot_size() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    RgbaImage::from_pixel(1920, 1080, Rgba([10, 200, 30, 255]))
        .save(&input)
        .unwrap();

    let status = slotfit()
        .args(["fit"])
        .arg(&input)
        .arg(&output)
        .args(["-W", "320", "-H", "240"])
        .status()
        .unwrap();
    assert!(status.success());

    let fitted = image::open(&output).unwrap();
    assert_eq!((fitted.width(), fitted.height()), (320, 240));
}

#[test]
fn fit_with_unsized_slot_uses_fallback_override() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]))
        .save(&input)
        .unwrap();

    let status = slotfit()
        .arg("fit")
        .arg(&input)
        .arg(&output)
        .args(["-W", "0", "-H", "-5", "--fallback", "64x48"])
        .status()
        .unwrap();
    assert!(status.success());

    let fitted = image::open(&output).unwrap();
    assert_eq!((fitted.width(), fitted.height()), (64, 48));
}

#[test]
fn fit_reads_fallback_from_config() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.png");
    let config = dir.path().join("slotfit.json");
    RgbaImage::from_pixel(50, 80, Rgba([1, 2, 3, 255]))
        .save(&input)
        .unwrap();
    std::fs::write(&config, r#"{ "fallback_width": 30, "fallback_height": 20 }"#).unwrap();

    let status = slotfit()
        .arg("--config")
        .arg(&config)
        .arg("fit")
        .arg(&input)
        .arg(&output)
        .args(["-W", "0", "-H", "0"])
        .status()
        .unwrap();
    assert!(status.success());

    let fitted = image::open(&output).unwrap();
    assert_eq!((fitted.width(), fitted.height()), (30, 20));
}

#[test]
fn missing_input_fails() {
    let dir = tempdir().unwrap();
    let output = slotfit()
        .arg("fit")
        .arg(dir.path().join("nope.png"))
        .arg(dir.path().join("out.png"))
        .args(["-W", "10", "-H", "10"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn grid_lists_one_line_per_slot() {
    let output = slotfit()
        .args(["grid", "-p", "5", "-d", "1280x720"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 5);
    assert!(stdout.starts_with("slot  0 (row 0, col 0)"));
}
