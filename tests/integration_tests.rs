mod common;

use assert_cmd::Command;
use assert_fs::prelude::*;
use common::*;
use image::ImageFormat;
use img_smartpress::{CompressOutcome, CompressionOptions, Engine, ErrorKind, ImageKind};
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn smartpress() -> Command {
    Command::cargo_bin("img-smartpress").unwrap()
}

fn batch_outcome(root: &Path, options: &CompressionOptions) -> img_smartpress::BatchResult {
    match Engine::default().compress(root, options).unwrap() {
        CompressOutcome::Batch(batch) => batch,
        other => panic!("expected a batch outcome, got {:?}", other),
    }
}

#[test]
fn test_cli_help() {
    smartpress()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compress"))
        .stdout(predicate::str::contains("analyze"));
}

#[test]
fn test_cli_compress_help() {
    smartpress()
        .args(["compress", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--quality"));
}

#[test]
fn test_cli_analyze_help() {
    smartpress()
        .args(["analyze", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_cli_missing_args() {
    smartpress().arg("compress").assert().failure();
}

#[test]
fn test_cli_nonexistent_input() {
    smartpress()
        .args(["compress", "/nonexistent/photo.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_cli_rejects_out_of_range_quality() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = write_image(temp.path(), "in.png", &gradient_rgb(16, 16), ImageFormat::Png);

    smartpress()
        .arg("compress")
        .arg(&input)
        .args(["-q", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("quality"));
}

#[test]
fn test_cli_rejects_unknown_format() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = write_image(temp.path(), "in.png", &gradient_rgb(16, 16), ImageFormat::Png);

    smartpress()
        .arg("compress")
        .arg(&input)
        .args(["-f", "heic"])
        .assert()
        .failure();
}

#[test]
fn test_cli_compress_single_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    write_image(temp.path(), "in.png", &gradient_rgb(48, 32), ImageFormat::Png);

    smartpress()
        .arg("compress")
        .arg(temp.child("in.png").path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Compressing"));

    temp.child("in_compress.png").assert(predicate::path::exists());
}

#[test]
fn test_cli_compress_json_output() {
    let temp = create_temp_directory();
    let input = write_image(temp.path(), "photo.png", &gradient_rgb(48, 32), ImageFormat::Png);

    let output = smartpress()
        .arg("compress")
        .arg(&input)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["mode"], "single");
    assert_eq!(json["success"], true);
    assert!(json["compressed_size"].as_u64().unwrap() <= json["original_size"].as_u64().unwrap());
}

#[test]
fn test_cli_analyze_json() {
    let temp = create_temp_directory();
    let input = write_image(temp.path(), "photo.jpg", &noisy_rgb(64, 48, 7), ImageFormat::Jpeg);

    let output = smartpress()
        .arg("analyze")
        .arg(&input)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["width"], 64);
    assert_eq!(json["height"], 48);
    assert_eq!(json["has_alpha"], false);
    let difficulty = json["features"]["difficulty_score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&difficulty));
    assert_eq!(json["recommended_plans"].as_array().unwrap().len(), 1);
}

#[test]
fn test_cli_batch_without_any_success_fails() {
    let temp = create_temp_directory();
    fs::write(temp.path().join("empty.png"), b"").unwrap();
    fs::write(temp.path().join("garbage.jpg"), b"definitely not a jpeg").unwrap();

    smartpress().arg("compress").arg(temp.path()).assert().failure();
}

#[test]
fn test_cli_non_recursive_batch() {
    let temp = create_temp_directory();
    write_image(temp.path(), "top.png", &gradient_rgb(16, 16), ImageFormat::Png);
    write_image(&temp.path().join("nested"), "deep.png", &gradient_rgb(16, 16), ImageFormat::Png);

    smartpress()
        .arg("compress")
        .arg(temp.path())
        .arg("--no-recursive")
        .assert()
        .success();

    assert!(temp.path().join("top_compress.png").exists());
    assert!(!temp.path().join("nested").join("deep_compress.png").exists());
}

#[test]
fn test_batch_partial_failure_keeps_going() {
    let temp = create_temp_directory();
    let files = create_photo_tree(temp.path());
    assert_eq!(files.len(), 16);

    let output_dir = temp.path().join("out");
    let options = CompressionOptions::default().with_output(Some(output_dir.clone()));
    let batch = batch_outcome(temp.path(), &options);

    assert_eq!(batch.results.len(), 16);
    assert_eq!(batch.success_count(), 15);
    assert_eq!(batch.failure_count(), 1);
    assert!((batch.success_rate() - 93.75).abs() < 1e-9);
    assert!(batch.success);

    let failed = batch.results.iter().find(|r| !r.success).unwrap();
    assert!(failed.input_path.ends_with("broken.png"));
    assert_eq!(failed.error.as_ref().unwrap().kind, ErrorKind::CodecFailure);
}

#[test]
fn test_batch_mirrors_directory_structure() {
    let temp = create_temp_directory();
    let input_root = temp.path().join("photos");
    create_photo_tree(&input_root);
    let output_dir = temp.path().join("compressed");

    let options = CompressionOptions::default().with_output(Some(output_dir.clone()));
    let batch = batch_outcome(&input_root, &options);

    for result in batch.results.iter().filter(|r| r.success) {
        let output = result.output_path.as_ref().unwrap();
        assert!(output.exists());
        let input_rel = result.input_path.parent().unwrap().strip_prefix(&input_root).unwrap();
        let output_rel = output.parent().unwrap().strip_prefix(&output_dir).unwrap();
        assert_eq!(input_rel, output_rel);
    }
    assert!(output_dir.join("2023").join("trip").is_dir());
}

#[test]
fn test_batch_never_grows_a_file() {
    let temp = create_temp_directory();
    let input_root = temp.path().join("photos");
    create_photo_tree(&input_root);

    for (i, quality) in [None, Some(95), Some(40)].into_iter().enumerate() {
        let options = CompressionOptions::new(None, quality, None, None)
            .unwrap()
            .with_output(Some(temp.path().join(format!("out{}", i))));
        let batch = batch_outcome(&input_root, &options);

        for result in batch.results.iter().filter(|r| r.success) {
            assert!(
                result.compressed_size <= result.original_size,
                "{} grew at {:?}",
                result.input_path.display(),
                quality
            );
        }
    }
}

#[test]
fn test_smooth_jpeg_without_overrides() {
    let temp = create_temp_directory();
    let input = write_image(temp.path(), "photo.jpg", &gradient_rgb(320, 240), ImageFormat::Jpeg);

    let outcome = Engine::default()
        .compress(&input, &CompressionOptions::default())
        .unwrap();
    let CompressOutcome::Single(result) = outcome else {
        panic!("expected a single result");
    };

    assert!(result.success);
    assert!(result.compressed_size <= result.original_size);
    assert_eq!(result.format_used, Some(ImageKind::Jpeg));
    let output = result.output_path.unwrap();
    assert_eq!(output.file_name().unwrap(), "photo_compress.jpg");
    assert!(output.exists());
}

#[test]
fn test_transparent_png_stays_png() {
    let temp = create_temp_directory();
    let input = write_image(temp.path(), "logo.png", &transparent_rgba(64, 64), ImageFormat::Png);

    let options = CompressionOptions::new(None, Some(70), None, None).unwrap();
    let outcome = Engine::default().compress(&input, &options).unwrap();
    let CompressOutcome::Single(result) = outcome else {
        panic!("expected a single result");
    };

    assert!(result.success);
    assert_eq!(result.format_used, Some(ImageKind::Png));
    assert_eq!(result.quality_used, None);
    assert_eq!(result.output_path.unwrap().extension().unwrap(), "png");
}

#[test]
fn test_three_formats_for_one_input() {
    let temp = create_temp_directory();
    let input = write_image(temp.path(), "shot.png", &noisy_rgb(64, 64, 3), ImageFormat::Png);
    let out_dir = temp.path().join("variants");

    let options = CompressionOptions::new(
        Some(vec!["jpeg".into(), "png".into(), "webp".into()]),
        Some(85),
        None,
        None,
    )
    .unwrap()
    .with_output(Some(out_dir.clone()));
    let outcome = Engine::default().compress(&input, &options).unwrap();

    let results = outcome.results();
    assert_eq!(results.len(), 3);
    for result in &results {
        assert!(result.success);
        assert!(result.compressed_size <= result.original_size);
        assert!(result.output_path.as_ref().unwrap().starts_with(&out_dir));
    }
}

#[test]
fn test_resize_within_box() {
    let temp = create_temp_directory();
    let input = write_image(temp.path(), "wide.png", &noisy_rgb(400, 200, 11), ImageFormat::Png);

    let options = CompressionOptions::new(None, None, Some(100), Some(100)).unwrap();
    let outcome = Engine::default().compress(&input, &options).unwrap();
    let CompressOutcome::Single(result) = outcome else {
        panic!("expected a single result");
    };

    assert!(result.success);
    assert!(!result.kept_original);
    assert!(result.was_resized);
    assert_eq!(result.final_dimensions, Some((100, 50)));
    assert_eq!(result.original_dimensions, Some((400, 200)));
}

#[test]
fn test_cli_named_output_holds_its_own_format() {
    let temp = assert_fs::TempDir::new().unwrap();
    let flat = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(64, 64, image::Rgb([90, 90, 90])));
    write_image(temp.path(), "flat.png", &flat, ImageFormat::Png);

    let output = smartpress()
        .arg("compress")
        .arg(temp.child("flat.png").path())
        .args(["-q", "90", "-o"])
        .arg(temp.child("out.jpg").path())
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let written = Path::new(json["output_path"].as_str().unwrap());
    let bytes = fs::read(written).unwrap();
    assert_eq!(ImageKind::detect(&bytes), ImageKind::from_path(written));

    if json["kept_original"] == true {
        assert_eq!(json["format_used"], "png");
        temp.child("out.png").assert(predicate::path::exists());
        temp.child("out.jpg").assert(predicate::path::missing());
    } else {
        assert_eq!(json["format_used"], "jpeg");
    }
}

#[test]
fn test_output_names_are_idempotent() {
    let temp = create_temp_directory();
    let input = write_image(temp.path(), "pic.png", &gradient_rgb(40, 40), ImageFormat::Png);
    let engine = Engine::default();
    let options = CompressionOptions::default();

    let first = engine.compress(&input, &options).unwrap();
    let entries_after_first = fs::read_dir(temp.path()).unwrap().count();
    let second = engine.compress(&input, &options).unwrap();
    let entries_after_second = fs::read_dir(temp.path()).unwrap().count();

    assert_eq!(
        first.results()[0].output_path,
        second.results()[0].output_path
    );
    assert_eq!(entries_after_first, entries_after_second);
}
