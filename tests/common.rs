#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Smooth content: scores as easy to compress.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            96,
        ])
    }))
}

/// Pseudo-random pixels: scores as hard to compress.
pub fn noisy_rgb(width: u32, height: u32, seed: u32) -> DynamicImage {
    let mut state = seed | 1;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [a, b, c, _] = state.to_le_bytes();
        Rgb([a, b, c])
    }))
}

pub fn transparent_rgba(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if (x / 4 + y / 4) % 2 == 0 { 0 } else { 255 };
        Rgba([(x * 7) as u8, (y * 11) as u8, 200, alpha])
    }))
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn write_image(dir: &Path, name: &str, image: &DynamicImage, format: ImageFormat) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    File::create(&path)
        .unwrap()
        .write_all(&encode(image, format))
        .unwrap();
    path
}

/// 16 image files over three directory levels, one of them a zero-byte PNG,
/// plus a couple of non-images that discovery must ignore.
pub fn create_photo_tree(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let dirs = [root.to_path_buf(), root.join("2023"), root.join("2023").join("trip")];

    for (i, dir) in dirs.iter().cycle().take(15).enumerate() {
        let seed = i as u32 + 1;
        let path = match i % 3 {
            0 => write_image(dir, &format!("img{:02}.png", i), &gradient_rgb(32, 24), ImageFormat::Png),
            1 => write_image(dir, &format!("img{:02}.jpg", i), &noisy_rgb(32, 24, seed), ImageFormat::Jpeg),
            _ => write_image(dir, &format!("img{:02}.bmp", i), &gradient_rgb(24, 24), ImageFormat::Bmp),
        };
        files.push(path);
    }

    let corrupt = root.join("2023").join("broken.png");
    File::create(&corrupt).unwrap();
    files.push(corrupt);

    fs::write(root.join("README.md"), "holiday photos").unwrap();
    fs::write(root.join("2023").join("list.txt"), "img01.jpg").unwrap();

    files
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}
