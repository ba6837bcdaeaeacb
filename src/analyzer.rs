//! Image complexity scoring.
//!
//! The scores predict how well an image survives lossless compression: flat
//! graphics score near 0, noisy photographs near 1.

use crate::config::AnalyzerConfig;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageFeatures {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub original_bytes: u64,
    /// Fraction of sampled pixels on an edge, in [0, 1]
    pub edge_density: f64,
    /// Mean block luma variance over the reference variance; may exceed 1
    pub texture_variance: f64,
    /// Weighted blend of the two scores, in [0, 1]
    pub difficulty_score: f64,
}

/// Scores a decoded image. Pure and deterministic; the work is bounded by
/// `analysis_max_side` regardless of the input resolution.
pub fn analyze(image: &DynamicImage, original_bytes: u64, config: &AnalyzerConfig) -> ImageFeatures {
    let (width, height) = image.dimensions();
    let sample = downsample(image, config.analysis_max_side);

    let edge_density = edge_density(&sample, config.edge_threshold);
    let texture_variance = texture_variance(&sample, config.block_size, config.variance_reference);
    let difficulty_score = difficulty_score(edge_density, texture_variance, config);

    ImageFeatures {
        width,
        height,
        has_alpha: image.color().has_alpha(),
        original_bytes,
        edge_density,
        texture_variance,
        difficulty_score,
    }
}

fn downsample(image: &DynamicImage, max_side: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width.max(height) <= max_side {
        image.to_rgb8()
    } else {
        image.resize(max_side, max_side, FilterType::Triangle).to_rgb8()
    }
}

/// Fraction of pixels whose summed right+bottom channel gradient exceeds `threshold`.
pub fn edge_density(pixels: &RgbImage, threshold: u32) -> f64 {
    let (width, height) = pixels.dimensions();
    if width < 2 || height < 2 {
        return 0.0;
    }

    let mut edges: u64 = 0;
    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let here = pixels.get_pixel(x, y).0;
            let right = pixels.get_pixel(x + 1, y).0;
            let below = pixels.get_pixel(x, y + 1).0;

            let gradient: u32 = (0..3)
                .map(|c| here[c].abs_diff(right[c]) as u32 + here[c].abs_diff(below[c]) as u32)
                .sum();
            if gradient > threshold {
                edges += 1;
            }
        }
    }

    let sampled = (width - 1) as u64 * (height - 1) as u64;
    edges as f64 / sampled as f64
}

/// Mean per-block luma variance divided by `reference`. Edge blocks may be partial.
pub fn texture_variance(pixels: &RgbImage, block_size: u32, reference: f64) -> f64 {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 || block_size == 0 {
        return 0.0;
    }

    let step = block_size as usize;
    let mut total_variance = 0.0;
    let mut blocks: u64 = 0;

    for block_y in (0..height).step_by(step) {
        for block_x in (0..width).step_by(step) {
            let x_end = (block_x + block_size).min(width);
            let y_end = (block_y + block_size).min(height);

            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            let mut count = 0.0;
            for y in block_y..y_end {
                for x in block_x..x_end {
                    let l = luma(pixels.get_pixel(x, y));
                    sum += l;
                    sum_sq += l * l;
                    count += 1.0;
                }
            }

            let mean = sum / count;
            total_variance += (sum_sq / count - mean * mean).max(0.0);
            blocks += 1;
        }
    }

    (total_variance / blocks as f64) / reference
}

/// BT.601 luma rounded to an integer, so flat regions sum exactly.
fn luma(pixel: &Rgb<u8>) -> f64 {
    let [r, g, b] = pixel.0;
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as f64
}

/// Monotonic in both inputs; texture is capped at 1 before weighting.
pub fn difficulty_score(edge_density: f64, texture_variance: f64, config: &AnalyzerConfig) -> f64 {
    let weight_sum = config.edge_weight + config.texture_weight;
    if weight_sum <= 0.0 {
        return 0.0;
    }
    let blended = config.edge_weight * edge_density.clamp(0.0, 1.0)
        + config.texture_weight * texture_variance.clamp(0.0, 1.0);
    (blended / weight_sum).clamp(0.0, 1.0)
}
