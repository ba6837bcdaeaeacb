use crate::analyzer::ImageFeatures;
use crate::constants::INFO_PREFIX;
use crate::decision::EncodingPlan;
use crate::formats::ImageKind;
use crate::utils::format_file_size;
use image::{ColorType, DynamicImage, GenericImageView};
use serde::Serialize;
use std::path::PathBuf;

/// What `Engine::analyze` learned about one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub path: PathBuf,
    pub file_size: u64,
    pub source_format: ImageKind,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub color_type: String,
    /// Size of the decoded pixel buffer every plan works from
    pub decoded_memory_mib: f64,
    pub features: ImageFeatures,
    /// The plans an override-free compress would execute
    pub recommended_plans: Vec<EncodingPlan>,
}

impl AnalysisReport {
    pub fn megapixels(&self) -> f64 {
        self.width as f64 * self.height as f64 / 1_000_000.0
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

/// Decoded buffer size in MiB.
pub fn estimate_memory_usage(img: &DynamicImage) -> f64 {
    let (width, height) = img.dimensions();
    let bytes_per_pixel = match img.color() {
        ColorType::L8 => 1,
        ColorType::La8 | ColorType::L16 => 2,
        ColorType::Rgb8 => 3,
        ColorType::Rgba8 | ColorType::La16 => 4,
        ColorType::Rgb16 => 6,
        ColorType::Rgba16 => 8,
        ColorType::Rgb32F => 12,
        ColorType::Rgba32F => 16,
        _ => 4,
    };

    (width as u64 * height as u64 * bytes_per_pixel) as f64 / (1024.0 * 1024.0)
}

pub fn print_report(report: &AnalysisReport) {
    println!("{} Basic Information:", INFO_PREFIX);
    println!("  📁 File: {}", report.path.display());
    println!("  🎭 Format: {} ({})", report.source_format, report.source_format.mime_type());
    println!("  📏 Dimensions: {}x{} pixels", report.width, report.height);
    println!(
        "  📦 File size: {} ({} bytes)",
        format_file_size(report.file_size),
        report.file_size
    );
    println!("  🎨 Color type: {}", report.color_type);
    println!("  🌫️  Alpha channel: {}", if report.has_alpha { "yes" } else { "no" });
    println!("  🔢 Megapixels: {:.2} MP", report.megapixels());
    println!("  💾 Decoded size: {:.2} MB", report.decoded_memory_mib);
    println!("  📐 Aspect ratio: {:.2}:1", report.aspect_ratio());

    let features = &report.features;
    println!("\n📊 Complexity:");
    println!("  Edge density: {:.3}", features.edge_density);
    println!("  Texture variance: {:.3}", features.texture_variance);
    println!("  Difficulty score: {:.3}", features.difficulty_score);

    println!("\n💡 Recommended plan:");
    for plan in &report.recommended_plans {
        let resize = match plan.target_box {
            Some(target) => format!(", resize to {}x{}", target.width, target.height),
            None => String::new(),
        };
        let action = if plan.is_passthrough(report.source_format) {
            " (already well compressed, original kept)"
        } else {
            ""
        };
        println!("  🎯 {} {}{}{}", plan.format, plan.quality, resize, action);
    }
}
