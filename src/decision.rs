//! Turns analyzer features and user overrides into concrete encoding plans.

use crate::analyzer::ImageFeatures;
use crate::config::DecisionConfig;
use crate::constants::{MAX_QUALITY, MIN_QUALITY};
use crate::formats::{ImageKind, OutputFormat};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// No quality supplied; the format's lossless mode, or the source bytes for JPEG
    #[default]
    Lossless,
    Level(u8),
}

impl Quality {
    pub fn level(&self) -> Option<u8> {
        match self {
            Quality::Lossless => None,
            Quality::Level(q) => Some(*q),
        }
    }
}

impl From<Option<u8>> for Quality {
    fn from(quality: Option<u8>) -> Self {
        quality.map_or(Quality::Lossless, Quality::Level)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Lossless => f.write_str("lossless"),
            Quality::Level(q) => write!(f, "q{}", q),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormatSelection {
    #[default]
    Auto,
    /// Deduplicated, order-preserving, non-empty
    Explicit(Vec<OutputFormat>),
}

impl FormatSelection {
    /// Builds an explicit selection, dropping repeats. An empty list means `Auto`.
    pub fn explicit(formats: impl IntoIterator<Item = OutputFormat>) -> Self {
        let mut unique: Vec<OutputFormat> = Vec::new();
        for format in formats {
            if !unique.contains(&format) {
                unique.push(format);
            }
        }
        if unique.is_empty() {
            FormatSelection::Auto
        } else {
            FormatSelection::Explicit(unique)
        }
    }

    /// How many plans one source will produce.
    pub fn plan_count(&self) -> usize {
        match self {
            FormatSelection::Auto => 1,
            FormatSelection::Explicit(formats) => formats.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TargetBox {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncodingPlan {
    pub format: OutputFormat,
    pub quality: Quality,
    pub target_box: Option<TargetBox>,
}

impl EncodingPlan {
    /// True when executing the plan amounts to writing the source bytes back
    /// unchanged: same format, no resize, and no lossless mode to re-encode with.
    pub fn is_passthrough(&self, source: ImageKind) -> bool {
        self.format.kind() == source
            && self.quality == Quality::Lossless
            && self.target_box.is_none()
            && !self.format.supports_lossless()
    }
}

/// User overrides that steer the decision.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Overrides {
    pub formats: FormatSelection,
    pub quality: Quality,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

/// Produces the ordered plans for one source image.
pub fn plan(
    features: &ImageFeatures,
    source: ImageKind,
    overrides: &Overrides,
    config: &DecisionConfig,
) -> Vec<EncodingPlan> {
    let target_box = compute_target_box(
        features.width,
        features.height,
        overrides.max_width,
        overrides.max_height,
    );

    let formats = match &overrides.formats {
        FormatSelection::Explicit(formats) => formats.clone(),
        FormatSelection::Auto => vec![auto_format(features, source, config)],
    };

    formats
        .into_iter()
        .map(|format| EncodingPlan {
            format,
            quality: choose_quality(format, features, source, overrides.quality, target_box, config),
            target_box,
        })
        .collect()
}

fn is_difficult(features: &ImageFeatures, config: &DecisionConfig) -> bool {
    features.difficulty_score > config.difficulty_threshold
}

fn lossy_target(source: ImageKind, config: &DecisionConfig) -> OutputFormat {
    match source {
        ImageKind::Jpeg => OutputFormat::Jpeg,
        ImageKind::WebP => OutputFormat::WebP,
        _ => config.preferred_lossy_format,
    }
}

fn auto_format(features: &ImageFeatures, source: ImageKind, config: &DecisionConfig) -> OutputFormat {
    if features.has_alpha {
        return OutputFormat::Png;
    }
    if is_difficult(features, config) {
        return lossy_target(source, config);
    }
    if source == ImageKind::Png && features.original_bytes < config.small_png_bytes {
        OutputFormat::Png
    } else {
        lossy_target(source, config)
    }
}

fn choose_quality(
    format: OutputFormat,
    features: &ImageFeatures,
    source: ImageKind,
    requested: Quality,
    target_box: Option<TargetBox>,
    config: &DecisionConfig,
) -> Quality {
    if format == OutputFormat::Png {
        return Quality::Lossless;
    }
    if let Quality::Level(q) = requested {
        return Quality::Level(q.clamp(MIN_QUALITY, MAX_QUALITY));
    }

    let difficult = is_difficult(features, config);
    let keep_lossless = match format {
        OutputFormat::WebP => !difficult,
        OutputFormat::Jpeg => source == ImageKind::Jpeg && target_box.is_none() && !difficult,
        OutputFormat::Png => true,
    };

    if keep_lossless {
        Quality::Lossless
    } else {
        Quality::Level(tuned_quality(features.difficulty_score, config))
    }
}

/// Harder images get higher quality: blocky artifacts show first on busy content.
pub fn tuned_quality(difficulty: f64, config: &DecisionConfig) -> u8 {
    let floor = config.quality_floor as f64;
    let ceiling = config.quality_ceiling as f64;
    let level = (floor + (ceiling - floor) * difficulty.clamp(0.0, 1.0)).round();
    (level as u8).clamp(MIN_QUALITY, MAX_QUALITY)
}

/// Aspect-preserving box within both limits, or `None` when the image already fits.
pub fn compute_target_box(
    width: u32,
    height: u32,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> Option<TargetBox> {
    if width == 0 || height == 0 {
        return None;
    }
    let limit_w = max_width.unwrap_or(width).max(1);
    let limit_h = max_height.unwrap_or(height).max(1);
    if width <= limit_w && height <= limit_h {
        return None;
    }

    let scale = (limit_w as f64 / width as f64).min(limit_h as f64 / height as f64);
    let scaled = |side: u32, limit: u32| -> u32 {
        ((side as f64 * scale).round() as u32).max(1).min(limit).min(side)
    };

    Some(TargetBox {
        width: scaled(width, limit_w),
        height: scaled(height, limit_h),
    })
}
