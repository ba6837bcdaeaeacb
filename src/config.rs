//! Engine configuration.
//!
//! Every threshold the analyzer, the decision engine and the fallback ladder
//! consult lives here. The numbers are heuristics tuned on ordinary photo and
//! screenshot sets, not derived optima; override any subset from a JSON file:
//!
//! ```json
//! { "decision": { "difficulty_threshold": 0.5 }, "batch": { "workers": 2 } }
//! ```

use crate::constants::*;
use crate::error::{CompressionError, Result};
use crate::formats::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analyzer: AnalyzerConfig,
    pub decision: DecisionConfig,
    pub fallback: FallbackConfig,
    pub codec: CodecConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Longest side the image is downsampled to before scoring
    pub analysis_max_side: u32,
    /// Summed per-channel right+bottom gradient above which a pixel is an edge
    pub edge_threshold: u32,
    /// Side of the square blocks used for texture variance
    pub block_size: u32,
    /// Luma variance that maps to a texture score of 1.0
    pub variance_reference: f64,
    pub edge_weight: f64,
    pub texture_weight: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            analysis_max_side: DEFAULT_ANALYSIS_MAX_SIDE,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            block_size: DEFAULT_BLOCK_SIZE,
            variance_reference: DEFAULT_VARIANCE_REFERENCE,
            edge_weight: 0.5,
            texture_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Difficulty above which an opaque image goes lossy
    pub difficulty_threshold: f64,
    /// PNG sources below this size stay PNG
    pub small_png_bytes: u64,
    /// Lossy target for sources that are neither JPEG nor WebP
    pub preferred_lossy_format: OutputFormat,
    /// Tuned quality for a difficulty of 0.0
    pub quality_floor: u8,
    /// Tuned quality for a difficulty of 1.0
    pub quality_ceiling: u8,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            difficulty_threshold: DEFAULT_DIFFICULTY_THRESHOLD,
            small_png_bytes: DEFAULT_SMALL_PNG_BYTES,
            preferred_lossy_format: OutputFormat::WebP,
            quality_floor: DEFAULT_QUALITY_FLOOR,
            quality_ceiling: DEFAULT_QUALITY_CEILING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Maximum re-encodes after the first attempt fails the size guard
    pub retry_budget: u32,
    pub quality_step: u8,
    pub min_quality: u8,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            quality_step: DEFAULT_QUALITY_STEP,
            min_quality: DEFAULT_MIN_RETRY_QUALITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// oxipng preset, 0 (fast) to 6 (thorough)
    pub png_preset: u8,
    /// Use zopfli for PNG deflate; much slower, a few percent smaller
    pub png_zopfli: bool,
    /// Difficulty at or below which encoders use their flat-graphics settings
    pub graphic_difficulty: f64,
    /// Difficulty above which encoders use their photo settings
    pub photo_difficulty: f64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            png_preset: DEFAULT_PNG_PRESET,
            png_zopfli: false,
            graphic_difficulty: DEFAULT_GRAPHIC_DIFFICULTY,
            photo_difficulty: DEFAULT_PHOTO_DIFFICULTY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads; `None` sizes the pool from CPUs and free memory
    pub workers: Option<usize>,
    /// Glob patterns matched against directory names to prune during discovery
    pub exclude_dirs: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: None,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let analyzer = &self.analyzer;
        if analyzer.analysis_max_side == 0 {
            return invalid("analyzer.analysis_max_side must be greater than 0");
        }
        if analyzer.block_size == 0 {
            return invalid("analyzer.block_size must be greater than 0");
        }
        if analyzer.variance_reference <= 0.0 {
            return invalid("analyzer.variance_reference must be positive");
        }
        if analyzer.edge_weight < 0.0
            || analyzer.texture_weight < 0.0
            || analyzer.edge_weight + analyzer.texture_weight <= 0.0
        {
            return invalid("analyzer weights must be non-negative and not both zero");
        }

        let decision = &self.decision;
        if !(0.0..=1.0).contains(&decision.difficulty_threshold) {
            return invalid("decision.difficulty_threshold must be between 0.0 and 1.0");
        }
        if decision.preferred_lossy_format == OutputFormat::Png {
            return invalid("decision.preferred_lossy_format must be jpeg or webp");
        }
        check_quality(decision.quality_floor)?;
        check_quality(decision.quality_ceiling)?;
        if decision.quality_floor > decision.quality_ceiling {
            return invalid("decision.quality_floor must not exceed decision.quality_ceiling");
        }

        check_quality(self.fallback.min_quality)?;
        if self.fallback.quality_step == 0 {
            return invalid("fallback.quality_step must be greater than 0");
        }

        let codec = &self.codec;
        if codec.png_preset > MAX_PNG_PRESET {
            return invalid("codec.png_preset must be between 0 and 6");
        }
        if !(0.0..=1.0).contains(&codec.graphic_difficulty)
            || !(0.0..=1.0).contains(&codec.photo_difficulty)
            || codec.graphic_difficulty > codec.photo_difficulty
        {
            return invalid("codec difficulty bands must satisfy 0 <= graphic <= photo <= 1");
        }

        if self.batch.workers == Some(0) {
            return invalid("batch.workers must be greater than 0");
        }
        for pattern in &self.batch.exclude_dirs {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }

    /// Loads a JSON config; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CompressionError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

fn check_quality(quality: u8) -> Result<()> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        return Err(CompressionError::InvalidQuality(quality));
    }
    Ok(())
}

fn invalid(message: &str) -> Result<()> {
    Err(CompressionError::InvalidConfig(message.to_string()))
}
