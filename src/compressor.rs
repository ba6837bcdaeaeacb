//! Executes encoding plans against one decoded source image.
//!
//! Every plan yields a `CompressionResult`; nothing here returns an error to
//! the caller. A successful result is never larger than the source: when no
//! encode beats the original size, the original bytes are written instead.

use crate::analyzer::{self, ImageFeatures};
use crate::codec::Codec;
use crate::config::{EngineConfig, FallbackConfig};
use crate::constants::OUTPUT_SUFFIX;
use crate::decision::{self, EncodingPlan, Overrides, Quality};
use crate::error::{CompressionError, FileError, Result};
use crate::formats::{ImageKind, OutputFormat};
use crate::result::CompressionResult;
use crate::utils::write_atomic;
use image::{DynamicImage, GenericImageView};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A source file read and decoded once, shared by all of its plans.
pub struct SourceImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
    pub image: DynamicImage,
}

impl SourceImage {
    pub fn load<C: Codec + ?Sized>(path: &Path, codec: &C) -> Result<Self> {
        if !path.exists() {
            return Err(CompressionError::FileNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;

        // Content sniffing wins; the extension only helps when the header is damaged
        let kind = match ImageKind::detect(&bytes).or_else(|| ImageKind::from_path(path)) {
            Some(kind) => kind,
            None if bytes.is_empty() => {
                return Err(CompressionError::Decode("file is empty".to_string()))
            }
            None => {
                return Err(CompressionError::UnsupportedFormat(
                    path.display().to_string(),
                ))
            }
        };

        let image = codec.decode(&bytes, Some(kind))?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            kind,
            image,
        })
    }

    pub fn original_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// The extension the file came with, falling back to the detected kind's.
    fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_string())
            .unwrap_or_else(|| self.kind.extension().to_string())
    }
}

/// Where a plan's output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Used verbatim
    File(PathBuf),
    /// Gets a generated `<stem>_compress[_<q>].<ext>` name
    Directory(PathBuf),
}

impl OutputTarget {
    /// A named output file fixes the format: its bytes must match its extension.
    pub fn pins_format(&self) -> bool {
        matches!(self, OutputTarget::File(_))
    }

    pub fn path_for(&self, input: &Path, extension: &str, quality: Option<u8>) -> PathBuf {
        match self {
            OutputTarget::File(path) => path.clone(),
            OutputTarget::Directory(dir) => dir.join(output_file_name(input, extension, quality)),
        }
    }
}

/// Deterministic output name: `<stem>_compress.<ext>` for lossless output or
/// kept originals, `<stem>_compress_<q>.<ext>` for lossy output.
pub fn output_file_name(input: &Path, extension: &str, quality: Option<u8>) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    match quality {
        Some(q) => format!("{}{}_{}.{}", stem, OUTPUT_SUFFIX, q, extension),
        None => format!("{}{}.{}", stem, OUTPUT_SUFFIX, extension),
    }
}

/// The encodes tried for one plan, in order: the plan itself, then up to
/// `retry_budget` retries. Lossy formats step their quality down; a source
/// format with a lossless mode gets the last slot when it differs from the
/// plan's format.
pub fn fallback_ladder(
    plan: &EncodingPlan,
    source: ImageKind,
    config: &FallbackConfig,
) -> Vec<(OutputFormat, Quality)> {
    let mut ladder = vec![(plan.format, plan.quality)];
    let budget = config.retry_budget as usize;

    let source_retry = source
        .as_output()
        .filter(|format| *format != plan.format && format.supports_lossless());
    let step_budget = budget.saturating_sub(source_retry.is_some() as usize);

    if plan.format.supports_quality() && config.quality_step > 0 {
        let mut current = plan.quality.level().unwrap_or(100);
        while ladder.len() <= step_budget {
            let next = current.saturating_sub(config.quality_step).max(config.min_quality);
            if next >= current {
                break;
            }
            ladder.push((plan.format, Quality::Level(next)));
            current = next;
        }
    }

    if let Some(format) = source_retry {
        if ladder.len() <= budget {
            ladder.push((format, Quality::Lossless));
        }
    }

    ladder
}

pub struct Compressor<'a, C: Codec + ?Sized> {
    codec: &'a C,
    config: &'a EngineConfig,
}

impl<'a, C: Codec + ?Sized> Compressor<'a, C> {
    pub fn new(codec: &'a C, config: &'a EngineConfig) -> Self {
        Self { codec, config }
    }

    /// Load, analyze, plan and execute for one file.
    pub fn compress_file(
        &self,
        path: &Path,
        overrides: &Overrides,
        target: &OutputTarget,
    ) -> Vec<CompressionResult> {
        let source = match SourceImage::load(path, self.codec) {
            Ok(source) => source,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to load image");
                return load_failures(path, overrides, &err);
            }
        };

        let features = analyzer::analyze(&source.image, source.original_size(), &self.config.analyzer);
        let plans = decision::plan(&features, source.kind, overrides, &self.config.decision);
        debug!(
            path = %path.display(),
            difficulty = features.difficulty_score,
            plans = plans.len(),
            "planned"
        );
        self.run(&source, &features, &plans, target)
    }

    pub fn run(
        &self,
        source: &SourceImage,
        features: &ImageFeatures,
        plans: &[EncodingPlan],
        target: &OutputTarget,
    ) -> Vec<CompressionResult> {
        plans
            .iter()
            .map(|plan| self.execute(source, features, plan, target))
            .collect()
    }

    fn execute(
        &self,
        source: &SourceImage,
        features: &ImageFeatures,
        plan: &EncodingPlan,
        target: &OutputTarget,
    ) -> CompressionResult {
        if plan.is_passthrough(source.kind) {
            debug!(path = %source.path.display(), "verified, copying original");
            return self.keep_original(source, target);
        }

        let original_size = source.original_size();
        let original_dimensions = source.image.dimensions();

        let resized;
        let image = match plan.target_box {
            Some(target_box) => {
                resized = self.codec.resize(&source.image, target_box);
                &resized
            }
            None => &source.image,
        };

        let ladder = fallback_ladder(plan, source.kind, &self.config.fallback)
            .into_iter()
            .filter(|(format, _)| !target.pins_format() || *format == plan.format);

        for (attempt, (format, quality)) in ladder.enumerate() {
            let bytes = match self.codec.encode(image, format, quality, features) {
                Ok(bytes) => bytes,
                Err(err) if attempt == 0 => {
                    warn!(path = %source.path.display(), %format, error = %err, "encode failed");
                    return self.failure(source, err);
                }
                Err(err) => {
                    debug!(path = %source.path.display(), %format, %quality, error = %err, "retry failed");
                    continue;
                }
            };

            let size = bytes.len() as u64;
            if size >= original_size {
                debug!(
                    path = %source.path.display(),
                    %format,
                    %quality,
                    size,
                    original_size,
                    "not smaller than original"
                );
                continue;
            }

            let output_path = target.path_for(&source.path, format.extension(), quality.level());
            if let Err(err) = write_atomic(&output_path, &bytes) {
                warn!(path = %output_path.display(), error = %err, "write failed");
                return self.failure(source, err);
            }

            return CompressionResult {
                input_path: source.path.clone(),
                output_path: Some(output_path),
                original_size,
                compressed_size: size,
                format_used: Some(format.kind()),
                quality_used: quality.level(),
                success: true,
                error: None,
                original_dimensions: Some(original_dimensions),
                final_dimensions: Some(image.dimensions()),
                was_resized: plan.target_box.is_some(),
                kept_original: false,
            };
        }

        warn!(
            path = %source.path.display(),
            format = %plan.format,
            "no encode beat the original size, keeping original"
        );
        self.keep_original(source, target)
    }

    fn keep_original(&self, source: &SourceImage, target: &OutputTarget) -> CompressionResult {
        let output_path = match target {
            OutputTarget::File(path) if ImageKind::from_path(path) != Some(source.kind) => {
                let swapped = path.with_extension(source.extension());
                warn!(
                    requested = %path.display(),
                    written = %swapped.display(),
                    "original kept in its own format, extension changed"
                );
                swapped
            }
            _ => target.path_for(&source.path, &source.extension(), None),
        };
        if let Err(err) = write_atomic(&output_path, &source.bytes) {
            warn!(path = %output_path.display(), error = %err, "write failed");
            return self.failure(source, err);
        }

        let dimensions = source.image.dimensions();
        CompressionResult {
            input_path: source.path.clone(),
            output_path: Some(output_path),
            original_size: source.original_size(),
            compressed_size: source.original_size(),
            format_used: Some(source.kind),
            quality_used: None,
            success: true,
            error: None,
            original_dimensions: Some(dimensions),
            final_dimensions: Some(dimensions),
            was_resized: false,
            kept_original: true,
        }
    }

    fn failure(&self, source: &SourceImage, err: CompressionError) -> CompressionResult {
        let mut result = CompressionResult::failure(source.path.clone(), source.original_size(), err.into());
        result.original_dimensions = Some(source.image.dimensions());
        result
    }
}

/// One failed result per plan the file would have produced.
pub fn load_failures(path: &Path, overrides: &Overrides, err: &CompressionError) -> Vec<CompressionResult> {
    let original_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let error = FileError::from(err);
    (0..overrides.formats.plan_count())
        .map(|_| CompressionResult::failure(path.to_path_buf(), original_size, error.clone()))
        .collect()
}
