//! Caller-facing entry points.
//!
//! ```no_run
//! use img_smartpress::{CompressionOptions, Engine};
//! use std::path::Path;
//!
//! let engine = Engine::default();
//! let options = CompressionOptions::new(None, Some(80), Some(1920), None)?;
//! let outcome = engine.compress(Path::new("photos"), &options)?;
//! println!("{}", outcome.success());
//! # Ok::<(), img_smartpress::CompressionError>(())
//! ```

use crate::analyzer;
use crate::batch::{self, BatchOptions};
use crate::codec::{Codec, ImageCodec};
use crate::compressor::{Compressor, OutputTarget, SourceImage};
use crate::config::EngineConfig;
use crate::constants::{MAX_QUALITY, MIN_QUALITY};
use crate::decision::{self, FormatSelection, Overrides, Quality};
use crate::error::{CompressionError, Result};
use crate::formats::{ImageKind, OutputFormat};
use crate::info::{estimate_memory_usage, AnalysisReport};
use crate::result::{CompressOutcome, MultiFormatResult};
use crate::utils::is_image_file;
use image::GenericImageView;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOptions {
    /// File or directory; `None` writes next to the input
    pub output: Option<PathBuf>,
    pub overrides: Overrides,
    pub recursive: bool,
    pub workers: Option<usize>,
    pub progress: bool,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            output: None,
            overrides: Overrides::default(),
            recursive: true,
            workers: None,
            progress: false,
        }
    }
}

impl CompressionOptions {
    /// Validates the user-facing overrides. `formats` of `None` lets the engine
    /// choose; an empty list is rejected.
    pub fn new(
        formats: Option<Vec<String>>,
        quality: Option<u8>,
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> Result<Self> {
        if let Some(q) = quality {
            if !(MIN_QUALITY..=MAX_QUALITY).contains(&q) {
                return Err(CompressionError::InvalidQuality(q));
            }
        }
        for dimension in [max_width, max_height].into_iter().flatten() {
            if dimension == 0 {
                return Err(CompressionError::InvalidDimension(dimension));
            }
        }

        let formats = match formats {
            None => FormatSelection::Auto,
            Some(names) if names.is_empty() => return Err(CompressionError::EmptyFormatList),
            Some(names) => FormatSelection::explicit(
                names
                    .iter()
                    .map(|name| OutputFormat::from_str(name))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        Ok(Self {
            overrides: Overrides {
                formats,
                quality: Quality::from(quality),
                max_width,
                max_height,
            },
            ..Self::default()
        })
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

pub struct Engine<C: Codec = ImageCodec> {
    codec: C,
    config: EngineConfig,
}

impl Engine<ImageCodec> {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let codec = ImageCodec::new(config.codec.clone());
        Self::with_codec(codec, config)
    }
}

impl Default for Engine<ImageCodec> {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            codec: ImageCodec::new(config.codec.clone()),
            config,
        }
    }
}

impl<C: Codec> Engine<C> {
    pub fn with_codec(codec: C, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { codec, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compresses a file (one or several formats) or a directory tree.
    ///
    /// Only a missing input, an unusable output path, or a batch precondition
    /// returns `Err`; everything that goes wrong with an individual image is
    /// reported in its result.
    pub fn compress(&self, input: &Path, options: &CompressionOptions) -> Result<CompressOutcome> {
        if !input.exists() {
            return Err(CompressionError::FileNotFound(input.to_path_buf()));
        }

        if input.is_dir() {
            let batch_options = BatchOptions {
                recursive: options.recursive,
                output_dir: options.output.clone(),
                workers: options.workers,
                progress: options.progress,
            };
            return batch::run_batch(input, &options.overrides, &batch_options, &self.codec, &self.config)
                .map(CompressOutcome::Batch);
        }
        if !input.is_file() {
            return Err(CompressionError::UnsupportedPathType(input.to_path_buf()));
        }

        let compressor = Compressor::new(&self.codec, &self.config);

        if options.overrides.formats.plan_count() > 1 {
            let dir = options.output.clone().unwrap_or_else(|| parent_dir(input));
            let results = compressor.compress_file(input, &options.overrides, &OutputTarget::Directory(dir));
            return Ok(CompressOutcome::MultiFormat(MultiFormatResult {
                input_path: input.to_path_buf(),
                results,
            }));
        }

        let mut overrides = options.overrides.clone();
        let target = match &options.output {
            Some(path) if is_image_file(path) => {
                let requested = format_for_output(path)?;
                if overrides.formats == FormatSelection::Auto {
                    overrides.formats = FormatSelection::Explicit(vec![requested]);
                } else if overrides.formats != FormatSelection::Explicit(vec![requested]) {
                    return Err(CompressionError::OutputFormatMismatch {
                        path: path.clone(),
                        format: requested.to_string(),
                    });
                }
                OutputTarget::File(path.clone())
            }
            Some(dir) => OutputTarget::Directory(dir.clone()),
            None => OutputTarget::Directory(parent_dir(input)),
        };
        debug!(input = %input.display(), ?target, "compressing single file");

        compressor
            .compress_file(input, &overrides, &target)
            .into_iter()
            .next()
            .map(CompressOutcome::Single)
            .ok_or(CompressionError::EmptyFormatList)
    }

    /// Loads and scores one file, and reports what an override-free compress
    /// would do with it. Nothing is written.
    pub fn analyze(&self, input: &Path) -> Result<AnalysisReport> {
        if !input.exists() {
            return Err(CompressionError::FileNotFound(input.to_path_buf()));
        }
        if !input.is_file() {
            return Err(CompressionError::UnsupportedPathType(input.to_path_buf()));
        }

        let source = SourceImage::load(input, &self.codec)?;
        let features = analyzer::analyze(&source.image, source.original_size(), &self.config.analyzer);
        let recommended_plans = decision::plan(
            &features,
            source.kind,
            &Overrides::default(),
            &self.config.decision,
        );
        let (width, height) = source.image.dimensions();

        Ok(AnalysisReport {
            path: input.to_path_buf(),
            file_size: source.original_size(),
            source_format: source.kind,
            width,
            height,
            has_alpha: features.has_alpha,
            color_type: format!("{:?}", source.image.color()),
            decoded_memory_mib: estimate_memory_usage(&source.image),
            features,
            recommended_plans,
        })
    }
}

fn parent_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// The encodable format an output file name asks for.
fn format_for_output(path: &Path) -> Result<OutputFormat> {
    ImageKind::from_path(path)
        .and_then(|kind| kind.as_output())
        .ok_or_else(|| CompressionError::UnsupportedFormat(path.display().to_string()))
}
