//! Outcome records returned to callers.

use crate::error::FileError;
use crate::formats::ImageKind;
use crate::utils::{calculate_compression_ratio, format_file_size};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionResult {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub original_size: u64,
    pub compressed_size: u64,
    pub format_used: Option<ImageKind>,
    /// `None` for lossless encodes and kept originals
    pub quality_used: Option<u8>,
    pub success: bool,
    pub error: Option<FileError>,
    pub original_dimensions: Option<(u32, u32)>,
    pub final_dimensions: Option<(u32, u32)>,
    pub was_resized: bool,
    /// The original bytes were written unchanged
    pub kept_original: bool,
}

impl CompressionResult {
    /// A failed record: nothing written, sizes as far as they are known.
    pub fn failure(input_path: PathBuf, original_size: u64, error: FileError) -> Self {
        Self {
            input_path,
            output_path: None,
            original_size,
            compressed_size: 0,
            format_used: None,
            quality_used: None,
            success: false,
            error: Some(error),
            original_dimensions: None,
            final_dimensions: None,
            was_resized: false,
            kept_original: false,
        }
    }

    pub fn size_saved(&self) -> u64 {
        if self.success {
            self.original_size.saturating_sub(self.compressed_size)
        } else {
            0
        }
    }

    pub fn compression_ratio(&self) -> f64 {
        if self.success {
            calculate_compression_ratio(self.original_size, self.compressed_size)
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> String {
        let name = self.input_path.display();
        if !self.success {
            return match &self.error {
                Some(error) => format!("{}: failed ({})", name, error),
                None => format!("{}: failed", name),
            };
        }

        let format = self
            .format_used
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "?".to_string());
        let quality = match self.quality_used {
            Some(q) => format!(" q{}", q),
            None => String::new(),
        };
        let note = if self.kept_original {
            ", original kept"
        } else if self.was_resized {
            ", resized"
        } else {
            ""
        };
        format!(
            "{}: {} -> {} ({:.1}% smaller, {}{}{})",
            name,
            format_file_size(self.original_size),
            format_file_size(self.compressed_size),
            self.compression_ratio(),
            format,
            quality,
            note
        )
    }
}

/// One input encoded into several formats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiFormatResult {
    pub input_path: PathBuf,
    pub results: Vec<CompressionResult>,
}

impl MultiFormatResult {
    pub fn success(&self) -> bool {
        self.results.iter().any(|r| r.success)
    }

    /// The successful result that saved the most bytes.
    pub fn best_result(&self) -> Option<&CompressionResult> {
        self.results
            .iter()
            .filter(|r| r.success)
            .max_by_key(|r| r.size_saved())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub input_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    /// Discovery order, then plan order within a file
    pub results: Vec<CompressionResult>,
    pub success: bool,
}

impl BatchResult {
    pub fn new(input_dir: PathBuf, output_dir: Option<PathBuf>, results: Vec<CompressionResult>) -> Self {
        let success = results.iter().any(|r| r.success);
        Self {
            input_dir,
            output_dir,
            results,
            success,
        }
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    /// Percentage of successful results; 0 for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.success_count() as f64 / self.results.len() as f64 * 100.0
    }

    /// Original bytes of the successful results.
    pub fn total_original_size(&self) -> u64 {
        self.successes().map(|r| r.original_size).sum()
    }

    pub fn total_compressed_size(&self) -> u64 {
        self.successes().map(|r| r.compressed_size).sum()
    }

    pub fn total_size_saved(&self) -> u64 {
        self.results.iter().map(|r| r.size_saved()).sum()
    }

    pub fn overall_compression_ratio(&self) -> f64 {
        calculate_compression_ratio(self.total_original_size(), self.total_compressed_size())
    }

    pub fn summary(&self) -> String {
        format!(
            "{}/{} succeeded ({:.2}%), {} -> {}, saved {} ({:.1}%)",
            self.success_count(),
            self.results.len(),
            self.success_rate(),
            format_file_size(self.total_original_size()),
            format_file_size(self.total_compressed_size()),
            format_file_size(self.total_size_saved()),
            self.overall_compression_ratio()
        )
    }

    fn successes(&self) -> impl Iterator<Item = &CompressionResult> {
        self.results.iter().filter(|r| r.success)
    }
}

/// What `Engine::compress` produced, by input shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CompressOutcome {
    Single(CompressionResult),
    MultiFormat(MultiFormatResult),
    Batch(BatchResult),
}

impl CompressOutcome {
    /// Every per-file result, in order.
    pub fn results(&self) -> Vec<&CompressionResult> {
        match self {
            CompressOutcome::Single(result) => vec![result],
            CompressOutcome::MultiFormat(multi) => multi.results.iter().collect(),
            CompressOutcome::Batch(batch) => batch.results.iter().collect(),
        }
    }

    pub fn success(&self) -> bool {
        match self {
            CompressOutcome::Single(result) => result.success,
            CompressOutcome::MultiFormat(multi) => multi.success(),
            CompressOutcome::Batch(batch) => batch.success,
        }
    }
}
