pub mod analyzer;
pub mod batch;
pub mod cli;
pub mod codec;
pub mod compressor;
pub mod config;
pub mod constants;
pub mod decision;
pub mod engine;
pub mod error;
pub mod formats;
pub mod info;
pub mod logging;
pub mod result;
pub mod utils;

pub use analyzer::{analyze, ImageFeatures};
pub use batch::{check_root, discover_images, run_batch, BatchOptions};
pub use codec::{png_preset_for, Codec, ContentClass, ImageCodec, WebPTuning};
pub use compressor::{output_file_name, Compressor, OutputTarget, SourceImage};
pub use config::{AnalyzerConfig, BatchConfig, CodecConfig, DecisionConfig, EngineConfig, FallbackConfig};
pub use decision::{compute_target_box, plan, EncodingPlan, FormatSelection, Overrides, Quality, TargetBox};
pub use engine::{CompressionOptions, Engine};
pub use error::{CompressionError, ErrorKind, FileError, Result};
pub use formats::{ImageKind, OutputFormat};
pub use info::{print_report, AnalysisReport};
pub use result::{BatchResult, CompressOutcome, CompressionResult, MultiFormatResult};
pub use utils::{calculate_compression_ratio, ensure_dir, format_file_size, is_image_file, write_atomic};
