pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// Infix inserted between the file stem and the quality/extension of every output.
pub const OUTPUT_SUFFIX: &str = "_compress";

// Analyzer defaults
pub const DEFAULT_ANALYSIS_MAX_SIDE: u32 = 512;
pub const DEFAULT_EDGE_THRESHOLD: u32 = 48;
pub const DEFAULT_BLOCK_SIZE: u32 = 8;
pub const DEFAULT_VARIANCE_REFERENCE: f64 = 1024.0;

// Decision defaults
pub const DEFAULT_DIFFICULTY_THRESHOLD: f64 = 0.35;
pub const DEFAULT_SMALL_PNG_BYTES: u64 = 200 * 1024;
pub const DEFAULT_QUALITY_FLOOR: u8 = 70;
pub const DEFAULT_QUALITY_CEILING: u8 = 90;

// Fallback ladder defaults
pub const DEFAULT_RETRY_BUDGET: u32 = 3;
pub const DEFAULT_QUALITY_STEP: u8 = 10;
pub const DEFAULT_MIN_RETRY_QUALITY: u8 = 30;

// Codec defaults
pub const DEFAULT_PNG_PRESET: u8 = 2;
pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const MAX_PNG_PRESET: u8 = 6;
/// Difficulty at or below which content is treated as flat graphics
pub const DEFAULT_GRAPHIC_DIFFICULTY: f64 = 0.1;
/// Difficulty above which content is treated as photographic
pub const DEFAULT_PHOTO_DIFFICULTY: f64 = 0.35;
/// Above this many pixels encoders trade a little size for speed
pub const LARGE_IMAGE_PIXELS: u64 = 4_000_000;
/// Below this many pixels the most thorough settings are cheap
pub const SMALL_IMAGE_PIXELS: u64 = 100_000;
/// JPEG has no lossless mode; a lossless request re-encodes at this quality.
pub const JPEG_MAX_FIDELITY_QUALITY: u8 = 100;

// Batch defaults
pub const MIN_AVAILABLE_MEMORY_MIB: u64 = 512;
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[".git", "node_modules", "__pycache__", ".venv"];

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif", "gif"];

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

// Common output message prefixes
pub const ORIGINAL_SIZE_PREFIX: &str = "📊 Original size:";
pub const COMPRESSED_SIZE_PREFIX: &str = "📈 Compressed size:";
pub const COMPRESSION_RATIO_PREFIX: &str = "🎯 Compression ratio:";
pub const SUCCESS_PREFIX: &str = "✅";
pub const WARNING_PREFIX: &str = "⚠️";
pub const ERROR_PREFIX: &str = "❌";
pub const INFO_PREFIX: &str = "📋";
