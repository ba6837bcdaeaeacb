use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a failure, stable across releases and safe to
/// hand to callers that only need to branch on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    UnsupportedFormat,
    CodecFailure,
    IoFailure,
    PreconditionFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::UnsupportedFormat => "unsupported format",
            ErrorKind::CodecFailure => "codec failure",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::PreconditionFailure => "precondition failure",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode {format}: {reason}")]
    Encode { format: String, reason: String },

    #[error("Encoder produced no data for {0}")]
    EmptyOutput(String),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Invalid maximum dimension: {0}. Must be greater than 0")]
    InvalidDimension(u32),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No output formats requested")]
    EmptyFormatList,

    #[error("Output file {path} does not match the requested {format} format")]
    OutputFormatMismatch { path: PathBuf, format: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Input path is neither a file nor a directory: {0}")]
    UnsupportedPathType(PathBuf),

    #[error("Failed to create output directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error("Failed to write output file {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("Batch root does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("Batch root is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("Batch root is not readable: {path}: {reason}")]
    RootUnreadable { path: PathBuf, reason: String },

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("Worker panicked while processing {0}")]
    WorkerPanic(PathBuf),
}

impl CompressionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompressionError::Io(_)
            | CompressionError::DirectoryCreationFailed(_)
            | CompressionError::WriteFailed { .. }
            | CompressionError::WalkdirError(_)
            | CompressionError::WorkerPool(_) => ErrorKind::IoFailure,
            CompressionError::Decode(_)
            | CompressionError::Encode { .. }
            | CompressionError::EmptyOutput(_)
            | CompressionError::PngOptimization(_)
            | CompressionError::WorkerPanic(_) => ErrorKind::CodecFailure,
            CompressionError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            CompressionError::InvalidQuality(_)
            | CompressionError::InvalidDimension(_)
            | CompressionError::EmptyFormatList
            | CompressionError::OutputFormatMismatch { .. }
            | CompressionError::FileNotFound(_)
            | CompressionError::UnsupportedPathType(_)
            | CompressionError::InvalidPattern(_)
            | CompressionError::InvalidConfig(_)
            | CompressionError::ConfigParse(_) => ErrorKind::InvalidInput,
            CompressionError::RootNotFound(_)
            | CompressionError::RootNotDirectory(_)
            | CompressionError::RootUnreadable { .. } => ErrorKind::PreconditionFailure,
        }
    }
}

/// Serializable failure record attached to a per-file result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&CompressionError> for FileError {
    fn from(err: &CompressionError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<CompressionError> for FileError {
    fn from(err: CompressionError) -> Self {
        FileError::from(&err)
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
