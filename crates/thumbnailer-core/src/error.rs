//! Error types for the Thumbnailer pipeline.
//!
//! Errors are organized by stage so that a failed run reports which stage
//! broke and which image triggered it.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::Stage;

/// Top-level error type for Thumbnailer operations.
#[derive(Error, Debug)]
pub enum ThumbnailerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Listing the input location failed
    #[error("Cannot enumerate sources in {path}: {message}")]
    Enumeration { path: PathBuf, message: String },

    /// The source could not be opened or read
    #[error("Cannot open {path}: {message}")]
    SourceOpen { path: PathBuf, message: String },

    /// The source bytes are not a valid image
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// The source format could not be determined
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Resizing failed on a decoded image
    #[error("Resize failed for {path}: {message}")]
    Resample { path: PathBuf, message: String },

    /// The thumbnail file could not be created
    #[error("Cannot create {path}: {message}")]
    TargetCreate { path: PathBuf, message: String },

    /// Encoding or writing the thumbnail failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: Stage,
        timeout_ms: u64,
    },

    /// A stage task died without finishing its work
    #[error("{stage} stage failed: {message}")]
    StageFailed { stage: Stage, message: String },

    /// The run was cancelled before it finished
    #[error("Pipeline run cancelled")]
    Cancelled,
}

impl PipelineError {
    /// The file this error is about, if it concerns a single file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Enumeration { path, .. }
            | Self::SourceOpen { path, .. }
            | Self::Decode { path, .. }
            | Self::UnsupportedFormat { path, .. }
            | Self::FileTooLarge { path, .. }
            | Self::ImageTooLarge { path, .. }
            | Self::Resample { path, .. }
            | Self::TargetCreate { path, .. }
            | Self::Encode { path, .. }
            | Self::Timeout { path, .. } => Some(path),
            Self::StageFailed { .. } | Self::Cancelled => None,
        }
    }
}

/// Convenience type alias for Thumbnailer results.
pub type Result<T> = std::result::Result<T, ThumbnailerError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_names_file() {
        let err = PipelineError::Decode {
            path: PathBuf::from("pictures/broken.jpg"),
            message: "invalid JPEG marker".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pictures/broken.jpg"));
        assert!(msg.contains("invalid JPEG marker"));
        assert_eq!(err.path(), Some(Path::new("pictures/broken.jpg")));
    }

    #[test]
    fn test_timeout_names_stage() {
        let err = PipelineError::Timeout {
            path: PathBuf::from("a.png"),
            stage: Stage::Decode,
            timeout_ms: 250,
        };
        assert_eq!(err.to_string(), "Timeout in decode stage for a.png after 250ms");
    }

    #[test]
    fn test_cancelled_has_no_path() {
        assert!(PipelineError::Cancelled.path().is_none());
    }
}
