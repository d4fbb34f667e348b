//! Sub-configuration structs with their defaults.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory processed when no input is given on the command line
    pub input_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input_dir: "./pictures".to_string(),
        }
    }
}

/// Source discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Supported input formats (file extensions, case-insensitive)
    pub supported_formats: Vec<String>,

    /// Descend into subdirectories
    pub recursive: bool,

    /// Ignore files that are already thumbnails (stem ends with the marker)
    pub skip_derived: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
                "tif".to_string(),
                "tiff".to_string(),
            ],
            recursive: false,
            skip_derived: true,
        }
    }
}

/// What a stage does when a single image fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the whole run on the first error
    #[default]
    FailFast,
    /// Record the failure, skip the image, keep going
    Continue,
}

/// Pipeline settings for backpressure and per-stage concurrency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max images buffered between two stages
    pub buffer_size: usize,

    /// Behavior when an image fails in any stage
    pub failure_policy: FailurePolicy,

    /// Concurrent decode workers
    pub decode_workers: usize,

    /// Concurrent resize workers
    pub resize_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 4,
            failure_policy: FailurePolicy::FailFast,
            decode_workers: 1,
            resize_workers: 1,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 20000,
            decode_timeout_ms: 30000,
        }
    }
}

/// Resampling filter used when shrinking images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    /// Nearest neighbor
    Nearest,
    /// Linear (bilinear)
    Triangle,
    /// Cubic (Catmull-Rom)
    CatmullRom,
    /// Gaussian
    Gaussian,
    /// Lanczos with window 3
    #[default]
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Maximum thumbnail width in pixels
    pub max_width: u32,

    /// Maximum thumbnail height in pixels
    pub max_height: u32,

    /// Resampling filter
    pub filter: ResizeFilter,

    /// Token inserted before the extension of the source file name
    pub marker: String,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_width: 150,
            max_height: 150,
            filter: ResizeFilter::Lanczos3,
            marker: "_thumb".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
