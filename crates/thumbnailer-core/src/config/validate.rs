//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.pipeline.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.buffer_size must be > 0".into(),
            ));
        }
        if self.pipeline.decode_workers == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.decode_workers must be > 0".into(),
            ));
        }
        if self.pipeline.resize_workers == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.resize_workers must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.thumbnail.max_width == 0 || self.thumbnail.max_height == 0 {
            return Err(ConfigError::ValidationError(
                "thumbnail.max_width and thumbnail.max_height must be > 0".into(),
            ));
        }
        // An empty marker would write thumbnails over their sources.
        if self.thumbnail.marker.is_empty() {
            return Err(ConfigError::ValidationError(
                "thumbnail.marker must not be empty".into(),
            ));
        }
        if self.thumbnail.marker.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(
                "thumbnail.marker must not contain path separators".into(),
            ));
        }
        Ok(())
    }
}
