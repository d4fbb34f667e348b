//! Thumbnailer Core - Embeddable batch thumbnail library.
//!
//! Thumbnailer turns a directory of images into thumbnails written next to
//! the originals (`pic.jpg` → `pic_thumb.jpg`).
//!
//! # Architecture
//!
//! Three stages run concurrently, connected by bounded channels:
//!
//! ```text
//! Sources → Decode → Resize → Write → Completion
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use thumbnailer_core::{Config, ProcessOptions, Thumbnailer};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> thumbnailer_core::Result<()> {
//!     let thumbnailer = Thumbnailer::new(Config::load()?)?;
//!     let summary = thumbnailer
//!         .process("./pictures".as_ref(), &ProcessOptions::default(), CancellationToken::new())
//!         .await?;
//!     println!("Wrote {} thumbnails", summary.succeeded());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::{Config, FailurePolicy, ResizeFilter};
pub use error::{ConfigError, PipelineError, PipelineResult, Result, ThumbnailerError};
pub use pipeline::{DiscoveredFile, ProgressEvent, ProgressFn, ThumbnailPipeline};
pub use types::{ItemFailure, RunSummary, Stage};

use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use pipeline::FileDiscovery;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for a single `process` call.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Leave out sources whose thumbnail already exists
    pub skip_existing: bool,
}

/// Thumbnailer - the main entry point: discovery plus the pipeline.
pub struct Thumbnailer {
    config: Config,
    discovery: FileDiscovery,
    pipeline: ThumbnailPipeline,
}

impl Thumbnailer {
    /// Create a new Thumbnailer with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        tracing::debug!("Initializing Thumbnailer v{}", VERSION);
        Ok(Self {
            discovery: FileDiscovery::new(config.processing.clone(), &config.thumbnail.marker),
            pipeline: ThumbnailPipeline::new(&config),
            config,
        })
    }

    /// Report progress events to `progress` during runs.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.pipeline = self.pipeline.with_progress(progress);
        self
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discover all source images at a path.
    pub fn discover(&self, path: &Path) -> Result<Vec<DiscoveredFile>> {
        Ok(self.discovery.discover(path)?)
    }

    /// Thumbnail every source image at `path`.
    pub async fn process(
        &self,
        path: &Path,
        options: &ProcessOptions,
        cancel: CancellationToken,
    ) -> Result<RunSummary> {
        let files = self.discover(path)?;
        self.process_files(files, options, cancel).await
    }

    /// Thumbnail an already discovered list of files.
    pub async fn process_files(
        &self,
        files: Vec<DiscoveredFile>,
        options: &ProcessOptions,
        cancel: CancellationToken,
    ) -> Result<RunSummary> {
        let (sources, skipped) = self.select_sources(files, options);
        if skipped > 0 {
            tracing::info!("Skipping {} image(s) with existing thumbnails", skipped);
        }

        let mut summary = self.pipeline.run_until_cancelled(sources, cancel).await?;
        summary.skipped = skipped;
        Ok(summary)
    }

    /// Number of `files` a run with `options` would hand to the pipeline.
    pub fn count_pending(&self, files: &[DiscoveredFile], options: &ProcessOptions) -> usize {
        files
            .iter()
            .filter(|f| self.is_pending(&f.path, options))
            .count()
    }

    fn is_pending(&self, source: &Path, options: &ProcessOptions) -> bool {
        !options.skip_existing || !self.pipeline.writer().target_for(source).exists()
    }

    fn select_sources(
        &self,
        files: Vec<DiscoveredFile>,
        options: &ProcessOptions,
    ) -> (Vec<PathBuf>, usize) {
        let total = files.len();
        let sources: Vec<PathBuf> = files
            .into_iter()
            .map(|f| f.path)
            .filter(|path| self.is_pending(path, options))
            .collect();
        let skipped = total - sources.len();
        (sources, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_jpeg(path: &Path) {
        RgbImage::from_pixel(300, 200, image::Rgb([10, 200, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.thumbnail.marker.clear();
        assert!(matches!(
            Thumbnailer::new(config),
            Err(ThumbnailerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_process_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_jpeg(&dir.path().join("green1.jpg"));
        write_jpeg(&dir.path().join("stained_green.jpg"));

        let thumbnailer = Thumbnailer::new(Config::default()).unwrap();
        let summary = thumbnailer
            .process(dir.path(), &ProcessOptions::default(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.submitted, 2);
        assert!(summary.is_complete());
        assert!(dir.path().join("green1_thumb.jpg").exists());
        assert!(dir.path().join("stained_green_thumb.jpg").exists());

        // A second pass does not pick up the thumbnails as new sources.
        let again = thumbnailer
            .process(dir.path(), &ProcessOptions::default(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(again.submitted, 2);
        assert!(!dir.path().join("green1_thumb_thumb.jpg").exists());
    }

    #[tokio::test]
    async fn test_skip_existing() {
        let dir = tempfile::tempdir().unwrap();
        write_jpeg(&dir.path().join("a.jpg"));
        write_jpeg(&dir.path().join("b.jpg"));
        std::fs::write(dir.path().join("a_thumb.jpg"), b"keep me").unwrap();

        let thumbnailer = Thumbnailer::new(Config::default()).unwrap();
        let options = ProcessOptions {
            skip_existing: true,
        };
        let files = thumbnailer.discover(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(thumbnailer.count_pending(&files, &options), 1);
        assert_eq!(
            thumbnailer.count_pending(&files, &ProcessOptions::default()),
            2
        );

        let summary = thumbnailer
            .process(dir.path(), &options, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.submitted, 1);
        assert_eq!(summary.written, vec![dir.path().join("b_thumb.jpg")]);
        assert_eq!(
            std::fs::read(dir.path().join("a_thumb.jpg")).unwrap(),
            b"keep me"
        );
    }

    #[tokio::test]
    async fn test_process_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let thumbnailer = Thumbnailer::new(Config::default()).unwrap();

        let err = thumbnailer
            .process(
                &dir.path().join("pictures"),
                &ProcessOptions::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ThumbnailerError::Pipeline(PipelineError::Enumeration { .. })
        ));
    }
}
