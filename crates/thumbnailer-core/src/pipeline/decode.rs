//! Decode stage: read source files and decode them into rasters.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::Stage;

use super::channel;
use super::failure::StageContext;
use super::item::WorkItem;

/// Image decoder with configurable limits and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Original file size in bytes
    pub file_size: u64,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and decode the image at `path`.
    ///
    /// The size limit is checked against file metadata before any bytes are
    /// read. The file is then read in one call, so its handle is released
    /// before decoding starts whether or not the decode succeeds.
    pub async fn decode_file(&self, path: &Path) -> PipelineResult<DecodedImage> {
        let source_open = |e: std::io::Error| PipelineError::SourceOpen {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let size = tokio::fs::metadata(path).await.map_err(source_open)?.len();
        self.check_file_size(path, size)?;

        let bytes = tokio::fs::read(path).await.map_err(source_open)?;
        // The file may have grown between the stat and the read.
        self.check_file_size(path, bytes.len() as u64)?;

        self.decode_from_bytes(bytes, path).await
    }

    fn check_file_size(&self, path: &Path, size: u64) -> PipelineResult<()> {
        let max_bytes = self
            .limits
            .max_file_size_mb
            .saturating_mul(1024 * 1024);
        if size > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: size / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }

    /// Decode an image from an in-memory byte buffer with validation and timeout.
    pub async fn decode_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
    ) -> PipelineResult<DecodedImage> {
        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || Self::decode_bytes_sync(bytes, &path_owned)).await
        })
        .await;

        match decode_result {
            Ok(Ok(Ok(decoded))) => {
                if decoded.width > self.limits.max_image_dimension
                    || decoded.height > self.limits.max_image_dimension
                {
                    return Err(PipelineError::ImageTooLarge {
                        path: path.to_path_buf(),
                        width: decoded.width,
                        height: decoded.height,
                        max_dim: self.limits.max_image_dimension,
                    });
                }
                Ok(decoded)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: Stage::Decode,
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    fn decode_bytes_sync(bytes: Vec<u8>, path: &Path) -> PipelineResult<DecodedImage> {
        use std::io::Cursor;

        let file_size = bytes.len() as u64;
        let cursor = Cursor::new(bytes);
        let mut reader = image::ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        // Content sniffing wins; the extension is only a fallback.
        let format = match reader.format() {
            Some(f) => f,
            None => {
                let f = ImageFormat::from_path(path).map_err(|_| {
                    PipelineError::UnsupportedFormat {
                        path: path.to_path_buf(),
                        format: path
                            .extension()
                            .and_then(|e| e.to_str())
                            .unwrap_or("unknown")
                            .to_string(),
                    }
                })?;
                reader.set_format(f);
                f
            }
        };
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size,
        })
    }
}

/// Sources waiting to be decoded, handed out in order.
struct SourceQueue {
    remaining: Mutex<std::vec::IntoIter<PathBuf>>,
}

impl SourceQueue {
    fn new(sources: Vec<PathBuf>) -> Self {
        Self {
            remaining: Mutex::new(sources.into_iter()),
        }
    }

    fn next(&self) -> Option<PathBuf> {
        self.remaining
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .next()
    }
}

/// Run the decode stage until `sources` is exhausted or the run stops.
///
/// With one worker, items leave in the order of `sources`. The output channel
/// closes when this function returns.
pub(crate) async fn run_stage(
    decoder: Arc<ImageDecoder>,
    sources: Vec<PathBuf>,
    output: mpsc::Sender<WorkItem>,
    workers: usize,
    ctx: StageContext,
) {
    let queue = Arc::new(SourceQueue::new(sources));
    let mut set = JoinSet::new();
    for worker in 0..workers.max(1) {
        let decoder = decoder.clone();
        let queue = queue.clone();
        let output = output.clone();
        let ctx = ctx.clone();
        set.spawn(async move { decode_worker(worker, &decoder, &queue, &output, &ctx).await });
    }
    drop(output);

    ctx.join_workers(Stage::Decode, set).await;
    tracing::debug!("Decode stage finished");
}

async fn decode_worker(
    worker: usize,
    decoder: &ImageDecoder,
    queue: &SourceQueue,
    output: &mpsc::Sender<WorkItem>,
    ctx: &StageContext,
) {
    while let Some(path) = queue.next() {
        let start = std::time::Instant::now();
        let decoded = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            decoded = decoder.decode_file(&path) => decoded,
        };

        match decoded {
            Ok(decoded) => {
                tracing::trace!(
                    worker,
                    "  Decode {:?}: {}x{} in {:?}",
                    path,
                    decoded.width,
                    decoded.height,
                    start.elapsed()
                );
                let item = WorkItem::new(path, decoded.image, decoded.format);
                if !channel::forward(output, item, &ctx.cancel).await {
                    break;
                }
            }
            Err(e) => {
                if ctx.fail(Stage::Decode, &path, e).is_break() {
                    break;
                }
            }
        }
    }
}
