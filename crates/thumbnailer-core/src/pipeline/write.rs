//! Write stage: encode thumbnails and persist them next to their sources.

use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};

use crate::config::ThumbnailConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::Stage;

use super::channel;
use super::failure::{ProgressEvent, StageContext};
use super::item::WorkItem;
use super::naming;

/// Fired once by the write stage when it stops taking items.
#[derive(Debug, Default)]
pub struct Completion {
    /// Thumbnails written, in write order
    pub written: Vec<PathBuf>,
}

/// Encodes thumbnails and writes them to disk.
pub struct ThumbnailWriter {
    marker: String,
}

impl ThumbnailWriter {
    /// Create a writer that names outputs with the configured marker.
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            marker: config.marker.clone(),
        }
    }

    /// Where the thumbnail for `source` is written.
    pub fn target_for(&self, source: &Path) -> PathBuf {
        naming::thumbnail_path(source, &self.marker)
    }

    /// Encode `item` and write it to its derived path, replacing any existing
    /// file there. Returns the path written.
    pub async fn write(&self, item: WorkItem) -> PipelineResult<PathBuf> {
        let (source, image, source_format) = item.into_parts();
        let target = self.target_for(&source);
        let format = ImageFormat::from_path(&target).unwrap_or(source_format);

        // Encode before touching the target so a failed encode leaves any
        // existing file intact.
        let bytes = tokio::task::spawn_blocking(move || Self::encode(&image, format))
            .await
            .map_err(|e| PipelineError::Encode {
                path: target.clone(),
                message: format!("Task join error: {e}"),
            })?
            .map_err(|e| PipelineError::Encode {
                path: target.clone(),
                message: e.to_string(),
            })?;

        let mut file =
            tokio::fs::File::create(&target)
                .await
                .map_err(|e| PipelineError::TargetCreate {
                    path: target.clone(),
                    message: e.to_string(),
                })?;
        let persisted = async {
            file.write_all(&bytes).await?;
            file.flush().await
        }
        .await;
        persisted.map_err(|e| PipelineError::Encode {
            path: target.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!("Wrote {:?} ({} bytes)", target, bytes.len());
        Ok(target)
    }

    /// Encode `image` as `format` with the encoder's default settings.
    pub fn encode(image: &DynamicImage, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        match Self::convert_for(image, format) {
            Some(converted) => converted.write_to(&mut buffer, format)?,
            None => image.write_to(&mut buffer, format)?,
        }
        Ok(buffer.into_inner())
    }

    /// Colour conversion some encoders need, or `None` if `image` can be
    /// encoded as is.
    fn convert_for(image: &DynamicImage, format: ImageFormat) -> Option<DynamicImage> {
        let color = image.color();
        match format {
            ImageFormat::Jpeg => match color {
                ColorType::L8 | ColorType::Rgb8 => None,
                _ => Some(DynamicImage::ImageRgb8(image.to_rgb8())),
            },
            ImageFormat::WebP | ImageFormat::Gif | ImageFormat::Ico => match color {
                ColorType::Rgba8 => None,
                ColorType::Rgb8 if format == ImageFormat::WebP => None,
                _ => Some(DynamicImage::ImageRgba8(image.to_rgba8())),
            },
            ImageFormat::Bmp | ImageFormat::Tga => match color {
                ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => None,
                _ if color.has_alpha() => Some(DynamicImage::ImageRgba8(image.to_rgba8())),
                _ => Some(DynamicImage::ImageRgb8(image.to_rgb8())),
            },
            _ => None,
        }
    }
}

/// Run the write stage until its input closes or the run stops, then fire
/// `done` exactly once.
pub(crate) async fn run_stage(
    writer: Arc<ThumbnailWriter>,
    mut input: mpsc::Receiver<WorkItem>,
    done: oneshot::Sender<Completion>,
    ctx: StageContext,
) {
    let mut completion = Completion::default();

    while let Some(item) = channel::recv_or_cancel(&mut input, &ctx.cancel).await {
        let source = item.source().to_path_buf();
        let start = std::time::Instant::now();
        match writer.write(item).await {
            Ok(target) => {
                tracing::trace!("  Write {:?}: {:?}", target, start.elapsed());
                ctx.emit(&ProgressEvent::Written {
                    source,
                    target: target.clone(),
                });
                completion.written.push(target);
            }
            Err(e) => {
                if ctx.fail(Stage::Write, &source, e).is_break() {
                    break;
                }
            }
        }
    }
    drop(input);

    tracing::debug!(
        "Write stage finished ({} written)",
        completion.written.len()
    );
    // The coordinator may have stopped listening; nothing else to do then.
    let _ = done.send(completion);
}
