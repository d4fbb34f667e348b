//! Resize stage: shrink decoded images into the thumbnail bounds.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::ThumbnailConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::Stage;

use super::channel::{self, SharedReceiver};
use super::failure::StageContext;
use super::item::WorkItem;

/// Generates thumbnails from images.
pub struct ThumbnailGenerator {
    max_width: u32,
    max_height: u32,
    filter: FilterType,
}

impl ThumbnailGenerator {
    /// Create a new thumbnail generator with the given configuration.
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            filter: config.filter.into(),
        }
    }

    /// Bounding box `(width, height)` thumbnails are fitted into.
    pub fn bounds(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    /// Fit `image` inside the bounding box, keeping its aspect ratio.
    ///
    /// Images that already fit are returned unchanged; nothing is upscaled.
    pub fn resize(&self, image: DynamicImage) -> Result<DynamicImage, String> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(format!("cannot resize a {width}x{height} image"));
        }
        if width <= self.max_width && height <= self.max_height {
            return Ok(image);
        }
        Ok(image.resize(self.max_width, self.max_height, self.filter))
    }

    /// Replace the raster of `item` with its thumbnail.
    pub fn resize_item(&self, item: WorkItem) -> PipelineResult<WorkItem> {
        item
            .try_replace_image(|image| self.resize(image))
            .map_err(|(path, message)| PipelineError::Resample { path, message })
    }
}

/// Run the resize stage until its input closes or the run stops.
///
/// Resizing happens on the blocking pool. The output channel closes when this
/// function returns.
pub(crate) async fn run_stage(
    generator: Arc<ThumbnailGenerator>,
    input: mpsc::Receiver<WorkItem>,
    output: mpsc::Sender<WorkItem>,
    workers: usize,
    ctx: StageContext,
) {
    let (max_width, max_height) = generator.bounds();
    tracing::debug!(
        "Resize stage starting: {} worker(s), bounds {}x{}",
        workers.max(1),
        max_width,
        max_height
    );

    let input = Arc::new(SharedReceiver::new(input));
    let mut set = JoinSet::new();
    for _ in 0..workers.max(1) {
        let generator = generator.clone();
        let input = input.clone();
        let output = output.clone();
        let ctx = ctx.clone();
        set.spawn(async move { resize_worker(generator, &input, &output, &ctx).await });
    }
    drop(output);

    ctx.join_workers(Stage::Resize, set).await;
    tracing::debug!("Resize stage finished");
}

async fn resize_worker(
    generator: Arc<ThumbnailGenerator>,
    input: &SharedReceiver<WorkItem>,
    output: &mpsc::Sender<WorkItem>,
    ctx: &StageContext,
) {
    while let Some(item) = input.recv(&ctx.cancel).await {
        let source = item.source().to_path_buf();
        let start = std::time::Instant::now();
        let generator = generator.clone();
        let resized = tokio::task::spawn_blocking(move || generator.resize_item(item))
            .await
            .unwrap_or_else(|e| {
                Err(PipelineError::Resample {
                    path: source.clone(),
                    message: format!("Task join error: {e}"),
                })
            });

        match resized {
            Ok(item) => {
                tracing::trace!("  Resize {:?}: {:?}", source, start.elapsed());
                if !channel::forward(output, item, &ctx.cancel).await {
                    break;
                }
            }
            Err(e) => {
                if ctx.fail(Stage::Resize, &source, e).is_break() {
                    break;
                }
            }
        }
    }
}
