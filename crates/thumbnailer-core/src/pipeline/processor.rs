//! Pipeline orchestration - wires the decode, resize and write stages together.
//!
//! ```text
//! sources ─► decode ─► [decoded] ─► resize ─► [resized] ─► write ─► completion
//! ```
//!
//! Each stage is its own tokio task. A stage ends when its input is exhausted
//! and closes its output by dropping its senders, so shutdown flows downstream.
//! The first fatal error cancels the run token, which every stage watches.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::types::{RunSummary, Stage};

use super::channel::bounded_channel;
use super::decode::{self, ImageDecoder};
use super::failure::{FailureLog, ProgressFn, StageContext};
use super::thumbnail::{self, ThumbnailGenerator};
use super::write::{self, ThumbnailWriter};

/// The three-stage thumbnail pipeline.
pub struct ThumbnailPipeline {
    decoder: Arc<ImageDecoder>,
    generator: Arc<ThumbnailGenerator>,
    writer: Arc<ThumbnailWriter>,
    config: PipelineConfig,
    progress: Option<ProgressFn>,
}

impl ThumbnailPipeline {
    /// Create a pipeline from the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: Arc::new(ImageDecoder::new(config.limits.clone())),
            generator: Arc::new(ThumbnailGenerator::new(&config.thumbnail)),
            writer: Arc::new(ThumbnailWriter::new(&config.thumbnail)),
            config: config.pipeline.clone(),
            progress: None,
        }
    }

    /// Report progress events to `progress` during runs.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The writer used by the final stage.
    pub fn writer(&self) -> &ThumbnailWriter {
        &self.writer
    }

    /// Run the pipeline over `sources` to completion.
    pub async fn run(&self, sources: Vec<PathBuf>) -> PipelineResult<RunSummary> {
        self.run_until_cancelled(sources, CancellationToken::new())
            .await
    }

    /// Run the pipeline over `sources`, stopping early if `cancel` fires.
    ///
    /// Returns the first fatal error, `Cancelled` if `cancel` stopped the run,
    /// or a summary once the write stage has drained its input. Thumbnails
    /// written before a failure stay on disk.
    pub async fn run_until_cancelled(
        &self,
        sources: Vec<PathBuf>,
        cancel: CancellationToken,
    ) -> PipelineResult<RunSummary> {
        let start = Instant::now();
        let submitted = sources.len();
        tracing::info!(
            "Starting pipeline: {} source(s), policy {:?}",
            submitted,
            self.config.failure_policy
        );

        let run_token = cancel.child_token();
        let failures = Arc::new(FailureLog::new(
            self.config.failure_policy,
            run_token.clone(),
        ));
        let ctx = StageContext::new(run_token.clone(), failures.clone(), self.progress.clone());

        let (decoded_tx, decoded_rx) = bounded_channel(&self.config);
        let (resized_tx, resized_rx) = bounded_channel(&self.config);
        let (done_tx, done_rx) = oneshot::channel();

        let stages = [
            (
                Stage::Decode,
                tokio::spawn(decode::run_stage(
                    self.decoder.clone(),
                    sources,
                    decoded_tx,
                    self.config.decode_workers,
                    ctx.clone(),
                )),
            ),
            (
                Stage::Resize,
                tokio::spawn(thumbnail::run_stage(
                    self.generator.clone(),
                    decoded_rx,
                    resized_tx,
                    self.config.resize_workers,
                    ctx.clone(),
                )),
            ),
            (
                Stage::Write,
                tokio::spawn(write::run_stage(
                    self.writer.clone(),
                    resized_rx,
                    done_tx,
                    ctx,
                )),
            ),
        ];

        let completion = done_rx.await;

        // Upstream stages have either finished or been cancelled by now; join
        // them so a panic cannot go unnoticed.
        for (stage, handle) in stages {
            if let Err(e) = handle.await {
                failures.record_fatal(PipelineError::StageFailed {
                    stage,
                    message: format!("task failed: {e}"),
                });
            }
        }

        let completion = match completion {
            Ok(completion) => completion,
            Err(_) => {
                failures.record_fatal(PipelineError::StageFailed {
                    stage: Stage::Write,
                    message: "completion signal dropped".to_string(),
                });
                write::Completion::default()
            }
        };

        if let Some(err) = failures.take_fatal() {
            tracing::error!(
                "Pipeline failed after writing {} thumbnail(s)",
                completion.written.len()
            );
            return Err(err);
        }
        if run_token.is_cancelled() {
            tracing::warn!(
                "Pipeline cancelled after writing {} thumbnail(s)",
                completion.written.len()
            );
            return Err(PipelineError::Cancelled);
        }

        let summary = RunSummary {
            submitted,
            written: completion.written,
            failed: failures.take_skipped(),
            skipped: 0,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Pipeline finished: {} written, {} failed in {}ms",
            summary.succeeded(),
            summary.failed.len(),
            summary.elapsed_ms
        );
        Ok(summary)
    }
}
