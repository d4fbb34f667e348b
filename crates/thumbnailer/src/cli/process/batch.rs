//! Batch run: progress bar, Ctrl-C cancellation, and the final summary.

use std::sync::Arc;
use std::time::Duration;

use thumbnailer_core::{
    DiscoveredFile, PipelineError, ProcessOptions, ProgressEvent, RunSummary, Thumbnailer,
    ThumbnailerError,
};
use tokio_util::sync::CancellationToken;

/// Run the pipeline over discovered files with progress and cancellation.
pub async fn run_batch(
    thumbnailer: Thumbnailer,
    files: Vec<DiscoveredFile>,
    options: &ProcessOptions,
    json: bool,
) -> anyhow::Result<()> {
    // Files left out by --skip-existing never reach the pipeline.
    let pending = thumbnailer.count_pending(&files, options);
    let progress = create_progress_bar(pending as u64);
    let thumbnailer = thumbnailer.with_progress(progress_callback(progress.clone()));

    let cancel = CancellationToken::new();
    let interrupt = spawn_interrupt_watcher(cancel.clone());

    let result = thumbnailer.process_files(files, options, cancel).await;
    interrupt.abort();
    progress.finish_and_clear();

    let summary = match result {
        Ok(summary) => summary,
        Err(ThumbnailerError::Pipeline(PipelineError::Cancelled)) => {
            anyhow::bail!("Interrupted: run cancelled before all thumbnails were written");
        }
        Err(ThumbnailerError::Pipeline(e)) => {
            let hint = match e.path() {
                Some(path) => format!("\n\n  Failing image: {:?}", path),
                None => String::new(),
            };
            anyhow::bail!(
                "{e}{hint}\n  Hint: Use --on-error continue to skip failing images."
            );
        }
        Err(e) => return Err(e.into()),
    };

    for failure in &summary.failed {
        tracing::warn!(
            "Skipped {:?} ({} stage): {}",
            failure.source,
            failure.stage,
            failure.message
        );
    }

    print_summary(&summary);
    if json {
        println!("{}", summary.to_json(true)?);
    }

    if !summary.failed.is_empty() {
        anyhow::bail!("{} image(s) could not be thumbnailed", summary.failed.len());
    }
    Ok(())
}

/// Advance the bar once per image leaving the pipeline, written or skipped.
fn progress_callback(progress: indicatif::ProgressBar) -> thumbnailer_core::ProgressFn {
    Arc::new(move |event: &ProgressEvent| {
        if let ProgressEvent::Written { target, .. } = event {
            if let Some(name) = target.file_name() {
                progress.set_message(name.to_string_lossy().into_owned());
            }
        }
        progress.inc(1);
    })
}

/// Cancel the run on the first Ctrl-C.
fn spawn_interrupt_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        tracing::warn!("Interrupt received, cancelling run");
                        cancel.cancel();
                    }
                    Err(e) => tracing::debug!("Cannot listen for Ctrl-C: {e}"),
                }
            }
            _ = cancel.cancelled() => {}
        }
    })
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the run.
fn print_summary(summary: &RunSummary) {
    let elapsed_secs = summary.elapsed_ms as f64 / 1000.0;
    let rate = if elapsed_secs > 0.0 {
        summary.succeeded() as f64 / elapsed_secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Written:      {:>8}", summary.succeeded());
    if !summary.failed.is_empty() {
        eprintln!("    Failed:       {:>8}", summary.failed.len());
    }
    if summary.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", summary.skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.submitted + summary.skipped);
    eprintln!("    Duration:     {:>7.1}s", elapsed_secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use thumbnailer_core::Stage;

    #[test]
    fn progress_callback_counts_every_event() {
        let pb = indicatif::ProgressBar::hidden();
        pb.set_length(2);
        let callback = progress_callback(pb.clone());

        callback(&ProgressEvent::Written {
            source: PathBuf::from("a.jpg"),
            target: PathBuf::from("a_thumb.jpg"),
        });
        callback(&ProgressEvent::Failed {
            source: PathBuf::from("b.jpg"),
            stage: Stage::Decode,
        });

        assert_eq!(pb.position(), 2);
        assert_eq!(pb.message(), "a_thumb.jpg");
    }

    #[tokio::test]
    async fn interrupt_watcher_exits_when_run_cancelled() {
        let cancel = CancellationToken::new();
        let watcher = spawn_interrupt_watcher(cancel.clone());
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), watcher)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn print_summary_handles_zero_elapsed() {
        let summary = RunSummary {
            submitted: 1,
            written: vec![PathBuf::from("a_thumb.jpg")],
            ..Default::default()
        };
        print_summary(&summary);
    }
}
