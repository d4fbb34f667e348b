//! Failure policy and the context shared by all stages of one run.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::FailurePolicy;
use crate::error::PipelineError;
use crate::types::{ItemFailure, Stage};

/// Progress notification emitted while a run is in flight.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A thumbnail was persisted
    Written { source: PathBuf, target: PathBuf },
    /// A source was skipped after an error (continue policy only)
    Failed { source: PathBuf, stage: Stage },
}

/// Callback receiving progress events. Called from stage tasks.
pub type ProgressFn = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Errors collected during one run.
///
/// Holds at most one fatal error: the first one wins, later ones are only
/// logged. Recording a fatal error cancels the run.
pub struct FailureLog {
    policy: FailurePolicy,
    cancel: CancellationToken,
    fatal: Mutex<Option<PipelineError>>,
    skipped: Mutex<Vec<ItemFailure>>,
}

impl FailureLog {
    pub fn new(policy: FailurePolicy, cancel: CancellationToken) -> Self {
        Self {
            policy,
            cancel,
            fatal: Mutex::new(None),
            skipped: Mutex::new(Vec::new()),
        }
    }

    /// Record an error that ends the run regardless of policy.
    pub fn record_fatal(&self, err: PipelineError) {
        let mut fatal = lock(&self.fatal);
        match fatal.as_ref() {
            None => {
                tracing::error!("{err}");
                *fatal = Some(err);
            }
            Some(first) => {
                tracing::debug!("Ignoring error after fatal failure ({first}): {err}");
            }
        }
        drop(fatal);
        self.cancel.cancel();
    }

    /// Take the fatal error, if any.
    pub fn take_fatal(&self) -> Option<PipelineError> {
        lock(&self.fatal).take()
    }

    /// Take the list of skipped items.
    pub fn take_skipped(&self) -> Vec<ItemFailure> {
        std::mem::take(&mut *lock(&self.skipped))
    }

    fn record_skipped(&self, failure: ItemFailure) {
        lock(&self.skipped).push(failure);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Everything a stage needs besides its channels.
#[derive(Clone)]
pub struct StageContext {
    pub cancel: CancellationToken,
    failures: Arc<FailureLog>,
    progress: Option<ProgressFn>,
}

impl StageContext {
    pub fn new(
        cancel: CancellationToken,
        failures: Arc<FailureLog>,
        progress: Option<ProgressFn>,
    ) -> Self {
        Self {
            cancel,
            failures,
            progress,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Apply the failure policy to an error on `source` in `stage`.
    ///
    /// `Break` means the calling stage must stop.
    pub fn fail(&self, stage: Stage, source: &Path, err: PipelineError) -> ControlFlow<()> {
        match self.failures.policy {
            FailurePolicy::FailFast => {
                self.failures.record_fatal(err);
                ControlFlow::Break(())
            }
            FailurePolicy::Continue => {
                tracing::warn!(%stage, source = ?source, "Skipping image: {err}");
                self.failures.record_skipped(ItemFailure {
                    source: source.to_path_buf(),
                    stage,
                    message: err.to_string(),
                });
                self.emit(&ProgressEvent::Failed {
                    source: source.to_path_buf(),
                    stage,
                });
                ControlFlow::Continue(())
            }
        }
    }

    /// Record an error that ends the run regardless of policy.
    pub fn fatal(&self, err: PipelineError) {
        self.failures.record_fatal(err);
    }

    pub fn emit(&self, event: &ProgressEvent) {
        if let Some(progress) = &self.progress {
            progress(event);
        }
    }

    /// Wait for all workers of `stage`; a panicked worker fails the run.
    pub async fn join_workers(&self, stage: Stage, mut workers: JoinSet<()>) {
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                self.fatal(PipelineError::StageFailed {
                    stage,
                    message: format!("worker task failed: {e}"),
                });
            }
        }
    }
}
