// src/batch.rs
//
// Batch Runner: drives the conversion pipeline over a working set.
//
// The default mode is strictly sequential. Items run in index order, progress
// is monotonic, and the first failing item aborts the rest of the batch.
// `convert_all_parallel` is the opt-in alternative: disjoint items run on the
// shared rayon pool and every outcome is collected (partial success).

use crate::engine::{install_in_pool, ConvertTask, ConvertedImage, Limits, OutputNamer, SourceImage};
use crate::error::{ConvertError, Result};
use crate::ops::ConversionRequest;
use crate::workset::{AddOutcome, WorkingSet};
use rayon::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where the runner is in its lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running { completed: usize, total: usize },
    Completed,
    Failed,
    Cancelled,
}

impl BatchState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Ready"),
            Self::Running { completed, total } => write!(f, "Converting... {completed} of {total}"),
            Self::Completed => f.write_str("Images converted successfully!"),
            Self::Failed => f.write_str("Error during conversion"),
            Self::Cancelled => f.write_str("Conversion cancelled"),
        }
    }
}

/// Progress snapshot handed to the caller after each item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Whole percent, rounded.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u8
    }
}

/// Cooperative cancellation flag, checked between items.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Totals for a successful sequential run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    pub converted: usize,
    pub original_bytes: u64,
    pub encoded_bytes: u64,
    pub elapsed: Duration,
}

/// Per-item result of a parallel run.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemOutcome {
    pub index: usize,
    pub source_name: String,
    pub error: Option<ConvertError>,
}

impl ItemOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Sequential batch driver.
///
/// `run` holds the working set mutably until it finishes, so the set cannot be
/// edited while a batch is in flight:
///
/// ```compile_fail
/// use image_batch::batch::BatchRunner;
/// use image_batch::ops::ConversionRequest;
/// use image_batch::workset::WorkingSet;
///
/// async fn remove_mid_run() {
///     let mut set = WorkingSet::new();
///     let mut runner = BatchRunner::new(ConversionRequest::default());
///     let run = runner.run(&mut set, |_| {});
///     set.remove(0).ok();
///     run.await.ok();
/// }
/// ```
#[derive(Debug)]
pub struct BatchRunner {
    request: ConversionRequest,
    limits: Limits,
    cancel: CancelToken,
    state: BatchState,
}

impl BatchRunner {
    pub fn new(request: ConversionRequest) -> Self {
        Self {
            request,
            limits: Limits::default(),
            cancel: CancelToken::new(),
            state: BatchState::Idle,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn request(&self) -> &ConversionRequest {
        &self.request
    }

    /// Takes effect on the next run; results already stored are kept.
    pub fn set_request(&mut self, request: ConversionRequest) {
        self.request = request;
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    /// A handle that stops the current run before its next item.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn reset(&mut self) {
        self.state = BatchState::Idle;
    }

    /// Add files to the set and put the status back to Ready.
    pub fn add_files(
        &mut self,
        set: &mut WorkingSet,
        files: impl IntoIterator<Item = SourceImage>,
    ) -> Result<AddOutcome> {
        let outcome = set.add(files)?;
        self.reset();
        Ok(outcome)
    }

    /// Remove one entry; status goes back to Ready once no results remain.
    pub fn remove_file(&mut self, set: &mut WorkingSet, index: usize) -> Result<SourceImage> {
        let removed = set.remove(index)?;
        if !set.has_converted() {
            self.reset();
        }
        Ok(removed)
    }

    /// Convert every entry in order, overwriting earlier results.
    ///
    /// A cancel requested before this call is cleared when the run starts.
    pub async fn run<F>(&mut self, set: &mut WorkingSet, mut on_progress: F) -> Result<BatchReport>
    where
        F: FnMut(Progress),
    {
        self.request.validate()?;
        if set.is_empty() {
            return Err(ConvertError::EmptyWorkingSet);
        }

        self.cancel.clear();
        let start = Instant::now();
        let total = set.len();
        let namer = OutputNamer::new();
        let mut report = BatchReport {
            converted: 0,
            original_bytes: 0,
            encoded_bytes: 0,
            elapsed: Duration::ZERO,
        };

        info!(total, format = self.request.format.as_str(), "batch started");
        self.state = BatchState::Running { completed: 0, total };
        on_progress(Progress { completed: 0, total });

        for index in 0..total {
            if self.cancel.is_cancelled() {
                warn!(completed = index, total, "batch cancelled");
                self.state = BatchState::Cancelled;
                return Err(ConvertError::cancelled(index, total));
            }

            let Some(source) = set.source(index).cloned() else {
                self.state = BatchState::Failed;
                return Err(ConvertError::index_out_of_range(index, set.len()));
            };
            let output_name = namer.name_for(&source, index, &self.request);
            let task = ConvertTask::new(source, self.request.clone(), output_name)
                .with_limits(self.limits.clone());

            match task.run().await {
                Ok(converted) => {
                    report.converted += 1;
                    report.original_bytes += converted.original_size();
                    report.encoded_bytes += converted.encoded_size();
                    debug!(index, name = converted.name(), bytes = converted.encoded_size(), "item done");
                    set.set_converted(index, Some(converted));

                    let completed = index + 1;
                    self.state = BatchState::Running { completed, total };
                    on_progress(Progress { completed, total });
                }
                Err(err) => {
                    warn!(index, error = %err, "batch aborted");
                    set.set_converted(index, None);
                    self.state = BatchState::Failed;
                    return Err(err);
                }
            }
        }

        report.elapsed = start.elapsed();
        self.state = BatchState::Completed;
        info!(
            converted = report.converted,
            original_bytes = report.original_bytes,
            encoded_bytes = report.encoded_bytes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch completed"
        );
        Ok(report)
    }
}

/// Convert every entry on the shared thread pool.
///
/// Blocking. Every item is attempted; successes are stored, failed slots are
/// cleared, and one outcome per entry is returned in index order. The per-item
/// timeout does not apply here.
pub fn convert_all_parallel(
    set: &mut WorkingSet,
    request: &ConversionRequest,
    limits: &Limits,
) -> Result<Vec<ItemOutcome>> {
    request.validate()?;
    if set.is_empty() {
        return Err(ConvertError::EmptyWorkingSet);
    }

    let namer = OutputNamer::new();
    let tasks: Vec<ConvertTask> = set
        .slots()
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let name = namer.name_for(&slot.source, index, request);
            ConvertTask::new(slot.source.clone(), request.clone(), name).with_limits(limits.clone())
        })
        .collect();

    info!(total = tasks.len(), "parallel batch started");
    let results: Vec<Result<ConvertedImage>> =
        install_in_pool(|| tasks.par_iter().map(ConvertTask::process).collect());

    let mut outcomes = Vec::with_capacity(results.len());
    for (index, (task, result)) in tasks.iter().zip(results).enumerate() {
        let source_name = task.source.name().to_string();
        match result {
            Ok(converted) => {
                set.set_converted(index, Some(converted));
                outcomes.push(ItemOutcome {
                    index,
                    source_name,
                    error: None,
                });
            }
            Err(err) => {
                warn!(index, name = %source_name, error = %err, "item failed");
                set.set_converted(index, None);
                outcomes.push(ItemOutcome {
                    index,
                    source_name,
                    error: Some(err),
                });
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(total = outcomes.len(), failed, "parallel batch finished");
    Ok(outcomes)
}
