//! # Batch Orchestrator
//!
//! Runs a [`RowTask`] over a list of rows, one row at a time, isolating
//! per-row failures and reporting progress after every row.
//!
//! ## Sessions
//!
//! Only one batch runs at a time. [`BatchOrchestrator::begin`] claims the
//! orchestrator and returns a [`BatchSession`]; a second `begin` while the
//! session is alive fails with [`GenerationError::BatchInProgress`]. A
//! multi-pass job runs all its passes through one session so they share a
//! job id and cannot be interleaved with another job.
//!
//! ## Cancellation
//!
//! The session's `CancellationToken` is checked before each row. Rows not
//! started when cancellation is observed are returned in
//! [`BatchResult::skipped_rows`]; the row in flight always finishes.
//!
//! ## Exclusive claims
//!
//! Callers that swap out the data a batch works on (a sheet reload, a sign
//! out) take the same busy flag through [`BatchOrchestrator::claim`] or
//! [`BatchOrchestrator::claim_when_idle`], so no batch can start or still be
//! writing while they run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use core_runtime::events::{percent_complete, BatchEvent, CoreEvent, EventBus, TableEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{GenerationError, Result};

/// What a task did to its row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Column indices written
    Updated(Vec<usize>),
    /// Nothing to do for this row (e.g. empty word)
    Unchanged,
}

/// Work applied to a single row.
#[async_trait]
pub trait RowTask: Send + Sync {
    async fn run(&self, row: usize) -> Result<RowOutcome>;
}

/// Receives batch lifecycle callbacks. Every method defaults to a no-op.
pub trait ProgressObserver: Send + Sync {
    fn on_started(&self, _job_id: &str, _phase: &str, _total: usize) {}

    fn on_progress(&self, _job_id: &str, _completed: usize, _total: usize, _phase: &str) {}

    /// Cells of `row` were written; called by tasks right after write-back.
    fn on_cells_updated(&self, _row: usize, _columns: &[usize]) {}

    fn on_finished(&self, _job_id: &str, _phase: &str, _result: &BatchResult) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {}

/// Publishes batch and table events on the [`EventBus`].
#[derive(Clone)]
pub struct EventBusProgress {
    bus: EventBus,
}

impl EventBusProgress {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    fn emit(&self, event: CoreEvent) {
        // No subscribers is fine
        self.bus.emit(event).ok();
    }
}

impl ProgressObserver for EventBusProgress {
    fn on_started(&self, job_id: &str, phase: &str, total: usize) {
        self.emit(CoreEvent::Batch(BatchEvent::Started {
            job_id: job_id.to_string(),
            phase: phase.to_string(),
            total,
        }));
    }

    fn on_progress(&self, job_id: &str, completed: usize, total: usize, phase: &str) {
        self.emit(CoreEvent::Batch(BatchEvent::Progress {
            job_id: job_id.to_string(),
            completed,
            total,
            percent: percent_complete(completed, total),
            phase: phase.to_string(),
        }));
    }

    fn on_cells_updated(&self, row: usize, columns: &[usize]) {
        self.emit(CoreEvent::Table(TableEvent::CellsUpdated {
            row,
            columns: columns.to_vec(),
        }));
    }

    fn on_finished(&self, job_id: &str, phase: &str, result: &BatchResult) {
        let event = if result.cancelled {
            BatchEvent::Cancelled {
                job_id: job_id.to_string(),
                phase: phase.to_string(),
                completed: result.processed_count(),
                skipped: result.skipped_rows.len(),
            }
        } else {
            BatchEvent::Completed {
                job_id: job_id.to_string(),
                phase: phase.to_string(),
                succeeded: result.succeeded_count,
                failed: result.failed_rows.len(),
            }
        };
        self.emit(CoreEvent::Batch(event));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRow {
    pub row: usize,
    pub error: GenerationError,
}

/// Outcome of one pass.
///
/// `succeeded_count + failed_rows.len() + skipped_rows.len()` equals the
/// number of rows the pass was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded_count: usize,
    pub failed_rows: Vec<FailedRow>,
    pub skipped_rows: Vec<usize>,
    pub cancelled: bool,
}

impl BatchResult {
    pub fn processed_count(&self) -> usize {
        self.succeeded_count + self.failed_rows.len()
    }

    pub fn total(&self) -> usize {
        self.processed_count() + self.skipped_rows.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed_rows.is_empty() && !self.cancelled
    }
}

/// Holds the busy flag; dropping it frees the orchestrator and wakes
/// anyone in [`BatchOrchestrator::claim_when_idle`].
pub struct BusyGuard {
    busy: Arc<AtomicBool>,
    idle: Arc<Notify>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        self.idle.notify_waiters();
    }
}

#[derive(Clone)]
pub struct BatchOrchestrator {
    busy: Arc<AtomicBool>,
    idle: Arc<Notify>,
    observer: Arc<dyn ProgressObserver>,
}

impl BatchOrchestrator {
    pub fn new(observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            idle: Arc::new(Notify::new()),
            observer,
        }
    }

    pub fn observer(&self) -> Arc<dyn ProgressObserver> {
        Arc::clone(&self.observer)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the orchestrator for a job.
    pub fn begin(&self, cancellation_token: CancellationToken) -> Result<BatchSession> {
        let guard = self.acquire()?;
        let job_id = Uuid::new_v4().to_string();
        debug!(job_id = %job_id, "Batch session started");
        Ok(BatchSession {
            job_id,
            cancellation_token,
            observer: Arc::clone(&self.observer),
            _guard: guard,
        })
    }

    /// Single-pass convenience over [`begin`](Self::begin).
    pub async fn run_batch(
        &self,
        rows: &[usize],
        task: &dyn RowTask,
        phase: &str,
        cancellation_token: CancellationToken,
    ) -> Result<BatchResult> {
        let session = self.begin(cancellation_token)?;
        Ok(session.run_pass(rows, task, phase).await)
    }

    /// Run `task` on one row under the busy flag, propagating its error.
    pub async fn run_single(&self, row: usize, task: &dyn RowTask) -> Result<RowOutcome> {
        let _guard = self.acquire()?;
        task.run(row).await
    }

    /// Take the busy flag without running anything.
    ///
    /// # Errors
    ///
    /// [`GenerationError::BatchInProgress`] while a batch or single-row action
    /// holds it.
    pub fn claim(&self) -> Result<BusyGuard> {
        self.acquire()
    }

    /// Wait for the running session, if any, to end, then take the busy flag.
    pub async fn claim_when_idle(&self) -> BusyGuard {
        loop {
            let released = self.idle.notified();
            tokio::pin!(released);
            // Register before checking so a release in between is not missed.
            released.as_mut().enable();
            if let Ok(guard) = self.acquire() {
                return guard;
            }
            released.await;
        }
    }

    fn acquire(&self) -> Result<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GenerationError::BatchInProgress)?;
        Ok(BusyGuard {
            busy: Arc::clone(&self.busy),
            idle: Arc::clone(&self.idle),
        })
    }
}

/// An active claim on the orchestrator. Dropping it frees the orchestrator.
pub struct BatchSession {
    job_id: String,
    cancellation_token: CancellationToken,
    observer: Arc<dyn ProgressObserver>,
    _guard: BusyGuard,
}

impl BatchSession {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Run `task` over `rows` in order.
    ///
    /// Row failures are recorded and the pass continues; the pass itself
    /// never fails.
    pub async fn run_pass(&self, rows: &[usize], task: &dyn RowTask, phase: &str) -> BatchResult {
        let total = rows.len();
        let mut result = BatchResult::default();

        info!(job_id = %self.job_id, phase, total, "Starting batch pass");
        self.observer.on_started(&self.job_id, phase, total);

        for (position, &row) in rows.iter().enumerate() {
            if self.cancellation_token.is_cancelled() {
                info!(job_id = %self.job_id, phase, "Batch cancelled");
                result.skipped_rows = rows[position..].to_vec();
                result.cancelled = true;
                break;
            }

            match task.run(row).await {
                Ok(outcome) => {
                    debug!(row, ?outcome, "Row done");
                    result.succeeded_count += 1;
                }
                Err(error) => {
                    warn!(row, error = %error, phase, "Row failed");
                    result.failed_rows.push(FailedRow { row, error });
                }
            }

            self.observer
                .on_progress(&self.job_id, position + 1, total, phase);
        }

        info!(
            job_id = %self.job_id,
            phase,
            succeeded = result.succeeded_count,
            failed = result.failed_rows.len(),
            skipped = result.skipped_rows.len(),
            "Batch pass finished"
        );
        self.observer.on_finished(&self.job_id, phase, &result);
        result
    }
}
