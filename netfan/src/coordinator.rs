//! Run orchestration: preflight, dispatch, drain, report.
//!
//! ```text
//! Idle ──preflight ok──▶ PreflightOk ──pool started──▶ Dispatching
//!   │                                                      │ all items enqueued
//!   └─preflight failed─▶ Aborted                           ▼
//!                                  Reported ◀──drained── Draining
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::{Credentials, RunConfig};
use crate::dispatch::{Operation, Outcome, Queued, ResultSink, TaskQueue, WorkItem, WorkerPool};
use crate::error::{OperationError, PreflightError, Result};
use crate::preflight::Preflight;

/// Where a coordinator is in its current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing started yet.
    Idle,
    /// Credentials accepted.
    PreflightOk,
    /// Workers running, items being enqueued.
    Dispatching,
    /// Everything enqueued; waiting for the queue to drain.
    Draining,
    /// Report produced.
    Reported,
    /// Preflight failed; nothing was dispatched.
    Aborted,
}

/// One failed target and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// Target identity.
    pub target: String,
    /// Cause.
    pub error: OperationError,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Items whose operation succeeded.
    pub success_count: usize,
    /// Items that failed, timed out, panicked or were cancelled.
    pub failure_count: usize,
    /// Failures in submission order.
    pub failures: Vec<FailureRecord>,
    /// Wall-clock time from preflight start to drain.
    pub elapsed: Duration,
}

impl RunReport {
    fn from_outcomes(mut outcomes: Vec<Outcome>, elapsed: Duration) -> Self {
        outcomes.sort_by_key(Outcome::seq);

        let mut success_count = 0;
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Success { .. } => success_count += 1,
                Outcome::Failure { target, error, .. } => failures.push(FailureRecord { target, error }),
            }
        }

        Self {
            success_count,
            failure_count: failures.len(),
            failures,
            elapsed,
        }
    }

    /// Total items that produced an outcome.
    pub fn processed(&self) -> usize {
        self.success_count + self.failure_count
    }

    /// No failures at all.
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "processed {} targets: {} succeeded, {} failed",
            self.processed(),
            self.success_count,
            self.failure_count
        )?;
        for failure in &self.failures {
            writeln!(f, "  {}, {}", failure.target, failure.error)?;
        }
        write!(f, "elapsed: {:.2} seconds", self.elapsed.as_secs_f64())
    }
}

/// Drives one [`Operation`] over a list of work items.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use netfan::config::{Credentials, RunConfig};
/// use netfan::coordinator::RunCoordinator;
/// use netfan::error::OperationError;
/// use netfan::preflight::NoPreflight;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> netfan::Result<()> {
/// let op = |host: String| async move {
///     if host == "b" {
///         Err(OperationError::failed("config rejected"))
///     } else {
///         Ok(())
///     }
/// };
///
/// let mut coordinator = RunCoordinator::new(
///     RunConfig::builder().pool_size(2).build()?,
///     Arc::new(Credentials::password("admin", "pw")),
///     NoPreflight,
///     op,
/// );
/// let report = coordinator.run(["a", "b", "c"].map(String::from)).await?;
/// assert_eq!(report.success_count, 2);
/// assert_eq!(report.failures[0].target, "b");
/// # Ok(())
/// # }
/// ```
pub struct RunCoordinator<O, P> {
    config: RunConfig,
    credentials: Arc<Credentials>,
    preflight: P,
    operation: Arc<O>,
    shutdown: CancellationToken,
    state: RunState,
}

impl<O, P: Preflight> RunCoordinator<O, P> {
    /// Create a coordinator. Nothing runs until [`run`](Self::run).
    pub fn new(config: RunConfig, credentials: Arc<Credentials>, preflight: P, operation: O) -> Self {
        Self {
            config,
            credentials,
            preflight,
            operation: Arc::new(operation),
            shutdown: CancellationToken::new(),
            state: RunState::Idle,
        }
    }

    /// Stop dispatching when `token` is cancelled.
    ///
    /// Items not yet started are reported as [`OperationError::Cancelled`];
    /// items in flight finish normally. A cancelled token stays cancelled, so
    /// later runs on the same coordinator cancel immediately.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// State of the current or most recent run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Configuration this coordinator runs with.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the operation over `items` and report.
    ///
    /// Fails with [`Error::Preflight`](crate::Error::Preflight) if the
    /// credentials are rejected, in which case the operation is never called.
    /// Per-item failures never fail the run; they are in the report.
    pub async fn run<T, I>(&mut self, items: I) -> Result<RunReport>
    where
        T: WorkItem,
        I: IntoIterator<Item = T>,
        O: Operation<T>,
    {
        let started = Instant::now();
        self.state = RunState::Idle;

        if let Err(e) = self.preflight().await {
            error!("preflight against {} failed: {}", self.config.probe, e);
            self.state = RunState::Aborted;
            return Err(e.into());
        }
        self.state = RunState::PreflightOk;

        let queue = Arc::new(TaskQueue::new());
        let sink = ResultSink::new();
        let token = self.shutdown.child_token();
        let pool = WorkerPool::start(
            self.config.pool_size,
            queue.clone(),
            self.operation.clone(),
            sink.clone(),
            self.config.operation_timeout,
            token.clone(),
        );
        self.state = RunState::Dispatching;

        let mut total = 0;
        for (seq, item) in items.into_iter().enumerate() {
            queue.enqueue(Queued { seq, item })?;
            total += 1;
        }
        info!("dispatched {} items to {} workers", total, pool.size());
        self.state = RunState::Draining;

        tokio::select! {
            _ = queue.await_drain() => {}
            _ = token.cancelled() => {
                let never_started = queue.take_pending();
                warn!(
                    "run cancelled: {} items not started, waiting for {} in flight",
                    never_started.len(),
                    queue.in_flight()
                );
                for Queued { seq, item } in never_started {
                    sink.record(Outcome::Failure {
                        seq,
                        target: item.target().to_string(),
                        error: OperationError::Cancelled,
                    });
                }
                queue.await_drain().await;
            }
        }

        pool.shutdown().await;

        let report = RunReport::from_outcomes(sink.snapshot(), started.elapsed());
        info!(
            "run finished: {} succeeded, {} failed in {:.2}s",
            report.success_count,
            report.failure_count,
            report.elapsed.as_secs_f64()
        );
        self.state = RunState::Reported;
        Ok(report)
    }

    async fn preflight(&self) -> std::result::Result<(), PreflightError> {
        if self.config.skip_preflight {
            info!("preflight skipped");
            return Ok(());
        }
        let bound = self.config.preflight_timeout;
        tokio::time::timeout(bound, self.preflight.validate(&self.credentials, &self.config.probe))
            .await
            .map_err(|_| PreflightError::Timeout(bound))?
    }
}
