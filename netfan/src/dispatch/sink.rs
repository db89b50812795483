//! Append-only outcome log shared by all workers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use crate::error::OperationError;

/// Recorded result of one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation completed.
    Success {
        /// Submission order of the item within its run.
        seq: usize,
        /// Target identity.
        target: String,
    },

    /// The operation returned an error, timed out, panicked or was cancelled.
    Failure {
        /// Submission order of the item within its run.
        seq: usize,
        /// Target identity.
        target: String,
        /// Cause.
        error: OperationError,
    },
}

impl Outcome {
    /// Target this outcome belongs to.
    pub fn target(&self) -> &str {
        match self {
            Outcome::Success { target, .. } | Outcome::Failure { target, .. } => target,
        }
    }

    /// Submission sequence number.
    pub fn seq(&self) -> usize {
        match self {
            Outcome::Success { seq, .. } | Outcome::Failure { seq, .. } => *seq,
        }
    }

    /// Whether this is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

#[derive(Debug, Default)]
struct SinkState {
    outcomes: Vec<Outcome>,
    sealed: bool,
}

/// Thread-safe collector of [`Outcome`]s.
///
/// Clones share the same log. Order of entries follows completion, not
/// submission.
#[derive(Debug, Clone, Default)]
pub struct ResultSink {
    inner: Arc<Mutex<SinkState>>,
}

impl ResultSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an outcome.
    pub fn record(&self, outcome: Outcome) {
        let mut state = self.lock();
        if state.sealed {
            warn!(
                "outcome for {} recorded after snapshot, dropping",
                outcome.target()
            );
            return;
        }
        state.outcomes.push(outcome);
    }

    /// Read every recorded outcome and seal the log.
    ///
    /// Only meaningful once the pool has drained.
    pub fn snapshot(&self) -> Vec<Outcome> {
        let mut state = self.lock();
        state.sealed = true;
        state.outcomes.clone()
    }

    /// Number of outcomes recorded so far.
    pub fn len(&self) -> usize {
        self.lock().outcomes.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let sink = ResultSink::new();
        sink.record(Outcome::Success {
            seq: 0,
            target: "a".into(),
        });
        sink.record(Outcome::Failure {
            seq: 1,
            target: "b".into(),
            error: OperationError::failed("config rejected"),
        });

        let outcomes = sink.snapshot();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[1].target(), "b");
        assert_eq!(outcomes[1].seq(), 1);
    }

    #[test]
    fn test_record_after_snapshot_is_dropped() {
        let sink = ResultSink::new();
        let _ = sink.snapshot();
        sink.record(Outcome::Success {
            seq: 0,
            target: "late".into(),
        });
        assert!(sink.is_empty());
    }

    #[test]
    fn test_clones_share_log() {
        let sink = ResultSink::new();
        let writer = sink.clone();
        std::thread::scope(|s| {
            for i in 0..8 {
                let writer = writer.clone();
                s.spawn(move || {
                    writer.record(Outcome::Success {
                        seq: i,
                        target: format!("h{i}"),
                    })
                });
            }
        });
        assert_eq!(sink.len(), 8);
    }
}
