//! Bounded-concurrency task dispatcher.
//!
//! The pieces compose bottom-up:
//!
//! - [`TaskQueue`] holds pending items and tracks in-flight work so that a
//!   drain can be awaited without racing workers.
//! - [`WorkerPool`] runs a fixed number of workers that apply an
//!   [`Operation`] to each item and record an [`Outcome`].
//! - [`ResultSink`] collects outcomes from all workers.
//!
//! Most callers go through [`RunCoordinator`](crate::coordinator::RunCoordinator)
//! instead of wiring these by hand.

mod operation;
mod pool;
mod queue;
mod sink;

pub use operation::{Operation, WorkItem};
pub use pool::{Queued, WorkerPool};
pub use queue::TaskQueue;
pub use sink::{Outcome, ResultSink};
