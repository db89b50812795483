//! Fixed-size pool of workers draining a [`TaskQueue`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::join_all;
use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::operation::{Operation, WorkItem};
use super::queue::TaskQueue;
use super::sink::{Outcome, ResultSink};
use crate::error::OperationError;

/// A work item tagged with its submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queued<T> {
    /// Position in the run's input.
    pub seq: usize,
    /// The item itself.
    pub item: T,
}

/// Handle to a running set of workers.
///
/// Workers loop `dequeue -> operation -> record -> mark_done` until the queue
/// is closed and empty, or until the shutdown token fires. Call
/// [`shutdown`](Self::shutdown) to close the queue and join them.
pub struct WorkerPool<T> {
    queue: Arc<TaskQueue<Queued<T>>>,
    handles: Vec<JoinHandle<()>>,
}

impl<T: WorkItem> WorkerPool<T> {
    /// Spawn `size` workers on the current tokio runtime.
    ///
    /// Each operation call is bounded by `operation_timeout`.
    pub fn start<O: Operation<T>>(
        size: usize,
        queue: Arc<TaskQueue<Queued<T>>>,
        operation: Arc<O>,
        sink: ResultSink,
        operation_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        debug!("starting {} workers", size);

        let handles = (0..size)
            .map(|id| {
                let worker = Worker {
                    id,
                    queue: queue.clone(),
                    operation: operation.clone(),
                    sink: sink.clone(),
                    operation_timeout,
                    shutdown: shutdown.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        Self { queue, handles }
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Close the queue and wait for every worker to exit.
    pub async fn shutdown(self) {
        self.queue.close();
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                warn!("worker task ended abnormally: {}", e);
            }
        }
        debug!("worker pool stopped");
    }
}

struct Worker<T, O> {
    id: usize,
    queue: Arc<TaskQueue<Queued<T>>>,
    operation: Arc<O>,
    sink: ResultSink,
    operation_timeout: Duration,
    shutdown: CancellationToken,
}

impl<T: WorkItem, O: Operation<T>> Worker<T, O> {
    async fn run(self) {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!("worker {}: cancelled", self.id);
                    break;
                }
                next = self.queue.dequeue() => next,
            };

            let Some(Queued { seq, item }) = next else {
                break;
            };

            let target = item.target().to_string();
            info!("worker {}: working on \"{}\"", self.id, target);

            let outcome = match self.run_item(item).await {
                Ok(()) => Outcome::Success { seq, target },
                Err(error) => {
                    warn!("{}: {}", target, error);
                    Outcome::Failure { seq, target, error }
                }
            };

            self.sink.record(outcome);
            self.queue.mark_done();
        }
        debug!("worker {}: exiting", self.id);
    }

    /// Run the operation, converting timeouts and panics into errors.
    async fn run_item(&self, item: T) -> Result<(), OperationError> {
        let guarded = AssertUnwindSafe(self.operation.execute(item)).catch_unwind();
        match tokio::time::timeout(self.operation_timeout, guarded).await {
            Err(_) => Err(OperationError::Timeout(self.operation_timeout)),
            Ok(Err(panic)) => Err(OperationError::Panicked(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => result,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn queue_of(targets: &[&'static str]) -> Arc<TaskQueue<Queued<&'static str>>> {
        let queue = Arc::new(TaskQueue::new());
        for (seq, item) in targets.iter().copied().enumerate() {
            queue.enqueue(Queued { seq, item }).unwrap();
        }
        queue
    }

    #[tokio::test]
    async fn test_pool_processes_every_item() {
        let queue = queue_of(&["a", "b", "c", "d"]);
        let sink = ResultSink::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let op = {
            let calls = calls.clone();
            move |_t: &'static str| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, OperationError>(())
                }
            }
        };

        let pool = WorkerPool::start(
            2,
            queue.clone(),
            Arc::new(op),
            sink.clone(),
            Duration::from_secs(5),
            CancellationToken::new(),
        );
        assert_eq!(pool.size(), 2);
        queue.await_drain().await;
        pool.shutdown().await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(sink.snapshot().len(), 4);
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure() {
        let queue = queue_of(&["slow"]);
        let sink = ResultSink::new();
        let op = |_t: &'static str| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, OperationError>(())
        };

        let pool = WorkerPool::start(
            1,
            queue.clone(),
            Arc::new(op),
            sink.clone(),
            Duration::from_millis(20),
            CancellationToken::new(),
        );
        queue.await_drain().await;
        pool.shutdown().await;

        let outcomes = sink.snapshot();
        assert_eq!(
            outcomes,
            vec![Outcome::Failure {
                seq: 0,
                target: "slow".into(),
                error: OperationError::Timeout(Duration::from_millis(20)),
            }]
        );
    }

    #[tokio::test]
    async fn test_panic_does_not_kill_worker() {
        let queue = queue_of(&["boom", "fine"]);
        let sink = ResultSink::new();
        let op = |t: &'static str| async move {
            if t == "boom" {
                panic!("device exploded");
            }
            Ok::<_, OperationError>(())
        };

        let pool = WorkerPool::start(
            1,
            queue.clone(),
            Arc::new(op),
            sink.clone(),
            Duration::from_secs(5),
            CancellationToken::new(),
        );
        queue.await_drain().await;
        pool.shutdown().await;

        let outcomes = sink.snapshot();
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            &outcomes[0],
            Outcome::Failure { error: OperationError::Panicked(msg), .. } if msg == "device exploded"
        ));
        assert!(outcomes[1].is_success());
    }

    #[tokio::test]
    async fn test_cancelled_workers_stop_taking_items() {
        let queue: Arc<TaskQueue<Queued<&'static str>>> = Arc::new(TaskQueue::new());
        let sink = ResultSink::new();
        let token = CancellationToken::new();
        let op = |_t: &'static str| async { Ok::<_, OperationError>(()) };

        let pool = WorkerPool::start(
            3,
            queue.clone(),
            Arc::new(op),
            sink.clone(),
            Duration::from_secs(5),
            token.clone(),
        );
        token.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.enqueue(Queued { seq: 0, item: "x" }).unwrap();
        pool.shutdown().await;

        assert!(sink.is_empty());
        assert_eq!(queue.pending(), 1);
    }
}
