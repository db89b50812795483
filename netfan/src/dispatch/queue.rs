//! Closable multi-producer/multi-consumer task queue with drain tracking.
//!
//! "Drained" means no pending items **and** nothing in flight. A worker that
//! has dequeued an item keeps the queue undrained until it calls
//! [`TaskQueue::mark_done`], so an empty `VecDeque` alone never signals
//! completion.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{trace, warn};
use tokio::sync::Notify;

use crate::error::DispatchError;

#[derive(Debug)]
struct QueueState<T> {
    pending: VecDeque<T>,
    in_flight: usize,
    closed: bool,
}

impl<T> QueueState<T> {
    fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }
}

/// Unbounded FIFO of pending work items.
#[derive(Debug)]
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,

    /// Woken when an item arrives or the queue closes.
    available: Notify,

    /// Woken when the queue becomes drained.
    drained: Notify,
}

impl<T> TaskQueue<T> {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                in_flight: 0,
                closed: false,
            }),
            available: Notify::new(),
            drained: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item. Never blocks.
    pub fn enqueue(&self, item: T) -> Result<(), DispatchError> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(DispatchError::QueueClosed);
            }
            state.pending.push_back(item);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Wait for the next item.
    ///
    /// Returns `None` only once the queue is closed and has no pending
    /// items. A returned item counts as in flight until [`mark_done`](Self::mark_done).
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(item) = state.pending.pop_front() {
                    state.in_flight += 1;
                    let more = !state.pending.is_empty();
                    drop(state);
                    // Pass the wakeup along so a second idle worker picks up
                    // the next item.
                    if more {
                        self.available.notify_one();
                    }
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Acknowledge that a dequeued item finished, successfully or not.
    pub fn mark_done(&self) {
        let drained = {
            let mut state = self.lock();
            if state.in_flight == 0 {
                warn!("mark_done called with nothing in flight");
                return;
            }
            state.in_flight -= 1;
            state.is_drained()
        };
        if drained {
            trace!("task queue drained");
            self.drained.notify_waiters();
        }
    }

    /// Wait until nothing is pending and nothing is in flight.
    ///
    /// All enqueues for the run must complete before this is called,
    /// otherwise it can observe a momentarily empty queue.
    pub async fn await_drain(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.lock().is_drained() {
                return;
            }

            notified.await;
        }
    }

    /// Signal "no more work". Idle workers wake and see `None`.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
    }

    /// Remove every item not yet handed to a worker.
    pub fn take_pending(&self) -> Vec<T> {
        let (items, drained) = {
            let mut state = self.lock();
            let items: Vec<T> = state.pending.drain(..).collect();
            (items, state.in_flight == 0)
        };
        if drained {
            self.drained.notify_waiters();
        }
        items
    }

    /// Number of items waiting for a worker.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of items dequeued but not yet acknowledged.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
