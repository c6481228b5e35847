// SPDX-FileCopyrightText: 2026 Dashboard Rate Limiter contributors
// SPDX-License-Identifier: Apache-2.0

//! Client request governor.
//!
//! Accepts asynchronous units of work from arbitrary call sites and emits
//! them to the network in FIFO order, paced and concurrency-bounded, without
//! the callers coordinating with each other. A single worker task owns the
//! queue; a semaphore bounds in-flight work and a sleep-until gate enforces
//! the minimum spacing between dispatch starts.
//!
//! The governor never retries: a task's own failure propagates to its caller
//! unchanged inside the task's output type. The only error the governor
//! itself produces is [`GovernorError::Cleared`], raised for entries that
//! were still queued when [`RequestGovernor::clear`] ran.

use crate::config::GovernorConfig;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, Notify, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

/// Error produced by the governor itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GovernorError {
    /// The entry was discarded by [`RequestGovernor::clear`] before dispatch.
    #[error("request queue cleared before dispatch")]
    Cleared,
}

/// A queued unit of work. Invoking `dispatch` runs the caller's task and
/// settles its reply channel; dropping the entry undispatched drops the
/// reply sender, which the caller observes as [`GovernorError::Cleared`].
struct QueueEntry {
    dispatch: Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>,
}

struct GovernorShared {
    /// FIFO queue, insertion order = dispatch priority
    queue: Mutex<VecDeque<QueueEntry>>,
    /// Wakes the worker when work is enqueued
    wakeup: Notify,
    /// Bounds the number of in-flight tasks
    slots: Arc<Semaphore>,
    /// Start time of the most recent dispatch
    last_dispatch: Mutex<Option<Instant>>,
    min_interval: Duration,
}

/// FIFO pacing and concurrency governor for outbound requests.
///
/// Construct once at application startup and share it; it runs for the
/// application's lifetime. Must be created within a Tokio runtime.
pub struct RequestGovernor {
    shared: Arc<GovernorShared>,
    worker: JoinHandle<()>,
}

impl RequestGovernor {
    /// Create a new governor and spawn its worker loop.
    pub fn new(config: GovernorConfig) -> Self {
        // A zero concurrency bound would park the queue forever.
        let max_concurrent = config.max_concurrent.max(1);

        let shared = Arc::new(GovernorShared {
            queue: Mutex::new(VecDeque::new()),
            wakeup: Notify::new(),
            slots: Arc::new(Semaphore::new(max_concurrent)),
            last_dispatch: Mutex::new(None),
            min_interval: config.min_interval(),
        });

        debug!(
            min_interval_ms = config.min_interval_ms,
            max_concurrent, "Starting request governor"
        );

        let worker = tokio::spawn(worker_loop(shared.clone()));
        Self { shared, worker }
    }

    /// Submit a unit of work.
    ///
    /// The task is called exactly once, at dispatch time. Enqueueing happens
    /// synchronously in this call, so submission call order is dispatch
    /// order; the returned future resolves with the task's output once it
    /// settles, or with [`GovernorError::Cleared`] if the entry is discarded
    /// by [`clear`](Self::clear) first.
    pub fn execute<F, Fut, T>(&self, task: F) -> impl Future<Output = Result<T, GovernorError>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let entry = QueueEntry {
            dispatch: Box::new(move || {
                let fut: BoxFuture<'static, ()> = Box::pin(async move {
                    let value = task().await;
                    // The caller may have stopped waiting; that is its right.
                    let _ = reply_tx.send(value);
                });
                fut
            }),
        };

        self.shared.queue.lock().unwrap().push_back(entry);
        self.shared.wakeup.notify_one();

        async move { reply_rx.await.map_err(|_| GovernorError::Cleared) }
    }

    /// Discard every queued, not-yet-dispatched entry.
    ///
    /// Their callers observe [`GovernorError::Cleared`]. In-flight tasks are
    /// unaffected and settle normally; their slots return to the pool when
    /// they do.
    pub fn clear(&self) {
        let drained: Vec<QueueEntry> = self.shared.queue.lock().unwrap().drain(..).collect();
        if !drained.is_empty() {
            debug!(discarded = drained.len(), "Cleared request queue");
        }
    }

    /// Number of queued, not-yet-dispatched entries.
    pub fn queue_len(&self) -> usize {
        self.shared.queue.lock().unwrap().len()
    }
}

impl Drop for RequestGovernor {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

/// Worker loop: the single place entries leave the queue.
///
/// Dispatch of one entry requires, in order: the queue to be non-empty, a
/// free concurrency slot, and the spacing gate to open. The slot is taken
/// before the entry is dequeued so that entries parked behind a full window
/// remain clearable.
async fn worker_loop(shared: Arc<GovernorShared>) {
    loop {
        while shared.queue.lock().unwrap().is_empty() {
            shared.wakeup.notified().await;
        }

        let permit = match shared.slots.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let entry = shared.queue.lock().unwrap().pop_front();
        let Some(entry) = entry else {
            // Queue was cleared while we waited for a slot.
            drop(permit);
            continue;
        };

        // Spacing gate. Only one dispatch is ever in here because this loop
        // is the sole dispatcher.
        let wait = {
            let last = shared.last_dispatch.lock().unwrap();
            last.map(|at| shared.min_interval.saturating_sub(at.elapsed()))
                .unwrap_or(Duration::ZERO)
        };
        if !wait.is_zero() {
            trace!(wait_ms = wait.as_millis() as u64, "Delaying dispatch");
            sleep(wait).await;
        }
        *shared.last_dispatch.lock().unwrap() = Some(Instant::now());

        tokio::spawn(async move {
            (entry.dispatch)().await;
            drop(permit);
        });
    }
}
