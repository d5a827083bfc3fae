//! # Task Handles
//!
//! This module defines the blocking future half of the scheduler: a
//! `TaskHandle<R>` given to the caller of `ThreadPool::enqueue`, and the
//! matching `TaskPromise<R>` carried by the queued task body.
//!
//! ## Lifecycle
//! 1. `promise()` creates a connected handle/promise pair
//! 2. The task body runs on a worker thread and fulfills the promise with
//!    either the return value or the caught panic payload
//! 3. The caller blocks on `wait()` (or polls `try_take()`) to observe the
//!    outcome exactly once
//!
//! A handle is always satisfied: panicking task bodies are caught at the
//! scheduler's wrapper boundary and surface here as
//! `SchedulerError::TaskPanicked`. Because the pool drains its queues on
//! shutdown, every successfully enqueued task eventually fulfills its
//! promise.

use std::sync::{Arc, Condvar, Mutex};

use super::SchedulerError;

/// The raw outcome of a task body: the return value, or the panic payload
/// caught by the worker's `catch_unwind` wrapper.
pub(crate) type TaskOutcome<R> = std::thread::Result<R>;

struct Shared<R> {
    slot: Mutex<Option<TaskOutcome<R>>>,
    ready: Condvar,
}

/// The caller-side handle for a task enqueued on the thread pool.
///
/// The handle can be waited on (blocking) or polled. Dropping the handle is
/// fine; the task still runs to completion (there is no cancellation).
pub struct TaskHandle<R> {
    shared: Arc<Shared<R>>,
}

/// The worker-side completion token. Fulfilled exactly once by the task
/// wrapper, whether the body returned normally or panicked.
pub(crate) struct TaskPromise<R> {
    shared: Arc<Shared<R>>,
}

/// Creates a connected handle/promise pair for a single task.
pub(crate) fn promise<R>() -> (TaskHandle<R>, TaskPromise<R>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(None),
        ready: Condvar::new(),
    });
    (
        TaskHandle {
            shared: Arc::clone(&shared),
        },
        TaskPromise { shared },
    )
}

impl<R> TaskPromise<R> {
    /// Stores the task outcome and wakes every waiter.
    pub(crate) fn fulfill(self, outcome: TaskOutcome<R>) {
        let mut slot = self.shared.slot.lock().unwrap();
        *slot = Some(outcome);
        self.shared.ready.notify_all();
    }
}

impl<R> TaskHandle<R> {
    /// Blocks the calling thread until the task has run, then returns its
    /// result.
    ///
    /// # Errors
    /// Returns `SchedulerError::TaskPanicked` when the task body panicked;
    /// the panic itself was already logged by the worker wrapper.
    pub fn wait(self) -> Result<R, SchedulerError> {
        let mut slot = self.shared.slot.lock().unwrap();
        while slot.is_none() {
            slot = self.shared.ready.wait(slot).unwrap();
        }
        match slot.take() {
            Some(Ok(value)) => Ok(value),
            Some(Err(_panic)) => Err(SchedulerError::TaskPanicked),
            None => unreachable!("slot checked non-empty above"),
        }
    }

    /// Blocks until the task has run or `timeout` elapses.
    ///
    /// Returns `None` on timeout; the task keeps running and the outcome can
    /// still be taken later.
    pub fn wait_timeout(&self, timeout: std::time::Duration) -> Option<Result<R, SchedulerError>> {
        let slot = self.shared.slot.lock().unwrap();
        let (mut slot, _) = self
            .shared
            .ready
            .wait_timeout_while(slot, timeout, |slot| slot.is_none())
            .unwrap();
        slot.take().map(|outcome| match outcome {
            Ok(value) => Ok(value),
            Err(_panic) => Err(SchedulerError::TaskPanicked),
        })
    }

    /// Takes the result without blocking.
    ///
    /// Returns `None` while the task has not finished yet. The outcome can
    /// be taken at most once.
    pub fn try_take(&self) -> Option<Result<R, SchedulerError>> {
        let mut slot = self.shared.slot.lock().unwrap();
        slot.take().map(|outcome| match outcome {
            Ok(value) => Ok(value),
            Err(_panic) => Err(SchedulerError::TaskPanicked),
        })
    }

    /// Returns `true` once the task outcome is available.
    pub fn is_finished(&self) -> bool {
        self.shared.slot.lock().unwrap().is_some()
    }
}
