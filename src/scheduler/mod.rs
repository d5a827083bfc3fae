//! # Task Scheduler
//!
//! A fixed pool of persistent worker threads with one task deque per worker,
//! priority-tagged tasks, work stealing, and an opt-in synchronization
//! barrier. This is the generic scheduling primitive the chunk pipeline and
//! the scene streaming layer are built on.
//!
//! ## Architecture Overview
//!
//! - `ThreadPool`: owns the workers, their deques, and the barrier state
//! - `TaskPriority`: advisory urgency tag stored with each queued task
//! - `TaskHandle`: blocking future for a single enqueued task
//! - `ThreadControlBlock`: per-worker bookkeeping read by barrier waiters
//!
//! ## Scheduling Model
//!
//! Tasks are distributed across the per-worker deques at random rather than
//! through a global priority queue. Within one deque a task is inserted ahead
//! of strictly less urgent entries, so priority shapes ordering locally, but
//! there is **no cross-worker ordering guarantee**: a `Background` task on an
//! idle worker can run before a `Critical` task queued behind work elsewhere.
//! Strict global priority ordering is deliberately sacrificed for low
//! contention; the tests document this as a design choice.
//!
//! Idle workers first drain their own deque, then steal the front of any
//! non-empty peer deque, and only then block on the pool condition variable.
//! On shutdown workers drain every remaining task before exiting, so every
//! successfully enqueued task runs exactly once.
//!
//! ## Synchronization Barrier
//!
//! Callers that need to wait for background work enqueue their tasks with
//! `synchronize = true` and later call [`ThreadPool::sync_registered_tasks`],
//! which blocks until the count of in-flight synchronized tasks reaches zero
//! or the timeout elapses. Fire-and-forget work enqueued without the flag
//! never delays barrier users. Workers themselves can opt in or out of
//! barrier tracking with [`ThreadPool::sync_this_thread`].
//!
//! ## Failure Semantics
//!
//! A panicking task body is caught at the wrapper boundary, logged, and does
//! not crash its worker; the task's handle still resolves (with
//! [`SchedulerError::TaskPanicked`]). Enqueueing after shutdown is a
//! recoverable [`SchedulerError::ShutDown`] rather than a fatal error.

pub mod task;

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use log::{error, trace};
use thiserror::Error;

pub use task::TaskHandle;

/// Default timeout used by [`ThreadPool::sync_registered_tasks`].
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_millis(500);

/// Errors produced by scheduler misuse or by tasks themselves.
///
/// Missing work is never an error here; these cover the recoverable failure
/// modes of the pool API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// `enqueue` was called after the pool began shutting down.
    #[error("task enqueued after thread pool shutdown")]
    ShutDown,
    /// The task body panicked; the panic was caught and logged by the worker.
    #[error("task panicked before producing a result")]
    TaskPanicked,
    /// `sync_this_thread` was called from a thread outside the pool.
    #[error("calling thread is not a thread pool worker")]
    NotAPoolThread,
}

/// Advisory urgency of a queued task, most urgent first.
///
/// Priority orders tasks within a single worker deque only; see the module
/// documentation for why there is no global ordering guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskPriority {
    /// Must run as soon as a worker picks up new work.
    Critical,
    /// Latency-sensitive pipeline work (chunk meshing uses this).
    VeryHigh,
    /// Important background work (chunk generation uses this).
    High,
    /// Default urgency.
    Normal,
    /// Work that can wait behind everything above.
    Low,
    /// Rarely urgent maintenance work.
    VeryLow,
    /// Opportunistic work with no latency expectations.
    Background,
}

/// Per-worker bookkeeping, mutated only by the owning worker and read by
/// barrier-waiting callers.
pub struct ThreadControlBlock {
    thread_id: OnceLock<ThreadId>,
    is_registered_for_sync: AtomicBool,
    has_reached_sync_point: AtomicBool,
}

impl ThreadControlBlock {
    fn new() -> Self {
        ThreadControlBlock {
            thread_id: OnceLock::new(),
            is_registered_for_sync: AtomicBool::new(false),
            has_reached_sync_point: AtomicBool::new(false),
        }
    }

    /// Whether the owning worker currently participates in the barrier.
    pub fn is_registered_for_sync(&self) -> bool {
        self.is_registered_for_sync.load(Ordering::Acquire)
    }

    /// Whether the owning worker has passed its sync point since it last
    /// registered.
    pub fn has_reached_sync_point(&self) -> bool {
        self.has_reached_sync_point.load(Ordering::Acquire)
    }
}

type Job = Box<dyn FnOnce() + Send>;

struct QueuedTask {
    priority: TaskPriority,
    job: Job,
}

/// State shared between the pool handle and its workers.
struct PoolState {
    /// One deque per worker. A single mutex guards all of them; stealing
    /// keeps workers busy without per-deque locks, mirroring the low
    /// contention the randomized distribution is after.
    queues: Mutex<Vec<VecDeque<QueuedTask>>>,
    work_available: Condvar,
    /// Gate mutex for the barrier condition variable. Counter reads go
    /// through the atomics; the mutex only serializes sleep/wake.
    sync_gate: Mutex<()>,
    sync_condition: Condvar,
    active_tasks: AtomicU64,
    sync_tasks: AtomicU64,
    stop: AtomicBool,
}

impl PoolState {
    fn all_queues_empty(&self) -> bool {
        self.queues
            .lock()
            .unwrap()
            .iter()
            .all(|queue| queue.is_empty())
    }
}

/// Fixed pool of worker threads with work stealing and a sync barrier.
///
/// The pool is shared as `Arc<ThreadPool>` between the scene (chunk
/// generation) and the chunks themselves (mesh generation). Dropping the last
/// handle shuts the pool down: remaining queued tasks are drained, then the
/// workers are joined.
pub struct ThreadPool {
    state: Arc<PoolState>,
    control_blocks: Vec<Arc<ThreadControlBlock>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Creates a pool with `num_threads` persistent workers.
    ///
    /// `num_threads` is clamped to at least one worker.
    pub fn new(num_threads: usize) -> Self {
        let num_threads = num_threads.max(1);

        let state = Arc::new(PoolState {
            queues: Mutex::new((0..num_threads).map(|_| VecDeque::new()).collect()),
            work_available: Condvar::new(),
            sync_gate: Mutex::new(()),
            sync_condition: Condvar::new(),
            active_tasks: AtomicU64::new(0),
            sync_tasks: AtomicU64::new(0),
            stop: AtomicBool::new(false),
        });

        let mut control_blocks = Vec::with_capacity(num_threads);
        let mut workers = Vec::with_capacity(num_threads);
        for index in 0..num_threads {
            let tcb = Arc::new(ThreadControlBlock::new());
            control_blocks.push(Arc::clone(&tcb));
            let state = Arc::clone(&state);
            workers.push(
                thread::Builder::new()
                    .name(format!("voxel-worker-{index}"))
                    .spawn(move || worker_loop(state, tcb, index))
                    .expect("failed to spawn thread pool worker"),
            );
        }

        ThreadPool {
            state,
            control_blocks,
            workers,
        }
    }

    /// Creates a pool sized to the machine's available parallelism.
    pub fn with_default_threads() -> Self {
        let num_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(num_threads)
    }

    /// Number of worker threads in the pool.
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Enqueues a task and returns a handle to its eventual result.
    ///
    /// The task lands on a randomly chosen worker deque, inserted ahead of
    /// any strictly less urgent entries already queued there. When
    /// `synchronize` is true the task is tracked by the sync barrier and a
    /// later [`sync_registered_tasks`](Self::sync_registered_tasks) call will
    /// wait for it.
    ///
    /// # Errors
    /// Returns [`SchedulerError::ShutDown`] when the pool is shutting down;
    /// the task closure is dropped without running.
    pub fn enqueue<F, R>(
        &self,
        priority: TaskPriority,
        synchronize: bool,
        f: F,
    ) -> Result<TaskHandle<R>, SchedulerError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (handle, promise) = task::promise::<R>();
        let state = Arc::clone(&self.state);
        let job: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(f));
            if outcome.is_err() {
                error!("worker task panicked; the task handle will report the failure");
            }
            promise.fulfill(outcome);

            if synchronize {
                state.sync_tasks.fetch_sub(1, Ordering::Release);
            }
            state.active_tasks.fetch_sub(1, Ordering::Release);
            let _gate = state.sync_gate.lock().unwrap();
            state.sync_condition.notify_all();
        });

        {
            let mut queues = self.state.queues.lock().unwrap();
            if self.state.stop.load(Ordering::Acquire) {
                return Err(SchedulerError::ShutDown);
            }

            let queue_index = fastrand::usize(..queues.len());
            let queue = &mut queues[queue_index];
            let insert_at = queue
                .iter()
                .position(|queued| queued.priority > priority)
                .unwrap_or(queue.len());
            queue.insert(insert_at, QueuedTask { priority, job });

            self.state.active_tasks.fetch_add(1, Ordering::AcqRel);
            if synchronize {
                self.state.sync_tasks.fetch_add(1, Ordering::AcqRel);
            }
            trace!("enqueued {priority:?} task on worker queue {queue_index}");
        }
        self.state.work_available.notify_one();

        Ok(handle)
    }

    /// Blocks until every in-flight synchronized task has completed, or the
    /// timeout elapses.
    ///
    /// Returns `true` when the barrier was reached; on timeout it logs an
    /// error, leaves all state unchanged, and returns `false` so the caller
    /// can retry or carry on with possibly incomplete background work.
    pub fn sync_registered_tasks(&self, timeout: Duration) -> bool {
        let gate = self.state.sync_gate.lock().unwrap();
        let (gate, wait_result) = self
            .state
            .sync_condition
            .wait_timeout_while(gate, timeout, |()| {
                self.state.sync_tasks.load(Ordering::Acquire) != 0
            })
            .unwrap();
        drop(gate);

        if wait_result.timed_out() {
            error!(
                "sync barrier timed out after {}ms with {} task(s) still in flight",
                timeout.as_millis(),
                self.state.sync_tasks.load(Ordering::Acquire)
            );
            return false;
        }

        for tcb in &self.control_blocks {
            tcb.is_registered_for_sync.store(false, Ordering::Release);
            tcb.has_reached_sync_point.store(false, Ordering::Release);
        }
        true
    }

    /// Opts the calling worker thread in or out of barrier tracking.
    ///
    /// Fire-and-forget background work calls this with `false` so it never
    /// blocks barrier users.
    ///
    /// # Errors
    /// Returns [`SchedulerError::NotAPoolThread`] when called from a thread
    /// that does not belong to this pool.
    pub fn sync_this_thread(&self, register: bool) -> Result<(), SchedulerError> {
        let current = thread::current().id();
        let tcb = self
            .control_blocks
            .iter()
            .find(|tcb| tcb.thread_id.get() == Some(&current))
            .ok_or(SchedulerError::NotAPoolThread)?;

        tcb.is_registered_for_sync.store(register, Ordering::Release);
        tcb.has_reached_sync_point.store(!register, Ordering::Release);

        let _gate = self.state.sync_gate.lock().unwrap();
        self.state.sync_condition.notify_all();
        Ok(())
    }

    /// Runs a batch of closures on the pool and blocks until all of them
    /// have finished.
    ///
    /// # Errors
    /// Returns [`SchedulerError::ShutDown`] if the pool shuts down while the
    /// batch is being submitted; closures submitted before the failure still
    /// run.
    pub fn execute_and_wait(
        &self,
        tasks: Vec<Box<dyn FnOnce() + Send>>,
    ) -> Result<(), SchedulerError> {
        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            handles.push(self.enqueue(TaskPriority::Normal, false, task)?);
        }
        for handle in handles {
            handle.wait()?;
        }
        Ok(())
    }

    /// Blocks until the pool has no queued or running tasks at all,
    /// synchronized or not.
    pub fn wait_for_all_tasks(&self) {
        let mut gate = self.state.sync_gate.lock().unwrap();
        loop {
            if self.state.active_tasks.load(Ordering::Acquire) == 0
                && self.state.all_queues_empty()
            {
                return;
            }
            gate = self.state.sync_condition.wait(gate).unwrap();
        }
    }

    /// Number of tasks currently queued or running.
    pub fn active_tasks(&self) -> u64 {
        self.state.active_tasks.load(Ordering::Acquire)
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        {
            let _queues = self.state.queues.lock().unwrap();
            self.state.stop.store(true, Ordering::Release);
        }
        self.state.work_available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(state: Arc<PoolState>, tcb: Arc<ThreadControlBlock>, index: usize) {
    let _ = tcb.thread_id.set(thread::current().id());

    loop {
        let job = {
            let mut queues = state.queues.lock().unwrap();
            loop {
                if let Some(task) = queues[index].pop_front() {
                    break task.job;
                }
                if let Some(task) = steal_task(&mut queues, index) {
                    break task.job;
                }
                // Queues are empty here, so stopping never abandons work.
                if state.stop.load(Ordering::Acquire) {
                    return;
                }
                queues = state.work_available.wait(queues).unwrap();
            }
        };

        job();

        if tcb.is_registered_for_sync.load(Ordering::Acquire) {
            tcb.has_reached_sync_point.store(true, Ordering::Release);
            let _gate = state.sync_gate.lock().unwrap();
            state.sync_condition.notify_all();
        }
    }
}

/// Takes the front task of the first non-empty peer deque.
fn steal_task(queues: &mut [VecDeque<QueuedTask>], own_index: usize) -> Option<QueuedTask> {
    queues
        .iter_mut()
        .enumerate()
        .filter(|(index, _)| *index != own_index)
        .find_map(|(_, queue)| queue.pop_front())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn hundred_synchronized_tasks_run_exactly_once() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicU32::new(0));

        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.enqueue(TaskPriority::Normal, true, move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }

        assert!(pool.sync_registered_tasks(Duration::from_secs(5)));
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn barrier_ignores_unsynchronized_tasks() {
        let pool = ThreadPool::new(2);
        let release = Arc::new(AtomicBool::new(false));

        // A slow fire-and-forget task must not hold up the barrier.
        let release_clone = Arc::clone(&release);
        pool.enqueue(TaskPriority::Background, false, move || {
            while !release_clone.load(Ordering::Acquire) {
                thread::yield_now();
            }
        })
        .unwrap();

        let handle = pool
            .enqueue(TaskPriority::High, true, || 21 * 2)
            .unwrap();
        assert!(pool.sync_registered_tasks(Duration::from_secs(5)));
        assert_eq!(handle.wait().unwrap(), 42);

        release.store(true, Ordering::Release);
    }

    #[test]
    fn sync_times_out_and_leaves_state_unchanged() {
        let pool = ThreadPool::new(1);
        let release = Arc::new(AtomicBool::new(false));

        let release_clone = Arc::clone(&release);
        pool.enqueue(TaskPriority::Normal, true, move || {
            while !release_clone.load(Ordering::Acquire) {
                thread::yield_now();
            }
        })
        .unwrap();

        assert!(!pool.sync_registered_tasks(Duration::from_millis(50)));

        // The task is still tracked; once released the barrier succeeds.
        release.store(true, Ordering::Release);
        assert!(pool.sync_registered_tasks(Duration::from_secs(5)));
    }

    #[test]
    fn panicking_task_satisfies_handle_and_keeps_worker_alive() {
        let pool = ThreadPool::new(1);

        let panicking = pool
            .enqueue(TaskPriority::Normal, true, || panic!("deliberate"))
            .unwrap();
        assert!(matches!(
            panicking.wait(),
            Err(SchedulerError::TaskPanicked)
        ));

        // The single worker survived the panic and keeps serving tasks.
        let follow_up = pool.enqueue(TaskPriority::Normal, true, || 5u32).unwrap();
        assert_eq!(follow_up.wait().unwrap(), 5);
        assert!(pool.sync_registered_tasks(Duration::from_secs(5)));
    }

    #[test]
    fn enqueue_after_shutdown_is_recoverable() {
        let pool = ThreadPool::new(2);
        pool.state.stop.store(true, Ordering::Release);
        let result = pool.enqueue(TaskPriority::Normal, false, || ());
        assert!(matches!(result, Err(SchedulerError::ShutDown)));
    }

    #[test]
    fn priority_orders_within_a_queue_but_not_globally() {
        // Single worker, so every task shares one deque and per-queue
        // ordering is observable. With more workers no ordering across
        // deques is promised; that is the documented design choice.
        let pool = ThreadPool::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        // Park the worker so the queue can fill up in a known state.
        let release = Arc::new(AtomicBool::new(false));
        let release_clone = Arc::clone(&release);
        pool.enqueue(TaskPriority::Normal, false, move || {
            while !release_clone.load(Ordering::Acquire) {
                thread::yield_now();
            }
        })
        .unwrap();

        for (priority, tag) in [
            (TaskPriority::Background, "background"),
            (TaskPriority::Critical, "critical"),
            (TaskPriority::Normal, "normal"),
        ] {
            let order = Arc::clone(&order);
            pool.enqueue(priority, true, move || {
                order.lock().unwrap().push(tag);
            })
            .unwrap();
        }

        release.store(true, Ordering::Release);
        assert!(pool.sync_registered_tasks(Duration::from_secs(5)));
        assert_eq!(
            *order.lock().unwrap(),
            vec!["critical", "normal", "background"]
        );
    }

    #[test]
    fn execute_and_wait_runs_the_whole_batch() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicU32::new(0));

        let tasks: Vec<Box<dyn FnOnce() + Send>> = (0..16)
            .map(|_| {
                let counter = Arc::clone(&counter);
                Box::new(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }) as Box<dyn FnOnce() + Send>
            })
            .collect();

        pool.execute_and_wait(tasks).unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 16);
    }

    #[test]
    fn wait_for_all_tasks_drains_everything() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(AtomicU32::new(0));

        for _ in 0..32 {
            let counter = Arc::clone(&counter);
            pool.enqueue(TaskPriority::Low, false, move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }

        pool.wait_for_all_tasks();
        assert_eq!(counter.load(Ordering::Relaxed), 32);
        assert_eq!(pool.active_tasks(), 0);
    }

    #[test]
    fn sync_this_thread_rejects_foreign_threads() {
        let pool = ThreadPool::new(1);
        assert_eq!(
            pool.sync_this_thread(true),
            Err(SchedulerError::NotAPoolThread)
        );
    }

    #[test]
    fn workers_can_register_for_sync_tracking() {
        let pool = Arc::new(ThreadPool::new(1));

        let pool_clone = Arc::clone(&pool);
        let handle = pool
            .enqueue(TaskPriority::Normal, true, move || {
                pool_clone.sync_this_thread(true)
            })
            .unwrap();
        assert!(handle.wait().unwrap().is_ok());

        assert!(pool.sync_registered_tasks(Duration::from_secs(5)));
        // A successful barrier drops every worker's registration.
        assert!(pool
            .control_blocks
            .iter()
            .all(|tcb| !tcb.is_registered_for_sync()));
    }
}
