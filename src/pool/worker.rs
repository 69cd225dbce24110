//! Worker thread implementation
//!
//! A [`Worker`] owns one execution thread and one private [`PriorityQueue`].
//! The thread runs the highest-priority local task, one at a time, while the
//! worker is [`WorkerStatus::Active`].

use crate::core::{PoolError, PriorityQueue, Result, Task, TaskOutcome};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// Lifecycle state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerStatus {
    /// Executing queued tasks
    Active,
    /// Keeping queued tasks but not starting new ones
    Resting,
    /// Final state; the thread has been told to exit
    Terminated,
}

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of tasks run to completion
    pub tasks_executed: AtomicU64,
    /// Total number of tasks whose payload panicked
    pub tasks_panicked: AtomicU64,
    /// Total time spent running tasks (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, outcome: &TaskOutcome, elapsed: Duration) {
        match outcome {
            TaskOutcome::Completed => self.tasks_executed.fetch_add(1, Ordering::Relaxed),
            TaskOutcome::Panicked(_) => self.tasks_panicked.fetch_add(1, Ordering::Relaxed),
        };
        self.total_processing_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Get total tasks executed
    pub fn get_tasks_executed(&self) -> u64 {
        self.tasks_executed.load(Ordering::Relaxed)
    }

    /// Get total tasks panicked
    pub fn get_tasks_panicked(&self) -> u64 {
        self.tasks_panicked.load(Ordering::Relaxed)
    }

    /// Get average processing time per task in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_tasks_executed() + self.get_tasks_panicked();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// State shared between the worker handle and its thread
struct Shared {
    status: Mutex<WorkerStatus>,
    wakeup: Condvar,
    queue: PriorityQueue<Task>,
    stats: Arc<WorkerStats>,
}

/// A worker thread with its own task queue
///
/// Workers are never cloned; the pool and strategies share them through `Arc`.
pub struct Worker {
    id: usize,
    name: String,
    shared: Arc<Shared>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl Worker {
    /// Create and start an active worker
    ///
    /// The thread is named `<thread_name_prefix>-<id>`.
    pub fn new(id: usize, thread_name_prefix: &str) -> Result<Self> {
        Self::spawn(id, thread_name_prefix, WorkerStatus::Active)
    }

    /// Create and start a worker that stays idle until [`activate`](Self::activate)
    pub fn new_resting(id: usize, thread_name_prefix: &str) -> Result<Self> {
        Self::spawn(id, thread_name_prefix, WorkerStatus::Resting)
    }

    fn spawn(id: usize, thread_name_prefix: &str, status: WorkerStatus) -> Result<Self> {
        let shared = Arc::new(Shared {
            status: Mutex::new(status),
            wakeup: Condvar::new(),
            queue: PriorityQueue::new(),
            stats: Arc::new(WorkerStats::new()),
        });
        let shared_clone = Arc::clone(&shared);
        let name = format!("{}-{}", thread_name_prefix, id);

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                Self::run(id, shared_clone);
            })
            .map_err(|e| PoolError::spawn(name.as_str(), "Cannot create worker thread", e))?;

        Ok(Self {
            id,
            name,
            shared,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the worker thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current lifecycle state
    pub fn status(&self) -> WorkerStatus {
        *self.shared.status.lock()
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.shared.stats)
    }

    /// True iff the local queue holds tasks
    ///
    /// This is a load signal only; a worker running its last task reports
    /// `false`.
    pub fn is_busy(&self) -> bool {
        !self.shared.queue.is_empty()
    }

    /// Number of tasks waiting in the local queue
    pub fn pending_count(&self) -> usize {
        self.shared.queue.len()
    }

    /// True once the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread
            .lock()
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Queue a task on this worker
    ///
    /// # Errors
    ///
    /// A terminated worker hands the task back unchanged.
    pub fn enqueue(&self, task: Task) -> std::result::Result<(), Task> {
        let status = self.shared.status.lock();
        if *status == WorkerStatus::Terminated {
            return Err(task);
        }
        self.shared.queue.push(task);
        drop(status);

        self.shared.wakeup.notify_one();
        Ok(())
    }

    /// Resume execution after [`rest`](Self::rest)
    pub fn activate(&self) {
        let mut status = self.shared.status.lock();
        if *status == WorkerStatus::Resting {
            *status = WorkerStatus::Active;
        }
        drop(status);
        self.shared.wakeup.notify_all();
    }

    /// Stop starting new tasks; the running task, if any, finishes normally
    pub fn rest(&self) {
        let mut status = self.shared.status.lock();
        if *status == WorkerStatus::Active {
            *status = WorkerStatus::Resting;
        }
    }

    /// Terminate the worker and join its thread
    ///
    /// Queued tasks that have not started are dropped without running. A task
    /// already running is allowed to finish, so this blocks for at most that
    /// task's remaining time. Calling it again is a no-op.
    ///
    /// When called from the worker's own thread (a task stopping its pool),
    /// the thread is left to exit on its own instead of joining itself.
    pub fn terminate(&self) -> Result<()> {
        self.signal_terminate();

        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                log::debug!("worker {} terminated from its own thread", self.id);
                return Ok(());
            }
            handle
                .join()
                .map_err(|_| PoolError::join(self.name.as_str(), "Worker panicked"))?;
        }
        Ok(())
    }

    /// Mark the worker terminated, drop its queue and wake the thread
    pub(crate) fn signal_terminate(&self) {
        let discarded = {
            let mut status = self.shared.status.lock();
            if *status == WorkerStatus::Terminated {
                return;
            }
            *status = WorkerStatus::Terminated;
            self.shared.queue.clear()
        };
        self.shared.wakeup.notify_all();

        if discarded > 0 {
            log::debug!(
                "worker {} terminated, {} queued tasks discarded",
                self.id,
                discarded
            );
        }
    }

    /// Main worker loop
    ///
    /// Blocks until the worker is active with a queued task, or terminated.
    /// The predicate is re-checked after every wakeup.
    fn run(id: usize, shared: Arc<Shared>) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        log::debug!("worker {} started", id);

        loop {
            let task = {
                let mut status = shared.status.lock();
                loop {
                    match *status {
                        WorkerStatus::Terminated => {
                            log::debug!(
                                "worker {} exiting after {} tasks",
                                id,
                                shared.stats.get_tasks_executed()
                            );
                            return;
                        }
                        WorkerStatus::Active => {
                            if let Some(task) = shared.queue.try_pop() {
                                break task;
                            }
                        }
                        WorkerStatus::Resting => {}
                    }
                    shared.wakeup.wait(&mut status);
                }
            };

            Self::execute_task(id, task, &shared.stats);
        }
    }

    /// Execute a single task and record the outcome
    fn execute_task(id: usize, task: Task, stats: &WorkerStats) {
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_worker_busy(id);

        let start = Instant::now();
        let outcome = task.run();
        let elapsed = start.elapsed();

        if let TaskOutcome::Panicked(message) = &outcome {
            log::warn!("worker {}: task panicked: {}", id, message);
        }

        #[cfg(feature = "tracing")]
        {
            crate::tracing::metrics::record_completion(elapsed, &outcome);
            crate::tracing::metrics::record_worker_idle(id);
        }

        stats.record(&outcome, elapsed);
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.signal_terminate();

        if let Some(handle) = self.thread.get_mut().take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }

            // Use a timeout to prevent Drop from hanging on a long-running task
            const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

            let start = Instant::now();
            while !handle.is_finished() {
                if start.elapsed() >= JOIN_TIMEOUT {
                    log::warn!(
                        "worker {} did not finish within {}s during drop, thread may be leaked",
                        self.id,
                        JOIN_TIMEOUT.as_secs()
                    );
                    return;
                }
                thread::sleep(Duration::from_millis(10));
            }
            if handle.join().is_err() {
                log::error!("worker {} panicked during shutdown", self.id);
            }
        }
    }
}
