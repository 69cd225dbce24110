//! Pool controller
//!
//! Submissions enter a central [`PriorityQueue`]. A monitor thread wakes on
//! new work or every `monitor_interval`, lets the [`DispatchStrategy`] resize
//! the worker roster, then drains the tasks present at that moment, handing
//! each one to the strategy for placement on a worker's local queue.

use crate::core::error::panic_message;
use crate::core::{PoolError, Priority, PriorityQueue, Result, Task, TaskHandle};
use crate::pool::strategy::{DefaultStrategy, DispatchStrategy, Roster};
use crate::pool::worker::WorkerStats;
use parking_lot::{Condvar, Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Available hardware parallelism minus one, never less than one
pub fn default_parallelism() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// Lifecycle state of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolStatus {
    /// Accepting and executing tasks
    Running,
    /// Accepting and queueing tasks, executing none
    Paused,
    /// Not started yet, or stopped for good
    Stopped,
}

impl PoolStatus {
    /// Short display name: `"Running"`, `"Pause"` or `"Stop"`
    pub fn name(&self) -> &'static str {
        match self {
            PoolStatus::Running => "Running",
            PoolStatus::Paused => "Pause",
            PoolStatus::Stopped => "Stop",
        }
    }
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for a pool
#[derive(Clone)]
pub struct PoolConfig {
    /// Scale-down never goes below this many workers
    pub min_workers: usize,
    /// Workers created by [`Pool::start`]
    pub initial_workers: usize,
    /// Scale-up never goes above this many workers
    pub max_workers: usize,
    /// Longest the monitor sleeps between rescale cycles.
    /// Default: 100ms
    pub monitor_interval: Duration,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Placement and scaling policy (if None, uses [`DefaultStrategy`])
    strategy: Option<Arc<dyn DispatchStrategy>>,
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("min_workers", &self.min_workers)
            .field("initial_workers", &self.initial_workers)
            .field("max_workers", &self.max_workers)
            .field("monitor_interval", &self.monitor_interval)
            .field("thread_name_prefix", &self.thread_name_prefix)
            .field("strategy", &self.strategy.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_workers: 1,
            initial_workers: default_parallelism(),
            max_workers: default_parallelism(),
            monitor_interval: Duration::from_millis(100),
            thread_name_prefix: "worker".to_string(),
            strategy: None,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with explicit worker bounds
    #[must_use]
    pub fn new(min_workers: usize, initial_workers: usize, max_workers: usize) -> Self {
        Self {
            min_workers,
            initial_workers,
            max_workers,
            ..Default::default()
        }
    }

    /// Set the minimum worker count
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_min_workers(mut self, count: usize) -> Self {
        self.min_workers = count;
        self
    }

    /// Set the number of workers created at start
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_initial_workers(mut self, count: usize) -> Self {
        self.initial_workers = count;
        self
    }

    /// Set the maximum worker count
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_workers(mut self, count: usize) -> Self {
        self.max_workers = count;
        self
    }

    /// Set the monitor interval.
    ///
    /// This bounds how stale a rescale decision can be when no new work
    /// arrives, and how long paused submissions wait before being placed.
    ///
    /// # Panics
    ///
    /// Panics if interval is zero.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "monitor interval must be non-zero");
        self.monitor_interval = interval;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Replace the default placement and scaling policy
    ///
    /// # Example
    ///
    /// ```rust
    /// use adaptive_thread_system::prelude::*;
    /// use std::sync::Arc;
    ///
    /// let config = PoolConfig::new(1, 2, 4).with_strategy(Arc::new(DefaultStrategy::new()));
    /// assert!(config.validate().is_ok());
    /// ```
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_strategy(mut self, strategy: Arc<dyn DispatchStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(PoolError::invalid_config(
                "max_workers",
                "Maximum number of workers must be greater than 0",
            ));
        }
        if self.initial_workers == 0 {
            return Err(PoolError::invalid_config(
                "initial_workers",
                "Initial number of workers must be greater than 0",
            ));
        }
        if self.min_workers > self.max_workers {
            return Err(PoolError::invalid_config(
                "min_workers",
                format!(
                    "Minimum workers ({}) exceeds maximum workers ({})",
                    self.min_workers, self.max_workers
                ),
            ));
        }
        if self.initial_workers < self.min_workers || self.initial_workers > self.max_workers {
            return Err(PoolError::invalid_config(
                "initial_workers",
                format!(
                    "Initial workers ({}) must lie within [{}, {}]",
                    self.initial_workers, self.min_workers, self.max_workers
                ),
            ));
        }
        if self.monitor_interval.is_zero() {
            return Err(PoolError::invalid_config(
                "monitor_interval",
                "Monitor interval must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Point-in-time pool statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Pool status when sampled
    pub status: PoolStatus,
    /// Live workers
    pub worker_count: usize,
    /// Tasks in the central queue and every local queue
    pub pending_tasks: usize,
    /// Tasks accepted by `submit`
    pub tasks_submitted: u64,
    /// Tasks run to completion, including on retired workers
    pub tasks_executed: u64,
    /// Raw task payloads that panicked past their task boundary
    pub tasks_panicked: u64,
}

struct PoolState {
    status: PoolStatus,
    roster: Roster,
    started: bool,
}

struct Shared {
    config: PoolConfig,
    strategy: Arc<dyn DispatchStrategy>,
    state: RwLock<PoolState>,
    central: PriorityQueue<Task>,
    wakeup_lock: Mutex<()>,
    wakeup: Condvar,
    tasks_submitted: AtomicU64,
}

impl Shared {
    fn notify_monitor(&self) {
        let _guard = self.wakeup_lock.lock();
        self.wakeup.notify_all();
    }

    /// Block until there is work to place, the pool stops, or the interval elapses
    ///
    /// With `backoff` set, only a stop ends the wait early.
    fn wait_for_work(&self, backoff: bool) {
        let deadline = Instant::now() + self.config.monitor_interval;
        let mut guard = self.wakeup_lock.lock();
        loop {
            let status = self.state.read().status;
            if status == PoolStatus::Stopped
                || (!backoff && status == PoolStatus::Running && !self.central.is_empty())
            {
                return;
            }
            if self.wakeup.wait_until(&mut guard, deadline).timed_out() {
                return;
            }
        }
    }
}

/// An adaptive, priority-aware thread pool
///
/// # Lifecycle
///
/// A pool is created stopped. [`start`](Self::start) spawns the monitor and
/// the initial workers. [`pause`](Self::pause) keeps accepting work but stops
/// execution until [`resume`](Self::resume). [`stop`](Self::stop) is final: the
/// pool rejects work from then on and cannot be started again.
///
/// # Ordering
///
/// Tasks leave the central queue in priority order and each worker runs its
/// own queue in priority order. Tasks placed on different workers run
/// independently of each other.
///
/// # Example
///
/// ```rust
/// use adaptive_thread_system::prelude::*;
///
/// # fn main() -> Result<()> {
/// let pool = Pool::with_workers(1, 2, 4)?;
/// pool.start()?;
///
/// let sum = pool.submit(|| 2 + 3)?;
/// let urgent = pool.submit_with_priority(Priority::Highest, || "first")?;
///
/// assert_eq!(sum.wait()?, 5);
/// assert_eq!(urgent.wait()?, "first");
///
/// pool.stop()?;
/// assert!(matches!(pool.submit(|| ()), Err(PoolError::PoolStopped)));
/// # Ok(())
/// # }
/// ```
pub struct Pool {
    shared: Arc<Shared>,
    monitor: Mutex<Option<thread::JoinHandle<()>>>,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.shared.config)
            .field("status", &self.status())
            .field("worker_count", &self.worker_count())
            .field(
                "tasks_submitted",
                &self.shared.tasks_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl Pool {
    /// Create a pool with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool with the given worker bounds
    pub fn with_workers(min_workers: usize, initial_workers: usize, max_workers: usize) -> Result<Self> {
        Self::with_config(PoolConfig::new(min_workers, initial_workers, max_workers))
    }

    /// Create a pool with custom configuration
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let strategy: Arc<dyn DispatchStrategy> = match &config.strategy {
            Some(strategy) => Arc::clone(strategy),
            None => Arc::new(DefaultStrategy::new()),
        };
        let roster = Roster::new(config.thread_name_prefix.clone());

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                strategy,
                state: RwLock::new(PoolState {
                    status: PoolStatus::Stopped,
                    roster,
                    started: false,
                }),
                central: PriorityQueue::new(),
                wakeup_lock: Mutex::new(()),
                wakeup: Condvar::new(),
                tasks_submitted: AtomicU64::new(0),
            }),
            monitor: Mutex::new(None),
        })
    }

    /// Start the pool
    ///
    /// Spawns the monitor thread and `initial_workers` active workers. Calling
    /// it on a running or paused pool does nothing.
    ///
    /// # Errors
    ///
    /// - `PoolError::PoolStopped` - the pool was already stopped
    /// - `PoolError::SpawnError` - a thread could not be created; the pool
    ///   stays stopped and may be started again
    pub fn start(&self) -> Result<()> {
        let mut state = self.shared.state.write();
        match state.status {
            PoolStatus::Running | PoolStatus::Paused => return Ok(()),
            PoolStatus::Stopped if state.started => return Err(PoolError::PoolStopped),
            PoolStatus::Stopped => {}
        }

        let config = &self.shared.config;
        if let Err(e) = self.spawn_threads(&mut state.roster) {
            for worker in state.roster.take_all() {
                let _ = worker.terminate();
            }
            return Err(e);
        }

        state.status = PoolStatus::Running;
        state.started = true;

        log::info!(
            "pool '{}' started with {} workers (min {}, max {}, strategy {})",
            config.thread_name_prefix,
            state.roster.len(),
            config.min_workers,
            config.max_workers,
            self.shared.strategy.name()
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(state.roster.len(), self.shared.strategy.name());

        Ok(())
    }

    fn spawn_threads(&self, roster: &mut Roster) -> Result<()> {
        for _ in 0..self.shared.config.initial_workers {
            roster.spawn_worker()?;
        }

        let name = format!("{}-monitor", self.shared.config.thread_name_prefix);
        let shared = Arc::clone(&self.shared);
        let monitor = thread::Builder::new()
            .name(name.clone())
            .spawn(move || Self::monitor(shared))
            .map_err(|e| PoolError::spawn(name, "Cannot create monitor thread", e))?;
        *self.monitor.lock() = Some(monitor);
        Ok(())
    }

    /// Pause execution
    ///
    /// Every worker rests after its current task. Submissions are still
    /// accepted and placed on local queues, but nothing runs until
    /// [`resume`](Self::resume).
    pub fn pause(&self) {
        let mut state = self.shared.state.write();
        if state.status == PoolStatus::Running {
            state.status = PoolStatus::Paused;
            state.roster.rest_all();
            log::debug!("pool '{}' paused", self.shared.config.thread_name_prefix);
        }
    }

    /// Resume execution after [`pause`](Self::pause)
    pub fn resume(&self) {
        {
            let mut state = self.shared.state.write();
            if state.status != PoolStatus::Paused {
                return;
            }
            state.status = PoolStatus::Running;
            state.roster.activate_all();
        }
        log::debug!("pool '{}' resumed", self.shared.config.thread_name_prefix);
        self.shared.notify_monitor();
    }

    /// Stop the pool for good
    ///
    /// Clears the central queue, terminates every worker (dropping tasks they
    /// had not started) and joins the monitor. Handles of dropped tasks
    /// resolve to [`PoolError::TaskDiscarded`]. Once this returns no task is
    /// running, unless it was called from a task. Calling it again does
    /// nothing.
    pub fn stop(&self) -> Result<()> {
        let (workers, discarded) = {
            let mut state = self.shared.state.write();
            if state.status == PoolStatus::Stopped {
                // Never started: mark stopped for good
                state.started = true;
                return Ok(());
            }
            state.status = PoolStatus::Stopped;
            (state.roster.take_all(), self.shared.central.clear())
        };

        self.shared.notify_monitor();
        let mut result = self.join_monitor();

        for worker in &workers {
            if let Err(e) = worker.terminate() {
                log::error!("failed to terminate {}: {}", worker.name(), e);
                result = result.and(Err(e));
            }
        }

        let mut state = self.shared.state.write();
        for worker in &workers {
            state.roster.absorb_stats(worker);
        }
        let (executed, panicked) = state.roster.retired_totals();
        drop(state);

        log::info!(
            "pool '{}' stopped: {} tasks executed, {} panicked, {} discarded from central queue",
            self.shared.config.thread_name_prefix,
            executed,
            panicked,
            discarded
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_stop(executed, discarded);

        result
    }

    fn join_monitor(&self) -> Result<()> {
        let handle = self.monitor.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return Ok(());
            }
            let name = handle.thread().name().unwrap_or("monitor").to_string();
            handle
                .join()
                .map_err(|_| PoolError::join(name, "Monitor panicked"))?;
        }
        Ok(())
    }

    /// Submit a closure at [`Priority::Normal`]
    pub fn submit<F, R>(&self, f: F) -> Result<TaskHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_with_priority(Priority::default(), f)
    }

    /// Submit a closure at the given priority
    ///
    /// Returns a handle to the closure's eventual result. A panic in the
    /// closure is reported through the handle as
    /// [`PoolError::PayloadFailure`].
    ///
    /// # Errors
    ///
    /// - `PoolError::PoolStopped` - the pool is stopped; nothing was queued
    pub fn submit_with_priority<F, R>(&self, priority: Priority, f: F) -> Result<TaskHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (task, handle) = Task::with_handle(priority, f);
        {
            let state = self.shared.state.read();
            if state.status == PoolStatus::Stopped {
                return Err(PoolError::PoolStopped);
            }
            self.shared.central.push(task);
        }
        self.shared.tasks_submitted.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_submission(self.shared.central.len());

        self.shared.notify_monitor();
        Ok(handle)
    }

    /// Get the number of live workers
    pub fn worker_count(&self) -> usize {
        self.shared.state.read().roster.len()
    }

    /// Get the current status
    pub fn status(&self) -> PoolStatus {
        self.shared.state.read().status
    }

    /// Display name of a status: `"Running"`, `"Pause"` or `"Stop"`
    pub fn status_name(status: PoolStatus) -> &'static str {
        status.name()
    }

    /// Tasks waiting in the central queue plus every worker's local queue
    ///
    /// Tasks already running are not counted.
    pub fn pending_task_count(&self) -> usize {
        let state = self.shared.state.read();
        self.shared.central.len() + state.roster.pending_count()
    }

    /// Get the pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Get total number of tasks submitted
    pub fn total_tasks_submitted(&self) -> u64 {
        self.shared.tasks_submitted.load(Ordering::Relaxed)
    }

    /// Get statistics for all live workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.shared
            .state
            .read()
            .roster
            .iter()
            .map(|w| w.stats())
            .collect()
    }

    /// Get total tasks executed, including by workers since retired
    pub fn total_tasks_executed(&self) -> u64 {
        self.stats().tasks_executed
    }

    /// Take a statistics snapshot
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.read();
        let (mut executed, mut panicked) = state.roster.retired_totals();
        for worker in state.roster.iter() {
            let stats = worker.stats();
            executed += stats.get_tasks_executed();
            panicked += stats.get_tasks_panicked();
        }

        PoolStats {
            status: state.status,
            worker_count: state.roster.len(),
            pending_tasks: self.shared.central.len() + state.roster.pending_count(),
            tasks_submitted: self.total_tasks_submitted(),
            tasks_executed: executed,
            tasks_panicked: panicked,
        }
    }

    /// Monitor loop: rescale, then place every task present in the central queue
    fn monitor(shared: Arc<Shared>) {
        let config = &shared.config;
        let mut backoff = false;

        log::debug!("monitor for pool '{}' started", config.thread_name_prefix);

        loop {
            shared.wait_for_work(backoff);
            backoff = false;

            let mut state = shared.state.write();
            if state.status == PoolStatus::Stopped {
                break;
            }

            // A panicking strategy must not take the monitor down with it
            let incoming = shared.central.len();
            let rescaled = catch_unwind(AssertUnwindSafe(|| {
                shared.strategy.rescale(
                    config.min_workers,
                    config.max_workers,
                    incoming,
                    &mut state.roster,
                )
            }));
            match rescaled {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("rescale failed: {}", e),
                Err(panic_info) => log::error!(
                    "strategy {} panicked during rescale: {}",
                    shared.strategy.name(),
                    panic_message(panic_info.as_ref())
                ),
            }

            state.roster.reap_finished();

            if shared.central.is_empty() {
                continue;
            }

            // Tasks submitted during the drain wait for the next cycle
            let snapshot = shared.central.len();
            let mut rejected = Vec::new();
            let mut lost = 0;
            for _ in 0..snapshot {
                let task = match shared.central.pop() {
                    Ok(task) => task,
                    Err(e) => {
                        debug_assert!(false, "central queue shrank during drain: {}", e);
                        log::error!("central queue shrank during drain: {}", e);
                        break;
                    }
                };
                // The task is lost if dispatch panics; its handle reports TaskDiscarded
                let dispatched = catch_unwind(AssertUnwindSafe(|| {
                    shared.strategy.dispatch(&state.roster, task)
                }));
                match dispatched {
                    Ok(Ok(())) => {}
                    Ok(Err(task)) => rejected.push(task),
                    Err(panic_info) => {
                        lost += 1;
                        log::error!(
                            "strategy {} panicked during dispatch, task dropped: {}",
                            shared.strategy.name(),
                            panic_message(panic_info.as_ref())
                        );
                    }
                }
            }

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_dispatch(
                snapshot - rejected.len() - lost,
                state.roster.len(),
            );

            if lost > 0 {
                log::error!("{} tasks dropped by strategy {}", lost, shared.strategy.name());
            }

            if !rejected.is_empty() {
                log::warn!(
                    "{} tasks could not be placed on {} workers, requeued",
                    rejected.len(),
                    state.roster.len()
                );
                for task in rejected {
                    shared.central.push(task);
                }
                backoff = true;
            }
        }

        log::debug!("monitor for pool '{}' exiting", config.thread_name_prefix);
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        if self.status() != PoolStatus::Stopped {
            if let Err(e) = self.stop() {
                log::error!(
                    "failed to stop pool '{}' during drop: {}",
                    self.shared.config.thread_name_prefix,
                    e
                );
            }
        }
    }
}
