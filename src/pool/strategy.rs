//! Task placement and autoscaling policies
//!
//! The pool drives a [`DispatchStrategy`] from its monitor thread: once per
//! cycle it calls [`rescale`](DispatchStrategy::rescale), then hands every task
//! drained from the central queue to [`dispatch`](DispatchStrategy::dispatch).
//! [`DefaultStrategy`] places each task on the least-loaded worker and sizes
//! the roster from idle and backlog counts.

use crate::core::{Result, Task};
use crate::pool::worker::Worker;
use std::ops::Deref;
use std::sync::Arc;

/// Placement and scaling policy used by the pool
///
/// Implementations are shared with the monitor thread, so they must be
/// `Send + Sync`. Both methods run while the pool's roster lock is held.
pub trait DispatchStrategy: Send + Sync {
    /// Place `task` on one of `workers`
    ///
    /// # Errors
    ///
    /// Hands the task back when no worker can take it; the pool puts it back
    /// on the central queue for the next cycle.
    fn dispatch(&self, workers: &[Arc<Worker>], task: Task) -> std::result::Result<(), Task>;

    /// Grow or shrink `roster` given `incoming` tasks waiting in the central queue
    ///
    /// Implementations must keep the roster within `[min_workers, max_workers]`
    /// when it starts inside those bounds.
    fn rescale(
        &self,
        min_workers: usize,
        max_workers: usize,
        incoming: usize,
        roster: &mut Roster,
    ) -> Result<()>;

    /// Get the strategy name for logging
    fn name(&self) -> &str {
        "DispatchStrategy"
    }
}

impl std::fmt::Debug for dyn DispatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DispatchStrategy({})", self.name())
    }
}

/// The pool's live workers
///
/// Strategies add workers with [`spawn_worker`](Self::spawn_worker) and remove
/// them with [`retire`](Self::retire). Workers spawned while the pool is
/// paused start resting.
#[derive(Debug)]
pub struct Roster {
    workers: Vec<Arc<Worker>>,
    // Told to terminate, thread not joined yet
    retiring: Vec<Arc<Worker>>,
    next_id: usize,
    thread_name_prefix: String,
    resting: bool,
    retired_executed: u64,
    retired_panicked: u64,
}

impl Roster {
    /// Create an empty roster whose worker threads are named `<prefix>-<id>`
    pub fn new(thread_name_prefix: impl Into<String>) -> Self {
        Self {
            workers: Vec::new(),
            retiring: Vec::new(),
            next_id: 0,
            thread_name_prefix: thread_name_prefix.into(),
            resting: false,
            retired_executed: 0,
            retired_panicked: 0,
        }
    }

    /// Start a new worker and add it to the roster
    pub fn spawn_worker(&mut self) -> Result<Arc<Worker>> {
        let id = self.next_id;
        let worker = if self.resting {
            Worker::new_resting(id, &self.thread_name_prefix)?
        } else {
            Worker::new(id, &self.thread_name_prefix)?
        };
        self.next_id += 1;

        let worker = Arc::new(worker);
        self.workers.push(Arc::clone(&worker));
        Ok(worker)
    }

    /// Remove the worker at `index` and tell it to terminate
    ///
    /// Its queued tasks are dropped at once. A task it is running finishes
    /// normally; the pool joins the thread once it has exited.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn retire(&mut self, index: usize) {
        let worker = self.workers.remove(index);
        worker.signal_terminate();
        self.retiring.push(worker);
    }

    /// Put every worker to rest; workers spawned from now on start resting
    pub(crate) fn rest_all(&mut self) {
        self.resting = true;
        for worker in &self.workers {
            worker.rest();
        }
    }

    /// Activate every worker; workers spawned from now on start active
    pub(crate) fn activate_all(&mut self) {
        self.resting = false;
        for worker in &self.workers {
            worker.activate();
        }
    }

    /// Remove every worker, live or retiring, without terminating it
    pub(crate) fn take_all(&mut self) -> Vec<Arc<Worker>> {
        let mut workers = std::mem::take(&mut self.workers);
        workers.append(&mut self.retiring);
        workers
    }

    /// Join retired workers whose threads have exited and keep their counters
    ///
    /// Workers still finishing a task stay in the retiring list for a later
    /// call, so this never blocks.
    pub(crate) fn reap_finished(&mut self) -> usize {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.retiring)
            .into_iter()
            .partition(|worker| worker.is_finished());
        self.retiring = running;

        for worker in &finished {
            if let Err(e) = worker.terminate() {
                log::error!("failed to join retired {}: {}", worker.name(), e);
            }
            self.absorb_stats(worker);
        }
        finished.len()
    }

    /// Number of retired workers not yet joined
    pub fn retiring_count(&self) -> usize {
        self.retiring.len()
    }

    /// Tasks executed and panicked by workers no longer in the roster
    pub fn retired_totals(&self) -> (u64, u64) {
        self.retiring.iter().fold(
            (self.retired_executed, self.retired_panicked),
            |(executed, panicked), worker| {
                let stats = worker.stats();
                (
                    executed + stats.get_tasks_executed(),
                    panicked + stats.get_tasks_panicked(),
                )
            },
        )
    }

    /// Tasks waiting across every worker's local queue
    pub fn pending_count(&self) -> usize {
        self.workers.iter().map(|w| w.pending_count()).sum()
    }

    /// Fold a removed worker's counters into the retired totals
    pub(crate) fn absorb_stats(&mut self, worker: &Worker) {
        let stats = worker.stats();
        self.retired_executed += stats.get_tasks_executed();
        self.retired_panicked += stats.get_tasks_panicked();
    }
}

impl Deref for Roster {
    type Target = [Arc<Worker>];

    fn deref(&self) -> &Self::Target {
        &self.workers
    }
}

/// Index of the worker with the fewest pending tasks; the first one wins ties
fn least_loaded(workers: &[Arc<Worker>]) -> Option<usize> {
    workers
        .iter()
        .enumerate()
        .min_by_key(|(_, worker)| worker.pending_count())
        .map(|(index, _)| index)
}

/// Least-loaded placement with idle/backlog autoscaling
///
/// - Scale down when at least half the workers are idle (and more than one
///   worker is allowed): retire `min(idle / 2, len - min_workers)` of the least
///   loaded workers.
/// - Scale up when no worker is idle and the backlog exceeds twice
///   `max_workers`: add `min(max_workers - len, (len + 1) / 2)` workers.
///
/// A worker is idle when its local queue is empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStrategy;

impl DefaultStrategy {
    /// Create the default strategy
    pub fn new() -> Self {
        Self
    }
}

impl DispatchStrategy for DefaultStrategy {
    fn dispatch(&self, workers: &[Arc<Worker>], task: Task) -> std::result::Result<(), Task> {
        match least_loaded(workers) {
            Some(index) => workers[index].enqueue(task),
            None => Err(task),
        }
    }

    fn rescale(
        &self,
        min_workers: usize,
        max_workers: usize,
        incoming: usize,
        roster: &mut Roster,
    ) -> Result<()> {
        let idle = roster.iter().filter(|w| !w.is_busy()).count();
        let backlog = incoming + roster.pending_count();
        let size = roster.len();

        if idle >= size / 2 && max_workers > 1 {
            let remove = (idle / 2).min(size.saturating_sub(min_workers));
            for _ in 0..remove {
                let Some(index) = least_loaded(roster) else {
                    break;
                };
                roster.retire(index);
            }
            if remove > 0 {
                log::debug!(
                    "rescale: retired {} workers ({} idle, {} remaining)",
                    remove,
                    idle,
                    roster.len()
                );
            }
        }

        if idle == 0 && backlog > max_workers.saturating_mul(2) {
            let size = roster.len();
            let add = max_workers.saturating_sub(size).min((size + 1) / 2);
            for _ in 0..add {
                roster.spawn_worker()?;
            }
            if add > 0 {
                log::debug!(
                    "rescale: added {} workers (backlog {}, now {})",
                    add,
                    backlog,
                    roster.len()
                );
            }
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_rescale(size, roster.len(), backlog);

        Ok(())
    }

    fn name(&self) -> &str {
        "DefaultStrategy"
    }
}
