//! Tasks and their result handles

use crate::core::error::{panic_message, PoolError, Result};
use crate::core::priority::Priority;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::cmp::Ordering;
use std::fmt;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::time::Duration;

type Payload = Box<dyn FnOnce() + Send + 'static>;

/// A priority-tagged unit of work
///
/// Tasks compare by priority only. Two tasks of the same priority are equal
/// as far as ordering is concerned; the queues break such ties by arrival.
pub struct Task {
    payload: Payload,
    priority: Priority,
}

/// How a task invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The payload returned normally
    Completed,
    /// The payload panicked; the panic was contained
    Panicked(String),
}

impl Task {
    /// Create a task with the given priority
    pub fn new<F>(priority: Priority, payload: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            payload: Box::new(payload),
            priority,
        }
    }

    /// Create a task with [`Priority::Normal`]
    pub fn with_default_priority<F>(payload: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(Priority::default(), payload)
    }

    /// Get the task priority
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Run the payload exactly once
    ///
    /// A panic escaping the payload is caught here so it never unwinds into
    /// the worker loop.
    pub fn run(self) -> TaskOutcome {
        match catch_unwind(AssertUnwindSafe(self.payload)) {
            Ok(()) => TaskOutcome::Completed,
            Err(panic_info) => TaskOutcome::Panicked(panic_message(panic_info.as_ref())),
        }
    }

    /// Wrap a value-returning closure into a task plus the handle observing its result
    pub(crate) fn with_handle<F, R>(priority: Priority, f: F) -> (Self, TaskHandle<R>)
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (sender, receiver) = channel::bounded(1);
        // The caller may have dropped the handle; nobody is listening then
        let task = Self::new(priority, move || match catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                let _ = sender.send(Ok(value));
            }
            Err(panic_info) => {
                let message = panic_message(panic_info.as_ref());
                let _ = sender.send(Err(PoolError::payload_failure(message)));
                // Keep unwinding so `run` reports the task as panicked
                resume_unwind(panic_info);
            }
        });
        (task, TaskHandle { receiver })
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

/// Handle to the eventual result of a submitted task
///
/// Payload panics surface here as [`PoolError::PayloadFailure`]. If the task is
/// dropped without running, because the pool stopped or its worker was
/// terminated first, the handle resolves to [`PoolError::TaskDiscarded`].
/// A result is delivered once; later calls report `TaskDiscarded`.
#[derive(Debug)]
pub struct TaskHandle<R> {
    receiver: Receiver<Result<R>>,
}

impl<R> TaskHandle<R> {
    /// Block until the task has run and return its result
    pub fn wait(self) -> Result<R> {
        self.receiver
            .recv()
            .unwrap_or(Err(PoolError::TaskDiscarded))
    }

    /// Block for at most `timeout` waiting for the result
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Timeout`] if the task has not finished in time;
    /// the handle stays usable in that case.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<R> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(PoolError::timeout_after(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(PoolError::TaskDiscarded),
        }
    }

    /// Return the result if it is already available
    pub fn try_wait(&self) -> Option<Result<R>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PoolError::TaskDiscarded)),
        }
    }

    /// Check whether a result is waiting to be collected
    pub fn is_ready(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    #[test]
    fn test_task_runs_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let task = Task::with_default_priority(move || {
            counter_clone.fetch_add(1, AtomicOrdering::SeqCst);
        });

        assert_eq!(task.priority(), Priority::Normal);
        assert_eq!(task.run(), TaskOutcome::Completed);
        assert_eq!(counter.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_task_contains_panic() {
        let task = Task::new(Priority::High, || panic!("payload exploded"));
        assert_eq!(
            task.run(),
            TaskOutcome::Panicked("payload exploded".to_string())
        );
    }

    #[test]
    fn test_task_ordering_by_priority_only() {
        let low = Task::new(Priority::Low, || {});
        let high = Task::new(Priority::High, || {});
        let other_high = Task::new(Priority::High, || {});

        assert!(high > low);
        assert!(low < high);
        assert!(high >= other_high);
        assert!(high <= other_high);
        assert_eq!(high.cmp(&other_high), Ordering::Equal);
    }

    #[test]
    fn test_handle_receives_value() {
        let (task, handle) = Task::with_handle(Priority::Normal, || 2 + 3);
        assert!(!handle.is_ready());
        assert!(handle.try_wait().is_none());

        task.run();
        assert!(handle.is_ready());
        assert_eq!(handle.wait().unwrap(), 5);
    }

    #[test]
    fn test_handle_receives_payload_failure() {
        let (task, handle) = Task::with_handle(Priority::Normal, || -> u32 {
            panic!("division by zero")
        });

        // The handle gets the failure and the task still counts as panicked
        assert_eq!(
            task.run(),
            TaskOutcome::Panicked("division by zero".to_string())
        );
        match handle.wait() {
            Err(PoolError::PayloadFailure { message }) => assert_eq!(message, "division by zero"),
            other => panic!("expected PayloadFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_dropped_task_discards_handle() {
        let (task, handle) = Task::with_handle(Priority::Normal, || 1);
        drop(task);
        assert!(matches!(handle.wait(), Err(PoolError::TaskDiscarded)));
    }

    #[test]
    fn test_wait_timeout_keeps_handle_usable() {
        let (task, handle) = Task::with_handle(Priority::Normal, || "done");
        assert!(matches!(
            handle.wait_timeout(Duration::from_millis(10)),
            Err(PoolError::Timeout { timeout_ms: 10 })
        ));

        task.run();
        assert_eq!(handle.wait_timeout(Duration::from_secs(1)).unwrap(), "done");
    }
}
