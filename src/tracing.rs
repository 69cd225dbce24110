//! Tracing integration for observability.
//!
//! With the `tracing` feature enabled, workers run inside a `worker` span and
//! the pool emits the events in [`metrics`]. Without it, everything here
//! compiles down to plain closures and the crate logs through `log` only.
//!
//! # Example
//!
//! ```rust,ignore
//! use adaptive_thread_system::prelude::*;
//! use adaptive_thread_system::tracing::in_current_span;
//!
//! let pool = Pool::with_workers(1, 2, 4)?;
//! pool.start()?;
//!
//! let span = tracing::info_span!("request", id = 42);
//! let _guard = span.enter();
//!
//! // The closure runs inside `request` on the worker thread
//! pool.submit(in_current_span(|| tracing::info!("handled")))?;
//! ```

#[cfg(feature = "tracing")]
use crate::core::TaskOutcome;
#[cfg(feature = "tracing")]
use std::time::Duration;

/// Wrap a task closure so it runs inside the span current at the call site.
///
/// The span is captured when this is called, typically right before
/// submission, and entered on the worker thread for the duration of `f`.
#[cfg(feature = "tracing")]
pub fn in_current_span<F, R>(f: F) -> impl FnOnce() -> R + Send + 'static
where
    F: FnOnce() -> R + Send + 'static,
    R: 'static,
{
    let span = ::tracing::Span::current();
    move || span.in_scope(f)
}

/// Wrap a task closure so it runs inside the span current at the call site.
///
/// Without the `tracing` feature there is no span to carry and `f` is
/// returned as is.
#[cfg(not(feature = "tracing"))]
pub fn in_current_span<F, R>(f: F) -> impl FnOnce() -> R + Send + 'static
where
    F: FnOnce() -> R + Send + 'static,
    R: 'static,
{
    f
}

/// Metrics recording functions for observability.
///
/// These functions emit tracing events that can be consumed by
/// metrics collection systems like Prometheus via tracing-opentelemetry.
#[cfg(feature = "tracing")]
pub mod metrics {
    use super::*;

    /// Records a task submission event.
    #[inline]
    pub fn record_submission(queue_depth: usize) {
        ::tracing::trace!(
            counter.tasks_submitted = 1,
            gauge.central_queue_depth = queue_depth as i64,
            "task submitted"
        );
    }

    /// Records one monitor drain of the central queue.
    #[inline]
    pub fn record_dispatch(placed: usize, workers: usize) {
        ::tracing::trace!(
            counter.tasks_dispatched = placed as u64,
            gauge.workers = workers as i64,
            "central queue drained"
        );
    }

    /// Records a rescale decision.
    #[inline]
    pub fn record_rescale(before: usize, after: usize, backlog: usize) {
        if before != after {
            ::tracing::debug!(
                gauge.workers = after as i64,
                before = before,
                backlog = backlog,
                "worker roster resized"
            );
        }
    }

    /// Records task completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration, outcome: &TaskOutcome) {
        let duration_ms = duration.as_millis() as u64;
        match outcome {
            TaskOutcome::Completed => ::tracing::trace!(
                counter.tasks_completed = 1,
                histogram.task_duration_ms = duration_ms,
                "task completed"
            ),
            TaskOutcome::Panicked(message) => ::tracing::trace!(
                counter.tasks_panicked = 1,
                histogram.task_duration_ms = duration_ms,
                panic = message.as_str(),
                "task panicked"
            ),
        }
    }

    /// Records worker becoming busy.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        ::tracing::trace!(gauge.workers_busy = 1, worker_id = worker_id, "worker busy");
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        ::tracing::trace!(
            gauge.workers_busy = -1i64,
            worker_id = worker_id,
            "worker idle"
        );
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(num_workers: usize, strategy: &str) {
        ::tracing::info!(
            workers = num_workers,
            strategy = strategy,
            "thread pool started"
        );
    }

    /// Records pool stop.
    #[inline]
    pub fn record_pool_stop(tasks_executed: u64, tasks_discarded: usize) {
        ::tracing::info!(
            tasks_executed = tasks_executed,
            tasks_discarded = tasks_discarded as u64,
            "thread pool stopped"
        );
    }
}
