//! # Adaptive Thread System
//!
//! A priority-aware thread pool that grows and shrinks its worker set with load.
//!
//! ## Features
//!
//! - **Priorities**: Five task priorities; higher ones leave every queue first
//! - **Per-worker Queues**: A monitor thread drains the central queue onto the
//!   least-loaded worker
//! - **Autoscaling**: Workers are added under backlog and retired when idle,
//!   within configured bounds
//! - **Pluggable Policy**: Placement and scaling live behind [`DispatchStrategy`]
//! - **Result Handles**: Every submission returns a [`TaskHandle`]; payload
//!   panics surface there instead of killing workers
//! - **Pause and Resume**: Stop execution without losing queued work
//!
//! ## Quick Start
//!
//! ```rust
//! use adaptive_thread_system::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // 1 to 4 workers, starting with 2
//! let pool = Pool::with_workers(1, 2, 4)?;
//! pool.start()?;
//!
//! let handles: Vec<_> = (0..10)
//!     .map(|i| pool.submit(move || i * i))
//!     .collect::<Result<_>>()?;
//!
//! let total: i32 = handles.into_iter().map(|h| h.wait()).sum::<Result<i32>>()?;
//! assert_eq!(total, 285);
//!
//! pool.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use adaptive_thread_system::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let config = PoolConfig::new(2, 2, 8)
//!     .with_monitor_interval(Duration::from_millis(50))
//!     .with_thread_name_prefix("ingest");
//!
//! let pool = Pool::with_config(config)?;
//! pool.start()?;
//! # pool.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Priorities
//!
//! ```rust
//! use adaptive_thread_system::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = Pool::with_workers(1, 1, 1)?;
//! pool.start()?;
//!
//! let flush = pool.submit_with_priority(Priority::Highest, || "flushed")?;
//! let report = pool.submit_with_priority(Priority::Lowest, || "reported")?;
//!
//! assert_eq!(flush.wait()?, "flushed");
//! assert_eq!(report.wait()?, "reported");
//! # pool.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Statistics
//!
//! ```rust
//! use adaptive_thread_system::prelude::*;
//!
//! # fn main() -> Result<()> {
//! # let pool = Pool::with_workers(1, 2, 2)?;
//! # pool.start()?;
//! # for _ in 0..10 {
//! #     pool.submit(|| ())?.wait()?;
//! # }
//! let stats = pool.stats();
//! println!(
//!     "{} workers, {} submitted, {} pending",
//!     stats.worker_count, stats.tasks_submitted, stats.pending_tasks
//! );
//!
//! for (i, stat) in pool.get_stats().iter().enumerate() {
//!     println!("Worker {}: {} tasks executed", i, stat.get_tasks_executed());
//! }
//! # pool.stop()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod tracing;

pub use core::{PoolError, Priority, PriorityQueue, Result, Task, TaskHandle, TaskOutcome};
pub use pool::{
    default_parallelism, DefaultStrategy, DispatchStrategy, Pool, PoolConfig, PoolStats,
    PoolStatus, Roster, Worker, WorkerStats, WorkerStatus,
};
