//! Convenient re-exports for common types and traits

pub use crate::core::{PoolError, Priority, PriorityQueue, Result, Task, TaskHandle, TaskOutcome};
pub use crate::pool::{
    DefaultStrategy, DispatchStrategy, Pool, PoolConfig, PoolStats, PoolStatus, Roster, Worker,
    WorkerStats, WorkerStatus,
};
