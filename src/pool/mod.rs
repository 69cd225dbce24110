//! Pool, worker and strategy implementations

pub mod strategy;
pub mod thread_pool;
pub mod worker;

pub use strategy::{DefaultStrategy, DispatchStrategy, Roster};
pub use thread_pool::{default_parallelism, Pool, PoolConfig, PoolStats, PoolStatus};
pub use worker::{Worker, WorkerStats, WorkerStatus};
