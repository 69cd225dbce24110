//! Core types for the adaptive thread system

pub mod error;
pub mod priority;
pub mod task;

pub use error::{PoolError, Result};
pub use priority::{Priority, PriorityQueue};
pub use task::{Task, TaskHandle, TaskOutcome};
