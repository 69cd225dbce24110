//! Priority levels and the thread-safe priority queue
//!
//! [`PriorityQueue`] backs both the pool's central queue and every worker's
//! local queue. Items leave in descending `Ord` order; items that compare
//! equal leave in the order they were pushed.

use crate::core::error::{PoolError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Task priority levels (higher value = higher priority)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Priority {
    /// Background work that may wait indefinitely
    Lowest = 0,
    /// Less important than regular work
    Low = 1,
    /// Default for most tasks
    #[default]
    Normal = 2,
    /// Important tasks
    High = 3,
    /// Must leave the queue before everything else
    Highest = 4,
}

impl Priority {
    /// All levels, lowest first
    pub const ALL: [Priority; 5] = [
        Priority::Lowest,
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Highest,
    ];

    /// Get the numeric value of the priority
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

/// Heap entry: the item plus its insertion sequence for FIFO tie-breaking
struct Entry<T> {
    item: T,
    sequence: u64,
}

impl<T: Ord> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for Entry<T> {}

impl<T: Ord> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.item.cmp(&other.item) {
            // Earlier sequence wins; reversed because BinaryHeap is a max-heap
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}

struct Inner<T> {
    heap: BinaryHeap<Entry<T>>,
    next_sequence: u64,
}

/// Thread-safe, unbounded max-priority queue
///
/// Every operation takes the internal lock once, so no partially updated
/// heap is ever observable. [`len`](Self::len) and [`is_empty`](Self::is_empty)
/// are snapshots that may be stale as soon as they return.
pub struct PriorityQueue<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Ord> PriorityQueue<T> {
    /// Create a new empty priority queue
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new priority queue with the specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::with_capacity(capacity),
                next_sequence: 0,
            }),
        }
    }

    /// Push an item onto the queue
    pub fn push(&self, item: T) {
        let mut inner = self.inner.lock();
        let sequence = inner.next_sequence;
        inner.next_sequence = inner.next_sequence.wrapping_add(1);
        inner.heap.push(Entry { item, sequence });
    }

    /// Pop the highest priority item
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::EmptyQueue`] if the queue is empty.
    pub fn pop(&self) -> Result<T> {
        self.try_pop().ok_or(PoolError::EmptyQueue)
    }

    /// Pop the highest priority item, or `None` if the queue is empty
    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().heap.pop().map(|entry| entry.item)
    }

    /// Get the number of items in the queue
    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    /// Remove all items, returning how many were dropped
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut self.inner.lock().heap);
        // Items are dropped outside the lock; their destructors may run user code
        drained.len()
    }
}

impl<T: Ord> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for PriorityQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("len", &self.inner.lock().heap.len())
            .finish()
    }
}
