//! Error types for the adaptive thread system

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur in the adaptive thread system
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The pool is stopped and refuses new work
    #[error("Thread pool has been stopped")]
    PoolStopped,

    /// Pop on an empty priority queue
    ///
    /// The engine never pops without first observing a non-empty queue, so
    /// this only surfaces through direct use of [`PriorityQueue`](crate::core::PriorityQueue).
    #[error("Priority queue is empty")]
    EmptyQueue,

    /// The task payload panicked; the panic message is preserved
    #[error("Task payload panicked: {message}")]
    PayloadFailure {
        /// Panic message
        message: String,
    },

    /// The task was dropped before it ran (pool stopped or worker terminated)
    #[error("Task was discarded before execution")]
    TaskDiscarded,

    /// No result arrived within the requested time
    #[error("Timed out after {timeout_ms}ms waiting for task result")]
    Timeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Failed to spawn a worker or monitor thread
    #[error("Failed to spawn thread '{thread}': {message}")]
    SpawnError {
        /// Name of the thread that failed to spawn
        thread: String,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker or monitor thread
    #[error("Failed to join thread '{thread}': {message}")]
    JoinError {
        /// Name of the thread that failed to join
        thread: String,
        /// Error message
        message: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },
}

impl PoolError {
    /// Create a payload failure error
    pub fn payload_failure(message: impl Into<String>) -> Self {
        PoolError::PayloadFailure {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout_ms: u64) -> Self {
        PoolError::Timeout { timeout_ms }
    }

    /// Create a timeout error from the elapsed wait, saturating at `u64::MAX` ms
    pub fn timeout_after(timeout: std::time::Duration) -> Self {
        Self::timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    }

    /// Create a spawn error with source
    pub fn spawn(
        thread: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::SpawnError {
            thread: thread.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::JoinError {
            thread: thread.into(),
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PoolError::payload_failure("boom");
        assert!(matches!(err, PoolError::PayloadFailure { .. }));

        let err = PoolError::invalid_config("max_workers", "must be positive");
        assert!(matches!(err, PoolError::InvalidConfig { .. }));

        let err = PoolError::timeout(250);
        assert!(matches!(err, PoolError::Timeout { timeout_ms: 250 }));
    }

    #[test]
    fn test_timeout_after_saturates() {
        use std::time::Duration;

        let err = PoolError::timeout_after(Duration::from_micros(1500));
        assert!(matches!(err, PoolError::Timeout { timeout_ms: 1 }));

        // u64::MAX seconds is far more milliseconds than fit in a u64
        let err = PoolError::timeout_after(Duration::from_secs(u64::MAX));
        assert!(matches!(err, PoolError::Timeout { timeout_ms: u64::MAX }));

        let err = PoolError::timeout_after(Duration::MAX);
        assert!(matches!(err, PoolError::Timeout { timeout_ms: u64::MAX }));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PoolError::PoolStopped.to_string(),
            "Thread pool has been stopped"
        );

        let err = PoolError::payload_failure("index out of bounds");
        assert_eq!(err.to_string(), "Task payload panicked: index out of bounds");

        let err = PoolError::invalid_config("min_workers", "exceeds max_workers");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'min_workers': exceeds max_workers"
        );
    }

    #[test]
    fn test_spawn_error_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = PoolError::spawn("worker-5", "Cannot create thread", io_err);

        assert!(matches!(err, PoolError::SpawnError { .. }));
        assert_eq!(
            err.to_string(),
            "Failed to spawn thread 'worker-5': Cannot create thread"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "Unknown panic");
    }
}
