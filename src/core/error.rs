//! Error types for the worker pool

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur while running a batch
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// A job string could not be decoded
    #[error("Malformed job '{input}': {reason}")]
    MalformedJob {
        /// The raw text that failed to decode
        input: String,
        /// Why decoding failed
        reason: String,
    },

    /// An encoded job does not fit into a queue slot
    #[error("Encoded job is {len} bytes, slot limit is {max} bytes")]
    EncodedTooLong {
        /// Encoded length in bytes
        len: usize,
        /// Slot capacity in bytes
        max: usize,
    },

    /// Queue is full and the submit policy does not wait
    #[error("Job queue is full: {current}/{max} jobs queued")]
    QueueFull {
        /// Current queue size
        current: usize,
        /// Maximum queue size
        max: usize,
    },

    /// Job submission timed out waiting for a free slot
    #[error("Job submission timed out after {timeout_ms}ms")]
    SubmissionTimeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// The queue was closed by the producer
    #[error("Job queue is closed")]
    Closed,

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{worker_id}: {message}")]
    SpawnError {
        /// ID of the worker that failed to spawn
        worker_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },
}

impl PoolError {
    /// Create a malformed job error
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        PoolError::MalformedJob {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an encoded-too-long error
    pub fn encoded_too_long(len: usize, max: usize) -> Self {
        PoolError::EncodedTooLong { len, max }
    }

    /// Create a queue full error
    pub fn queue_full(current: usize, max: usize) -> Self {
        PoolError::QueueFull { current, max }
    }

    /// Create a submission timeout error
    pub fn submission_timeout(timeout_ms: u64) -> Self {
        PoolError::SubmissionTimeout { timeout_ms }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        worker_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::SpawnError {
            worker_id,
            message: message.into(),
            source: Some(source),
        }
    }
}
