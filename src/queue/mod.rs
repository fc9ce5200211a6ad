//! The shared job queue and its synchronization pieces.
//!
//! - [`BoundedJobQueue`]: fixed-capacity FIFO of encoded jobs shared by the
//!   producer and every worker
//! - [`Semaphore`]: the counting primitive behind the free-slot and
//!   available-item resources
//! - [`ShutdownSignal`]: the producer-finished flag
//! - [`SubmitPolicy`]: what `submit` does when the queue is full
//!
//! # Example
//!
//! ```rust
//! use cryptpool::core::{Action, Job};
//! use cryptpool::queue::{BoundedJobQueue, QueueError};
//!
//! let queue = BoundedJobQueue::new(2);
//! queue.submit(&Job::new("a.txt", Action::Encrypt)).unwrap();
//! queue.close(1);
//!
//! assert_eq!(queue.take().unwrap().target(), "a.txt");
//! assert!(matches!(queue.take(), Err(QueueError::Closed)));
//! ```

mod backpressure;
mod bounded;
mod semaphore;
mod shutdown;

pub use backpressure::{SubmitPolicy, SubmitStats, SubmitStatsSnapshot};
pub use bounded::{BoundedJobQueue, DEFAULT_CAPACITY, DEFAULT_MAX_ENTRY_LEN};
pub use semaphore::Semaphore;
pub use shutdown::ShutdownSignal;

use crate::core::PoolError;

/// Errors at the queue boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Queue is full and the caller asked not to wait
    #[error("queue is full ({capacity} slots)")]
    Full {
        /// Slot count of the queue
        capacity: usize,
    },
    /// No item arrived within the wait, but more may still come
    #[error("queue is empty")]
    Empty,
    /// Submission gave up waiting for a free slot
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout {
        /// How long the caller waited
        timeout_ms: u64,
    },
    /// The producer has finished and the queue is drained (or, for submit,
    /// the queue no longer accepts jobs)
    #[error("queue is closed")]
    Closed,
    /// Encoded job does not fit in a slot
    #[error("encoded job is {len} bytes, slot limit is {max}")]
    EncodedTooLong {
        /// Encoded length in bytes
        len: usize,
        /// Slot capacity in bytes
        max: usize,
    },
    /// A job that cannot be encoded losslessly, or a slot that does not
    /// decode to a job
    #[error("malformed job '{raw}': {reason}")]
    Malformed {
        /// Slot contents
        raw: String,
        /// Why decoding failed
        reason: String,
    },
}

/// Result type for queue operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;

impl From<QueueError> for PoolError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Full { capacity } => PoolError::queue_full(capacity, capacity),
            QueueError::Timeout { timeout_ms } => PoolError::submission_timeout(timeout_ms),
            QueueError::EncodedTooLong { len, max } => PoolError::encoded_too_long(len, max),
            QueueError::Malformed { raw, reason } => PoolError::malformed(raw, reason),
            // Empty is retried inside the worker loop and never reaches callers
            QueueError::Empty | QueueError::Closed => PoolError::Closed,
        }
    }
}
