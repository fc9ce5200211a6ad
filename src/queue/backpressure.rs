//! Submission policies for a full queue.
//!
//! # Policies
//!
//! - [`SubmitPolicy::Block`]: Block until a slot is free (default)
//! - [`SubmitPolicy::BlockWithTimeout`]: Block with timeout, return error if exceeded
//! - [`SubmitPolicy::RejectImmediately`]: Return error immediately if the queue is full
//!
//! # Example
//!
//! ```rust
//! use cryptpool::prelude::*;
//! use std::time::Duration;
//!
//! let config = PoolConfig::new(4)
//!     .with_queue_capacity(64)
//!     .with_submit_policy(SubmitPolicy::BlockWithTimeout(Duration::from_secs(5)));
//! assert!(config.validate().is_ok());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// What `submit` does when every slot is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPolicy {
    /// Block until a slot is free.
    #[default]
    Block,

    /// Block with timeout, return error if exceeded.
    BlockWithTimeout(Duration),

    /// Return error immediately if the queue is full.
    RejectImmediately,
}

/// Counters for submission outcomes.
#[derive(Debug, Default)]
pub struct SubmitStats {
    /// Jobs written into the queue
    jobs_submitted: AtomicU64,
    /// Jobs rejected because the queue was full
    jobs_rejected: AtomicU64,
    /// Submissions that gave up after a timeout
    timeout_events: AtomicU64,
    /// Submissions that had to wait for a free slot
    blocked_submissions: AtomicU64,
}

impl SubmitStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful job submission.
    pub fn record_submission(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a job rejection.
    pub fn record_rejection(&self) {
        self.jobs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a timeout event.
    pub fn record_timeout(&self) {
        self.timeout_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a submission that found the queue full and waited.
    pub fn record_blocked(&self) {
        self.blocked_submissions.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> SubmitStatsSnapshot {
        SubmitStatsSnapshot {
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_rejected: self.jobs_rejected.load(Ordering::Relaxed),
            timeout_events: self.timeout_events.load(Ordering::Relaxed),
            blocked_submissions: self.blocked_submissions.load(Ordering::Relaxed),
        }
    }
}

/// A snapshot of submission statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct SubmitStatsSnapshot {
    /// Jobs written into the queue
    pub jobs_submitted: u64,
    /// Jobs rejected because the queue was full
    pub jobs_rejected: u64,
    /// Submissions that gave up after a timeout
    pub timeout_events: u64,
    /// Submissions that had to wait for a free slot
    pub blocked_submissions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_policy_default() {
        assert_eq!(SubmitPolicy::default(), SubmitPolicy::Block);
    }

    #[test]
    fn test_submit_stats() {
        let stats = SubmitStats::new();

        stats.record_submission();
        stats.record_submission();
        stats.record_blocked();
        stats.record_rejection();
        stats.record_timeout();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.jobs_submitted, 2);
        assert_eq!(snapshot.blocked_submissions, 1);
        assert_eq!(snapshot.jobs_rejected, 1);
        assert_eq!(snapshot.timeout_events, 1);
    }
}
