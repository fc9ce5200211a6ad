//! Pool configuration

use crate::core::{PoolError, Result};
use crate::queue::{SubmitPolicy, DEFAULT_CAPACITY, DEFAULT_MAX_ENTRY_LEN};
use std::time::Duration;

/// Configuration for a worker pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads (0 = number of CPUs)
    pub num_workers: usize,
    /// Number of queue slots
    pub queue_capacity: usize,
    /// Byte limit of one encoded job
    pub max_entry_len: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Poll interval for workers. `None` (the default) makes workers block
    /// on the queue and rely on the wake-ups sent by `close`.
    pub poll_interval: Option<Duration>,
    /// What submit does when the queue is full.
    /// Default: Block
    pub submit_policy: SubmitPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            queue_capacity: DEFAULT_CAPACITY,
            max_entry_len: DEFAULT_MAX_ENTRY_LEN,
            thread_name_prefix: "worker".to_string(),
            poll_interval: None,
            submit_policy: SubmitPolicy::default(),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with specified number of workers
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: if num_workers == 0 {
                num_cpus::get()
            } else {
                num_workers
            },
            ..Default::default()
        }
    }

    /// Set the number of queue slots
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the byte limit of one encoded job
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_entry_len(mut self, len: usize) -> Self {
        self.max_entry_len = len;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Make workers poll the queue every `interval` instead of blocking.
    ///
    /// # Trade-offs
    ///
    /// - **Blocking** (default): no idle CPU, shutdown relies on the wake-ups from `close`
    /// - **Polling** (10-50ms): workers re-check the closed state on every timeout,
    ///   at the cost of periodic wake-ups
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set the policy for submitting into a full queue
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_submit_policy(mut self, policy: SubmitPolicy) -> Self {
        self.submit_policy = policy;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(PoolError::invalid_config(
                "num_workers",
                "Number of workers must be greater than 0",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::invalid_config(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }
        if self.max_entry_len == 0 {
            return Err(PoolError::invalid_config(
                "max_entry_len",
                "Entry length limit must be greater than 0",
            ));
        }
        if self.poll_interval.is_some_and(|d| d.is_zero()) {
            return Err(PoolError::invalid_config(
                "poll_interval",
                "Poll interval must be non-zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.num_workers, num_cpus::get());
        assert_eq!(config.queue_capacity, 1000);
        assert_eq!(config.max_entry_len, 255);
        assert!(config.poll_interval.is_none());
        assert_eq!(config.submit_policy, SubmitPolicy::Block);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_means_cpus() {
        assert_eq!(PoolConfig::new(0).num_workers, num_cpus::get());
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        let mut config = PoolConfig::new(2);
        config.num_workers = 0;
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfig { ref parameter, .. }) if parameter == "num_workers"
        ));

        let config = PoolConfig::new(2).with_queue_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfig { ref parameter, .. }) if parameter == "queue_capacity"
        ));

        let config = PoolConfig::new(2).with_max_entry_len(0);
        assert!(config.validate().is_err());

        let config = PoolConfig::new(2).with_poll_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfig { ref parameter, .. }) if parameter == "poll_interval"
        ));
    }
}
