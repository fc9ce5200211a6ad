//! Worker pool and producer driver

use crate::core::{Job, PoolError, Result};
use crate::pool::config::PoolConfig;
use crate::pool::report::{AggregateResult, QueueSummary, RejectedJob};
use crate::pool::worker::{Worker, WorkerContext, WorkerEvent, WorkerStats};
use crate::queue::BoundedJobQueue;
use crate::transform::Transform;
use chrono::Utc;
use crossbeam_channel::{unbounded, Receiver};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A fixed set of workers consuming one shared [`BoundedJobQueue`].
///
/// The pool is started once, fed through [`submit`](Self::submit), then
/// [`close`](Self::close)d and joined with [`wait_all`](Self::wait_all).
/// The worker count does not change for the life of the pool.
///
/// # Example
///
/// ```rust
/// use cryptpool::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> Result<()> {
/// let transform = Arc::new(|job: &Job| -> std::result::Result<(), TransformError> {
///     println!("processing {}", job);
///     Ok(())
/// });
///
/// let pool = WorkerPool::start(PoolConfig::new(2).with_queue_capacity(4), transform)?;
/// for name in ["a.txt", "b.txt", "c.txt"] {
///     pool.submit(&Job::new(name, Action::Encrypt))?;
/// }
/// pool.close();
///
/// let result = pool.wait_all();
/// assert_eq!(result.jobs_succeeded(), 3);
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool {
    config: PoolConfig,
    queue: Arc<BoundedJobQueue>,
    workers: Vec<Worker>,
    events: Receiver<WorkerEvent>,
    rejected: Mutex<Vec<RejectedJob>>,
    started_at: chrono::DateTime<Utc>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("workers", &self.workers.len())
            .field("queued", &self.queue.len())
            .field("closed", &self.queue.is_closed())
            .finish()
    }
}

impl WorkerPool {
    /// Create the queue and spawn `config.num_workers` workers.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfig`] if the configuration does not validate
    /// - [`PoolError::SpawnError`] if a worker thread cannot be created; the
    ///   workers started before it are closed out and joined first
    pub fn start(config: PoolConfig, transform: Arc<dyn Transform>) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(
            BoundedJobQueue::with_entry_len(config.queue_capacity, config.max_entry_len)
                .with_submit_policy(config.submit_policy),
        );
        let (events_tx, events) = unbounded();

        let mut workers = Vec::with_capacity(config.num_workers);
        for id in 0..config.num_workers {
            let ctx = WorkerContext {
                queue: Arc::clone(&queue),
                transform: Arc::clone(&transform),
                events: events_tx.clone(),
                poll_interval: config.poll_interval,
            };
            let name = format!("{}-{}", config.thread_name_prefix, id);
            match Worker::spawn(id, name, ctx) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    warn!("Aborting pool start after {} workers: {}", workers.len(), e);
                    queue.close(workers.len());
                    for worker in workers {
                        worker.join();
                    }
                    return Err(e);
                }
            }
        }

        info!(
            "Pool started: {} workers ({}), queue capacity {}, transform {}",
            workers.len(),
            match config.poll_interval {
                Some(d) => format!("polling every {:?}", d),
                None => "blocking".to_string(),
            },
            config.queue_capacity,
            transform.name()
        );

        Ok(Self {
            config,
            queue,
            workers,
            events,
            rejected: Mutex::new(Vec::new()),
            started_at: Utc::now(),
        })
    }

    /// Submit one job, applying the configured submit policy.
    ///
    /// Jobs refused for job-specific reasons (too long, queue full, timed
    /// out) are recorded in the final result as rejected.
    ///
    /// # Errors
    ///
    /// - [`PoolError::EncodedTooLong`], [`PoolError::QueueFull`],
    ///   [`PoolError::SubmissionTimeout`] for this job only
    /// - [`PoolError::Closed`] after [`close`](Self::close)
    pub fn submit(&self, job: &Job) -> Result<()> {
        self.queue.submit(job).map_err(|e| {
            let err = PoolError::from(e);
            if !matches!(err, PoolError::Closed) {
                warn!("Rejected {}: {}", job, err);
                self.rejected.lock().push(RejectedJob {
                    job: job.clone(),
                    reason: err.to_string(),
                });
            }
            err
        })
    }

    /// Signal that no more jobs will be submitted.
    ///
    /// Workers finish whatever is queued and then exit.
    pub fn close(&self) {
        debug!("Closing queue with {} jobs left", self.queue.len());
        self.queue.close(self.workers.len());
    }

    /// The shared queue
    pub fn queue(&self) -> &Arc<BoundedJobQueue> {
        &self.queue
    }

    /// Get the number of workers
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Get statistics for all workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.workers.iter().map(|w| w.stats()).collect()
    }

    /// Block until every worker has exited and collect the outcome.
    ///
    /// Closes the queue first if [`close`](Self::close) has not been called,
    /// so this never waits on a producer that is gone.
    pub fn wait_all(mut self) -> AggregateResult {
        if !self.queue.is_closed() {
            self.close();
        }

        let mut workers = BTreeMap::new();
        for worker in std::mem::take(&mut self.workers) {
            let id = worker.id();
            workers.insert(id, worker.join());
        }

        let mut records = Vec::new();
        let mut malformed = Vec::new();
        for event in self.events.try_iter() {
            match event {
                WorkerEvent::Finished(record) => records.push(record),
                WorkerEvent::Malformed(entry) => malformed.push(entry),
            }
        }

        let result = AggregateResult {
            started_at: self.started_at,
            finished_at: Utc::now(),
            records,
            rejected: std::mem::take(&mut *self.rejected.lock()),
            malformed,
            workers,
            queue: QueueSummary {
                capacity: self.queue.capacity(),
                high_water_mark: self.queue.high_water_mark(),
                submit: self.queue.submit_stats(),
            },
        };

        info!(
            "Batch finished: {} submitted, {} succeeded, {} failed",
            result.jobs_submitted(),
            result.jobs_succeeded(),
            result.failures().count()
        );
        result
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Workers block on the queue; let them out before their own Drop joins
        if !self.workers.is_empty() {
            self.queue.close(self.workers.len());
        }
    }
}

/// Run a whole batch: start the pool, submit every job, close, and join.
///
/// Submission blocks while the queue is full (unless the config picks a
/// non-blocking policy). Per-job submit failures are recorded as rejected
/// and do not stop the batch.
///
/// # Errors
///
/// Only structural failures are returned: an invalid config or a worker
/// thread that could not be spawned.
pub fn run_batch<I>(
    config: PoolConfig,
    jobs: I,
    transform: Arc<dyn Transform>,
) -> Result<AggregateResult>
where
    I: IntoIterator<Item = Job>,
{
    let pool = WorkerPool::start(config, transform)?;

    for job in jobs {
        match pool.submit(&job) {
            Ok(()) => {}
            // Only reachable if someone else closed the queue
            Err(PoolError::Closed) => {
                warn!("Queue closed while submitting; remaining jobs dropped");
                break;
            }
            Err(_) => {}
        }
    }

    pool.close();
    Ok(pool.wait_all())
}
