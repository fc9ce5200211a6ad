//! Worker thread implementation

use crate::core::{Job, PoolError, Result};
use crate::pool::report::{JobRecord, JobStatus, MalformedEntry, WorkerExit, WorkerReport};
use crate::queue::{BoundedJobQueue, QueueError};
use crate::transform::Transform;
use crossbeam_channel::Sender;
use log::{debug, error, warn};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs that succeeded
    pub jobs_processed: AtomicU64,
    /// Total number of jobs that failed (including undecodable slots)
    pub jobs_failed: AtomicU64,
    /// Total number of jobs that panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent processing jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs processed counter
    pub fn increment_processed(&self) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs failed counter
    pub fn increment_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Copy the counters
    pub fn snapshot(&self) -> WorkerStatSnapshot {
        WorkerStatSnapshot {
            jobs_processed: self.get_jobs_processed(),
            jobs_failed: self.get_jobs_failed(),
            jobs_panicked: self.get_jobs_panicked(),
            total_processing_time_us: self.total_processing_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`WorkerStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorkerStatSnapshot {
    /// Jobs that succeeded
    pub jobs_processed: u64,
    /// Jobs that failed
    pub jobs_failed: u64,
    /// Jobs that panicked
    pub jobs_panicked: u64,
    /// Time spent in the transform (microseconds)
    pub total_processing_time_us: u64,
}

impl WorkerStatSnapshot {
    /// Jobs this worker took off the queue
    pub fn jobs_taken(&self) -> u64 {
        self.jobs_processed + self.jobs_failed + self.jobs_panicked
    }

    /// Get average processing time per job in microseconds
    pub fn average_processing_time_us(&self) -> f64 {
        let count = self.jobs_taken();
        if count > 0 {
            self.total_processing_time_us as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// Message from a worker to the pool
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    Finished(JobRecord),
    Malformed(MalformedEntry),
}

/// Everything a worker thread needs
pub(crate) struct WorkerContext {
    pub queue: Arc<BoundedJobQueue>,
    pub transform: Arc<dyn Transform>,
    pub events: Sender<WorkerEvent>,
    pub poll_interval: Option<Duration>,
}

/// A worker thread that takes jobs from the queue until it is closed and drained
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Create and start a new worker
    pub(crate) fn spawn(id: usize, name: String, ctx: WorkerContext) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || Self::run(id, ctx, &stats_clone))
            .map_err(|e| PoolError::spawn_with_source(id, "Cannot create worker thread", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the thread to exit and report how it ended
    pub fn join(mut self) -> WorkerReport {
        let exit = match self.thread.take().map(|t| t.join()) {
            Some(Err(panic_info)) => {
                let message = panic_message(panic_info.as_ref());
                error!("Worker {} crashed: {}", self.id, message);
                WorkerExit::Panicked(message)
            }
            _ => WorkerExit::Clean,
        };
        WorkerReport {
            exit,
            stats: self.stats.snapshot(),
        }
    }

    /// Main worker loop
    ///
    /// Runs until the queue reports `Closed`, which only happens once the
    /// producer has finished and every queued job has been taken.
    fn run(id: usize, ctx: WorkerContext, stats: &WorkerStats) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("worker", id = id).entered();

        debug!("Worker {} started", id);

        loop {
            let next = match ctx.poll_interval {
                Some(interval) => ctx.queue.take_timeout(interval),
                None => ctx.queue.take(),
            };

            match next {
                Ok(job) => Self::execute_job(id, job, &ctx, stats),
                Err(QueueError::Empty) => continue,
                Err(QueueError::Closed) => break,
                Err(QueueError::Malformed { raw, reason }) => {
                    warn!("Worker {}: skipping malformed job '{}': {}", id, raw, reason);
                    stats.increment_failed();
                    let _ = ctx.events.send(WorkerEvent::Malformed(MalformedEntry {
                        worker_id: id,
                        raw,
                        reason,
                    }));
                }
                Err(e) => {
                    error!("Worker {}: unexpected queue error: {}", id, e);
                    break;
                }
            }
        }

        debug!(
            "Worker {} shutting down ({} ok, {} failed, {} panicked)",
            id,
            stats.get_jobs_processed(),
            stats.get_jobs_failed(),
            stats.get_jobs_panicked()
        );
    }

    /// Execute a single job with panic protection
    fn execute_job(id: usize, job: Job, ctx: &WorkerContext, stats: &WorkerStats) {
        let start = Instant::now();

        let panic_result = catch_unwind(AssertUnwindSafe(|| ctx.transform.apply(&job)));

        let elapsed_us = start.elapsed().as_micros() as u64;

        let status = match panic_result {
            Ok(Ok(())) => {
                stats.increment_processed();
                debug!("Worker {}: {} done in {}us", id, job, elapsed_us);
                JobStatus::Succeeded
            }
            Ok(Err(e)) => {
                warn!("Worker {}: {} failed: {}", id, job, e);
                stats.increment_failed();
                JobStatus::Failed(e.to_string())
            }
            Err(panic_info) => {
                let message = panic_message(panic_info.as_ref());
                error!("Worker {}: {} panicked: {}", id, job, message);
                stats.increment_panicked();
                JobStatus::Panicked(message)
            }
        };

        stats.add_processing_time(elapsed_us);

        let _ = ctx.events.send(WorkerEvent::Finished(JobRecord {
            job,
            worker_id: id,
            status,
            duration_us: elapsed_us,
        }));
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            // Use a timeout to prevent Drop from hanging indefinitely
            const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

            let start = Instant::now();
            while !thread.is_finished() {
                if start.elapsed() >= JOIN_TIMEOUT {
                    warn!(
                        "Worker {} did not finish within {}s during drop; detaching",
                        self.id,
                        JOIN_TIMEOUT.as_secs()
                    );
                    return;
                }
                thread::sleep(Duration::from_millis(10));
            }
            if let Err(panic_info) = thread.join() {
                error!(
                    "Worker {} panicked during shutdown: {}",
                    self.id,
                    panic_message(panic_info.as_ref())
                );
            }
        }
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
