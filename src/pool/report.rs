//! Batch outcome types

use crate::core::Job;
use crate::pool::worker::WorkerStatSnapshot;
use crate::queue::SubmitStatsSnapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum JobStatus {
    /// The transform returned `Ok`
    Succeeded,
    /// The transform returned an error
    Failed(String),
    /// The transform panicked
    Panicked(String),
}

impl JobStatus {
    /// Whether the job succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }
}

/// A job that a worker finished, successfully or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    /// The job
    pub job: Job,
    /// Worker that ran it
    pub worker_id: usize,
    /// Outcome
    #[serde(flatten)]
    pub status: JobStatus,
    /// Time spent in the transform (microseconds)
    pub duration_us: u64,
}

/// A job that never entered the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedJob {
    /// The job
    pub job: Job,
    /// Why submit refused it
    pub reason: String,
}

/// A queue slot that did not decode to a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedEntry {
    /// Worker that took the slot
    pub worker_id: usize,
    /// Slot contents
    pub raw: String,
    /// Decode error
    pub reason: String,
}

/// How a worker thread ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "exit", content = "message", rename_all = "snake_case")]
pub enum WorkerExit {
    /// Left its loop after the queue closed
    Clean,
    /// The thread itself panicked outside of job execution
    Panicked(String),
}

/// Final state of one worker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerReport {
    /// How the thread ended
    #[serde(flatten)]
    pub exit: WorkerExit,
    /// Job counters at exit
    pub stats: WorkerStatSnapshot,
}

/// Queue counters at the end of the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    /// Slot count
    pub capacity: usize,
    /// Highest occupancy observed
    pub high_water_mark: usize,
    /// Submission counters
    pub submit: SubmitStatsSnapshot,
}

/// Per-job and per-worker outcome of a batch
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    /// When the pool started
    pub started_at: DateTime<Utc>,
    /// When the last worker was joined
    pub finished_at: DateTime<Utc>,
    /// Finished jobs in completion order
    pub records: Vec<JobRecord>,
    /// Jobs refused at submit time
    pub rejected: Vec<RejectedJob>,
    /// Slots that did not decode
    pub malformed: Vec<MalformedEntry>,
    /// Worker id to final state
    pub workers: BTreeMap<usize, WorkerReport>,
    /// Queue counters
    pub queue: QueueSummary,
}

impl AggregateResult {
    /// Jobs accepted by the queue
    pub fn jobs_submitted(&self) -> u64 {
        self.queue.submit.jobs_submitted
    }

    /// Jobs whose transform succeeded
    pub fn jobs_succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.status.is_success()).count()
    }

    /// Jobs whose transform failed or panicked
    pub fn failures(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.iter().filter(|r| !r.status.is_success())
    }

    /// Workers that did not exit cleanly
    pub fn crashed_workers(&self) -> impl Iterator<Item = (&usize, &WorkerReport)> {
        self.workers
            .iter()
            .filter(|(_, report)| report.exit != WorkerExit::Clean)
    }

    /// True when every submitted job succeeded, nothing was rejected and
    /// every worker exited cleanly
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
            && self.rejected.is_empty()
            && self.malformed.is_empty()
            && self.crashed_workers().next().is_none()
    }
}

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        writeln!(
            f,
            "{} submitted, {} succeeded, {} failed, {} rejected ({} ms)",
            self.jobs_submitted(),
            self.jobs_succeeded(),
            failed + self.malformed.len(),
            self.rejected.len(),
            (self.finished_at - self.started_at).num_milliseconds()
        )?;
        for record in self.failures() {
            match &record.status {
                JobStatus::Failed(msg) => {
                    writeln!(f, "  failed  {} (worker {}): {}", record.job, record.worker_id, msg)?
                }
                JobStatus::Panicked(msg) => writeln!(
                    f,
                    "  panic   {} (worker {}): {}",
                    record.job, record.worker_id, msg
                )?,
                JobStatus::Succeeded => {}
            }
        }
        for entry in &self.malformed {
            writeln!(
                f,
                "  bad     '{}' (worker {}): {}",
                entry.raw, entry.worker_id, entry.reason
            )?;
        }
        for rejected in &self.rejected {
            writeln!(f, "  refused {}: {}", rejected.job, rejected.reason)?;
        }
        for (id, report) in self.crashed_workers() {
            if let WorkerExit::Panicked(msg) = &report.exit {
                writeln!(f, "  worker {} crashed: {}", id, msg)?;
            }
        }
        Ok(())
    }
}
