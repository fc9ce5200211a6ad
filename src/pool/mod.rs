//! Worker pool, worker threads and batch reporting

pub mod config;
pub mod report;
pub mod worker;
pub mod worker_pool;

pub use config::PoolConfig;
pub use report::{
    AggregateResult, JobRecord, JobStatus, MalformedEntry, QueueSummary, RejectedJob, WorkerExit,
    WorkerReport,
};
pub use worker::{Worker, WorkerStatSnapshot, WorkerStats};
pub use worker_pool::{run_batch, WorkerPool};
