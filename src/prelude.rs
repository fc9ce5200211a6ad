//! Convenient re-exports for common types and traits

pub use crate::core::{Action, Job, PoolError, Result};
pub use crate::pool::{run_batch, AggregateResult, JobStatus, PoolConfig, WorkerExit, WorkerPool};
pub use crate::queue::{BoundedJobQueue, QueueError, SubmitPolicy};
pub use crate::transform::{Transform, TransformError, XorCipher};
