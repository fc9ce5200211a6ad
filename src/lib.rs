//! # cryptpool
//!
//! Spread a batch of independent file jobs (encrypt / decrypt) over a fixed
//! pool of worker threads fed by a bounded, shared job queue.
//!
//! ## Features
//!
//! - **Bounded Job Queue**: Fixed-capacity FIFO ring with free-slot and
//!   available-item semaphores and a single lock around the ring indices
//! - **Backpressure**: The producer blocks while the queue is full (or times
//!   out / is rejected, per [`SubmitPolicy`](queue::SubmitPolicy))
//! - **Clean Shutdown**: `close` sets a producer-finished flag and wakes every
//!   parked worker; workers drain the queue and exit, none hang
//! - **Failure Isolation**: A failing or panicking job is recorded and the
//!   worker moves on
//! - **Aggregate Result**: Per-job outcome plus per-worker exit status
//!
//! ## Quick Start
//!
//! ```rust
//! use cryptpool::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let transform = Arc::new(|job: &Job| -> std::result::Result<(), TransformError> {
//!     println!("{} {}", job.action(), job.target());
//!     Ok(())
//! });
//!
//! let jobs = vec![
//!     Job::new("a.txt", Action::Encrypt),
//!     Job::new("b.txt", Action::Decrypt),
//!     Job::new("c.txt", Action::Encrypt),
//! ];
//!
//! let config = PoolConfig::new(2).with_queue_capacity(2);
//! let result = run_batch(config, jobs, transform)?;
//!
//! assert_eq!(result.jobs_succeeded(), 3);
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```
//!
//! ## Encrypting Files
//!
//! ```rust,no_run
//! use cryptpool::prelude::*;
//! use cryptpool::cli::collect_jobs;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let jobs = collect_jobs(Path::new("./data"), Action::Encrypt)?;
//! let cipher = Arc::new(XorCipher::from_key("my key"));
//! let result = run_batch(PoolConfig::default(), jobs, cipher)?;
//! assert!(result.is_success());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod transform;

pub use crate::core::{Action, Job, PoolError, Result};
pub use crate::pool::{run_batch, AggregateResult, PoolConfig, WorkerPool};
pub use crate::queue::{BoundedJobQueue, QueueError};
pub use crate::transform::{Transform, TransformError, XorCipher};
