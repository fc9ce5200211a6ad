//! The per-job transform run by workers.
//!
//! Workers hand each [`Job`] to a [`Transform`]. The transform opens and
//! rewrites the target itself; nothing but the job descriptor crosses the
//! queue. [`XorCipher`] is the file transform used by the CLI, and any
//! `Fn(&Job) -> Result<(), TransformError>` closure is a transform too.

mod cipher;
mod key;

pub use cipher::{XorCipher, CHUNK_SIZE, KEYSTREAM_LEN};
pub use key::{load_key, KEY_ENV_VAR};

use crate::core::Job;
use std::path::PathBuf;

/// Errors raised by a transform for one job
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransformError {
    /// I/O on the target failed
    #[error("{}: {source}", path.display())]
    Io {
        /// Target that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// No key was found in the environment or `.env`
    #[error("no key found: set {var} or add it to a .env file")]
    MissingKey {
        /// Variable that was looked up
        var: String,
    },

    /// Any other failure
    #[error("{0}")]
    Other(String),
}

impl TransformError {
    /// Create an I/O error for `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransformError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TransformError::Other(msg.into())
    }
}

/// Work applied to one job by a worker.
pub trait Transform: Send + Sync {
    /// Apply the job's action to its target.
    ///
    /// # Errors
    ///
    /// Any error is recorded against this job only; the worker moves on.
    fn apply(&self, job: &Job) -> Result<(), TransformError>;

    /// Name used in logs
    fn name(&self) -> &str {
        "Transform"
    }
}

impl<F> Transform for F
where
    F: Fn(&Job) -> Result<(), TransformError> + Send + Sync,
{
    fn apply(&self, job: &Job) -> Result<(), TransformError> {
        self(job)
    }
}
