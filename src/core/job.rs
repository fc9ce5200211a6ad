//! Job descriptor and its wire format

use crate::core::error::{PoolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a worker should do with a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// Encrypt the target in place
    Encrypt,
    /// Decrypt the target in place
    Decrypt,
}

impl Action {
    /// Canonical wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Encrypt => "ENCRYPT",
            Action::Decrypt => "DECRYPT",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = PoolError;

    /// Accepts `ENCRYPT` / `DECRYPT` in any case.
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("ENCRYPT") {
            Ok(Action::Encrypt)
        } else if s.eq_ignore_ascii_case("DECRYPT") {
            Ok(Action::Decrypt)
        } else {
            Err(PoolError::malformed(s, format!("unknown action '{}'", s)))
        }
    }
}

/// One unit of work: a target identifier and the action to apply to it.
///
/// Jobs cross the queue as plain strings of the form `<target>,<ACTION>` and
/// never carry open handles; the worker that takes a job opens the target
/// itself.
///
/// # Example
///
/// ```rust
/// use cryptpool::core::{Action, Job};
///
/// let job = Job::new("notes/a.txt", Action::Encrypt);
/// assert_eq!(job.encode(), "notes/a.txt,ENCRYPT");
/// assert_eq!(Job::decode("notes/a.txt,encrypt").unwrap(), job);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Job {
    target: String,
    action: Action,
}

impl Job {
    /// Create a new job
    pub fn new(target: impl Into<String>, action: Action) -> Self {
        Self {
            target: target.into(),
            action,
        }
    }

    /// Target identifier, usually a file path
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Requested action
    pub fn action(&self) -> Action {
        self.action
    }

    /// Encode into the `<target>,<ACTION>` wire form
    pub fn encode(&self) -> String {
        format!("{},{}", self.target, self.action)
    }

    /// Decode from the wire form.
    ///
    /// The action is everything after the last comma, so targets that contain
    /// commas survive a round trip.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::MalformedJob`] if the separator is missing, the
    /// target is empty, or the action token is unknown.
    pub fn decode(input: &str) -> Result<Self> {
        let (target, action) = input
            .rsplit_once(',')
            .ok_or_else(|| PoolError::malformed(input, "expected '<target>,<ACTION>'"))?;

        if target.is_empty() {
            return Err(PoolError::malformed(input, "empty target"));
        }

        let action = action
            .parse::<Action>()
            .map_err(|_| PoolError::malformed(input, format!("unknown action '{}'", action)))?;

        Ok(Self::new(target, action))
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.target, self.action)
    }
}
