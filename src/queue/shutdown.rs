//! Producer-finished flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Write-once flag set by the producer after its last submit.
///
/// Workers read it on every failed dequeue to tell "momentarily empty" apart
/// from "drained for good". It only ever moves from `false` to `true`.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    finished: AtomicBool,
}

impl ShutdownSignal {
    /// Creates an unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the producer as finished.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn finish(&self) -> bool {
        self.finished
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the producer has finished.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}
