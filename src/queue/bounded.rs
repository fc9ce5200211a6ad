//! Bounded FIFO ring of encoded jobs.

use super::{
    QueueError, QueueResult, Semaphore, ShutdownSignal, SubmitPolicy, SubmitStats,
    SubmitStatsSnapshot,
};
use crate::core::Job;
use log::trace;
use parking_lot::Mutex;
use std::time::Duration;

/// Default number of slots.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default byte limit of one encoded job.
pub const DEFAULT_MAX_ENTRY_LEN: usize = 255;

/// One fixed-size slot. `len` says how many bytes of `bytes` are live.
#[derive(Debug)]
struct Slot {
    len: usize,
    bytes: Box<[u8]>,
}

/// Ring indices and slots. Only touched with the ring lock held.
#[derive(Debug)]
struct RingState {
    slots: Vec<Slot>,
    head: usize,
    tail: usize,
    count: usize,
    high_water: usize,
}

impl RingState {
    fn new(capacity: usize, max_entry_len: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                len: 0,
                bytes: vec![0u8; max_entry_len].into_boxed_slice(),
            })
            .collect();
        Self {
            slots,
            head: 0,
            tail: 0,
            count: 0,
            high_water: 0,
        }
    }

    fn push(&mut self, encoded: &[u8]) {
        let capacity = self.slots.len();
        debug_assert!(self.count < capacity, "free-slot permit without a free slot");

        let slot = &mut self.slots[self.tail];
        slot.bytes[..encoded.len()].copy_from_slice(encoded);
        slot.len = encoded.len();

        self.tail = (self.tail + 1) % capacity;
        self.count += 1;
        self.high_water = self.high_water.max(self.count);
        debug_assert_eq!((self.head + self.count) % capacity, self.tail);
    }

    fn pop(&mut self) -> Vec<u8> {
        let capacity = self.slots.len();
        let slot = &mut self.slots[self.head];
        let bytes = slot.bytes[..slot.len].to_vec();
        slot.len = 0;

        self.head = (self.head + 1) % capacity;
        self.count -= 1;
        bytes
    }
}

/// A fixed-capacity FIFO of jobs shared by one producer and many workers.
///
/// Flow control uses two counting semaphores (free slots and available
/// items). The ring indices sit behind a single mutex that is held only while
/// a slot is written or read. Both are needed together: the permit counts and
/// the indices are two halves of one piece of state.
///
/// Jobs are stored in their encoded `<target>,<ACTION>` form in slots of a
/// fixed byte size. An encoding longer than the slot is rejected at submit
/// time instead of being truncated.
///
/// # Shutdown
///
/// [`close`](Self::close) sets the producer-finished flag and releases extra
/// item permits, one per worker that might be parked in [`take`](Self::take).
/// A taker that wakes up to an empty ring knows the permit was a wake-up and
/// returns [`QueueError::Closed`]. It hands the permit back first, so any
/// later `take` also returns immediately.
///
/// # Example
///
/// ```rust
/// use cryptpool::core::{Action, Job};
/// use cryptpool::queue::{BoundedJobQueue, QueueError};
///
/// let queue = BoundedJobQueue::new(2);
/// queue.try_submit(&Job::new("a.txt", Action::Encrypt)).unwrap();
/// queue.try_submit(&Job::new("b.txt", Action::Decrypt)).unwrap();
///
/// // Queue is now full - try_submit will fail
/// match queue.try_submit(&Job::new("c.txt", Action::Encrypt)) {
///     Err(QueueError::Full { .. }) => println!("Queue is full"),
///     _ => panic!("expected Full error"),
/// }
/// ```
#[derive(Debug)]
pub struct BoundedJobQueue {
    ring: Mutex<RingState>,
    free_slots: Semaphore,
    items: Semaphore,
    shutdown: ShutdownSignal,
    capacity: usize,
    max_entry_len: usize,
    policy: SubmitPolicy,
    stats: SubmitStats,
}

impl BoundedJobQueue {
    /// Creates a queue with `capacity` slots of [`DEFAULT_MAX_ENTRY_LEN`] bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        Self::with_entry_len(capacity, DEFAULT_MAX_ENTRY_LEN)
    }

    /// Creates a queue with `capacity` slots of `max_entry_len` bytes each.
    ///
    /// # Panics
    ///
    /// Panics if either argument is 0.
    pub fn with_entry_len(capacity: usize, max_entry_len: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        assert!(max_entry_len > 0, "max_entry_len must be greater than 0");
        Self {
            ring: Mutex::new(RingState::new(capacity, max_entry_len)),
            free_slots: Semaphore::new(capacity),
            items: Semaphore::new(0),
            shutdown: ShutdownSignal::new(),
            capacity,
            max_entry_len,
            policy: SubmitPolicy::default(),
            stats: SubmitStats::new(),
        }
    }

    /// Sets the policy used by [`submit`](Self::submit).
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_submit_policy(mut self, policy: SubmitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Submits a job according to the configured [`SubmitPolicy`].
    ///
    /// # Errors
    ///
    /// - [`QueueError::EncodedTooLong`] if the job does not fit in a slot
    /// - [`QueueError::Closed`] if [`close`](Self::close) was already called
    /// - [`QueueError::Full`] / [`QueueError::Timeout`] for the non-blocking
    ///   and timed policies
    pub fn submit(&self, job: &Job) -> QueueResult<()> {
        match self.policy {
            SubmitPolicy::Block => self.submit_blocking(job),
            SubmitPolicy::BlockWithTimeout(timeout) => self.submit_timeout(job, timeout),
            SubmitPolicy::RejectImmediately => self.try_submit(job),
        }
    }

    /// Submits a job, waiting as long as it takes for a free slot.
    pub fn submit_blocking(&self, job: &Job) -> QueueResult<()> {
        let encoded = self.encode_checked(job)?;
        if !self.free_slots.try_acquire() {
            self.stats.record_blocked();
            trace!("queue full, waiting for a free slot");
            self.free_slots.acquire();
        }
        self.write_slot(&encoded)
    }

    /// Submits a job only if a slot is free right now.
    pub fn try_submit(&self, job: &Job) -> QueueResult<()> {
        let encoded = self.encode_checked(job)?;
        if !self.free_slots.try_acquire() {
            self.stats.record_rejection();
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        self.write_slot(&encoded)
    }

    /// Submits a job, waiting at most `timeout` for a free slot.
    pub fn submit_timeout(&self, job: &Job, timeout: Duration) -> QueueResult<()> {
        let encoded = self.encode_checked(job)?;
        if !self.free_slots.try_acquire() {
            self.stats.record_blocked();
            if !self.free_slots.acquire_timeout(timeout) {
                self.stats.record_timeout();
                return Err(QueueError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        }
        self.write_slot(&encoded)
    }

    /// Takes the oldest job, blocking until one is available or the queue is
    /// closed and drained.
    ///
    /// # Errors
    ///
    /// - [`QueueError::Closed`] once the producer has finished and nothing is left
    /// - [`QueueError::Malformed`] if the slot did not decode; the slot is
    ///   still consumed
    pub fn take(&self) -> QueueResult<Job> {
        self.items.acquire();
        self.read_slot()
    }

    /// Takes the oldest job if one is available right now.
    ///
    /// Returns [`QueueError::Empty`] when nothing is queued yet.
    pub fn try_take(&self) -> QueueResult<Job> {
        if self.items.try_acquire() {
            return self.read_slot();
        }
        self.empty_or_closed()
    }

    /// Takes the oldest job, waiting at most `timeout`.
    ///
    /// Returns [`QueueError::Empty`] if nothing arrived in time and the
    /// producer may still submit more.
    pub fn take_timeout(&self, timeout: Duration) -> QueueResult<Job> {
        if self.items.acquire_timeout(timeout) {
            return self.read_slot();
        }
        self.empty_or_closed()
    }

    /// Marks the producer as finished and wakes parked takers.
    ///
    /// `wakeups` is the number of consumers that may be waiting in
    /// [`take`](Self::take); at least one permit is always released. Calling
    /// this more than once has no further effect.
    pub fn close(&self, wakeups: usize) {
        {
            // Under the ring lock so no submit can slip in after the flag
            let _ring = self.ring.lock();
            if !self.shutdown.finish() {
                return;
            }
        }
        self.items.release_many(wakeups.max(1));
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_finished()
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.ring.lock().count
    }

    /// Whether no jobs are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued jobs.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte limit of one encoded job.
    pub fn max_entry_len(&self) -> usize {
        self.max_entry_len
    }

    /// Highest occupancy seen so far.
    pub fn high_water_mark(&self) -> usize {
        self.ring.lock().high_water
    }

    /// Submission counters.
    pub fn submit_stats(&self) -> SubmitStatsSnapshot {
        self.stats.snapshot()
    }

    fn encode_checked(&self, job: &Job) -> QueueResult<String> {
        if self.shutdown.is_finished() {
            return Err(QueueError::Closed);
        }
        let encoded = job.encode();
        // ",ACTION" would never decode on the take side
        if job.target().is_empty() {
            return Err(QueueError::Malformed {
                raw: encoded,
                reason: "empty target".to_string(),
            });
        }
        if encoded.len() > self.max_entry_len {
            return Err(QueueError::EncodedTooLong {
                len: encoded.len(),
                max: self.max_entry_len,
            });
        }
        Ok(encoded)
    }

    /// Writes into the slot reserved by a free-slot permit the caller holds.
    fn write_slot(&self, encoded: &str) -> QueueResult<()> {
        {
            let mut ring = self.ring.lock();
            if self.shutdown.is_finished() {
                drop(ring);
                self.free_slots.release();
                return Err(QueueError::Closed);
            }
            ring.push(encoded.as_bytes());
        }
        self.items.release();
        self.stats.record_submission();
        Ok(())
    }

    /// Reads the head slot with an item permit the caller holds.
    fn read_slot(&self) -> QueueResult<Job> {
        let bytes = {
            let mut ring = self.ring.lock();
            if ring.count == 0 {
                // Permit came from close(); pass it on to the next taker
                debug_assert!(self.shutdown.is_finished());
                drop(ring);
                self.items.release();
                return Err(QueueError::Closed);
            }
            ring.pop()
        };
        self.free_slots.release();

        let raw = String::from_utf8(bytes).map_err(|e| QueueError::Malformed {
            raw: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            reason: "slot is not valid UTF-8".to_string(),
        })?;
        Job::decode(&raw).map_err(|e| QueueError::Malformed {
            reason: e.to_string(),
            raw,
        })
    }

    fn empty_or_closed(&self) -> QueueResult<Job> {
        let ring = self.ring.lock();
        if self.shutdown.is_finished() && ring.count == 0 {
            Err(QueueError::Closed)
        } else {
            Err(QueueError::Empty)
        }
    }
}
