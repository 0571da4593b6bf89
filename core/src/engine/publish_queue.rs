//! The egress publish queue: strict SPSC on the consumer side (the
//! Publisher thread is its sole reader), with a short producer-side mutex
//! on the writer side because two logically distinct paths produce into it
//! — the Receiver (synchronous accept/reject reports) and callback
//! dispatch (async order updates and fills). The ring itself still only
//! ever has one writer active at a time; the mutex just arbitrates which
//! one that is for the duration of a single push.

use crate::containers::SpscQueue;
use parking_lot::Mutex;

pub const PUBLISH_QUEUE_CAPACITY: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    ExecReport,
    ExecFill,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::ExecReport => "exec.report",
            Topic::ExecFill => "exec.fill",
        }
    }
}

pub struct PublishMessage {
    pub topic: Topic,
    pub payload: Vec<u8>,
    /// Carried through so the Publisher can compute end-to-end latency at
    /// the point of actual send.
    pub receive_ts_ns: u64,
}

pub struct PublishQueue {
    ring: SpscQueue<PublishMessage, PUBLISH_QUEUE_CAPACITY>,
    producer_lock: Mutex<()>,
}

impl Default for PublishQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishQueue {
    pub fn new() -> Self {
        Self {
            ring: SpscQueue::new(),
            producer_lock: Mutex::new(()),
        }
    }

    /// Returns `Err(message)` when the ring is full; the caller increments
    /// `queue_full_count` and drops the message (spec.md §4.H).
    pub fn push(&self, message: PublishMessage) -> Result<(), PublishMessage> {
        let _guard = self.producer_lock.lock();
        self.ring.try_push(message)
    }

    /// Sole consumer: the Publisher thread.
    pub fn pop(&self) -> Option<PublishMessage> {
        self.ring.try_pop()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}
