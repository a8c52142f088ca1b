//! FIFO job queue shared between requests.
//!
//! Payloads are stored as owned strings in a [`VecDeque`] behind a single
//! [`Mutex`]. Every mutation takes the lock for its whole duration, so a
//! concurrent caller never observes a half-finished enqueue or dequeue.
//! The server loop handles one request at a time today; the lock keeps the
//! queue sound once requests are served by several tasks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

/// Maximum stored payload length in bytes. Longer payloads are truncated.
pub const PAYLOAD_CAPACITY: usize = 1024;

/// Monotonic counters describing queue traffic.
#[derive(Debug, Default)]
pub struct QueueStats {
    enqueued_total: AtomicU64,
    dequeued_total: AtomicU64,
    truncated_total: AtomicU64,
}

impl QueueStats {
    pub fn enqueued_total(&self) -> u64 {
        self.enqueued_total.load(Ordering::SeqCst)
    }

    pub fn dequeued_total(&self) -> u64 {
        self.dequeued_total.load(Ordering::SeqCst)
    }

    pub fn truncated_total(&self) -> u64 {
        self.truncated_total.load(Ordering::SeqCst)
    }
}

/// Result of an [`JobQueue::enqueue`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Stored exactly as given.
    Stored,
    /// Stored after cutting the payload down to [`PAYLOAD_CAPACITY`] bytes.
    Truncated { original_len: usize },
}

/// Unbounded FIFO queue of numeric-string payloads.
#[derive(Debug, Default)]
pub struct JobQueue {
    entries: Mutex<VecDeque<String>>,
    stats: QueueStats,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a copy of `payload` at the tail.
    pub fn enqueue(&self, payload: &str) -> Enqueued {
        let (stored, outcome) = truncate_payload(payload);
        {
            let mut entries = self.lock();
            entries.push_back(stored.to_string());
        }

        self.stats.enqueued_total.fetch_add(1, Ordering::SeqCst);
        if let Enqueued::Truncated { original_len } = outcome {
            self.stats.truncated_total.fetch_add(1, Ordering::SeqCst);
            warn!(
                original_len,
                capacity = PAYLOAD_CAPACITY,
                "payload truncated to queue capacity"
            );
        }
        outcome
    }

    /// Remove and return the oldest payload, or `None` if the queue is empty.
    pub fn dequeue(&self) -> Option<String> {
        let payload = self.lock().pop_front()?;
        self.stats.dequeued_total.fetch_add(1, Ordering::SeqCst);
        Some(payload)
    }

    /// Remove every payload, oldest first.
    pub fn drain(&self) -> Vec<String> {
        let drained: Vec<String> = self.lock().drain(..).collect();
        self.stats
            .dequeued_total
            .fetch_add(drained.len() as u64, Ordering::SeqCst);
        drained
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    // A panic while holding the lock cannot leave the deque half-modified:
    // push_back and pop_front either happen or they don't.
    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cut `payload` to at most [`PAYLOAD_CAPACITY`] bytes on a char boundary.
fn truncate_payload(payload: &str) -> (&str, Enqueued) {
    if payload.len() <= PAYLOAD_CAPACITY {
        return (payload, Enqueued::Stored);
    }
    let mut end = PAYLOAD_CAPACITY;
    while !payload.is_char_boundary(end) {
        end -= 1;
    }
    (
        &payload[..end],
        Enqueued::Truncated {
            original_len: payload.len(),
        },
    )
}
