//! Process-wide server state shared by the dispatcher and the lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::queue::JobQueue;

/// The queue, the running flag and the per-request delay.
///
/// Created once at startup and shared through an `Arc`; there are no
/// globals.
#[derive(Debug)]
pub struct ServerRuntimeState {
    queue: JobQueue,
    running: AtomicBool,
    delay: Duration,
}

impl ServerRuntimeState {
    /// Empty queue, running, with the given delay after each reply.
    pub fn new(delay: Duration) -> Self {
        Self {
            queue: JobQueue::new(),
            running: AtomicBool::new(true),
            delay,
        }
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clear the running flag. The receive loop exits at its next iteration
    /// boundary.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for ServerRuntimeState {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}
