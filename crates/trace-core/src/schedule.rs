//! Single-threaded deferred task queue.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// FIFO of tasks that each become due a fixed delay after scheduling.
///
/// There is no cancellation: a scheduled task stays queued until it is
/// popped.
#[derive(Debug, Clone)]
pub struct TaskQueue<T> {
    delay: Duration,
    tasks: VecDeque<(Instant, T)>,
}

impl<T> TaskQueue<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            tasks: VecDeque::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queue `task` to become due at `now + delay`.
    pub fn schedule(&mut self, now: Instant, task: T) {
        self.tasks.push_back((now + self.delay, task));
    }

    /// When the oldest task becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.front().map(|(at, _)| *at)
    }

    /// Pop the oldest task if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<T> {
        match self.tasks.front() {
            Some((at, _)) if *at <= now => self.tasks.pop_front().map(|(_, t)| t),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
