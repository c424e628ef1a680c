//! Coalescing of bursts of map events.

use std::time::{Duration, Instant};

/// Holds the most recent event until no newer one arrived for `delay`.
///
/// Every `push` moves the deadline, so the last event of a burst wins.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            deadline: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.delay);
    }

    /// Take the pending event if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }

    /// Wait for the current burst to settle and return its last event
    pub async fn settled(&mut self) -> Option<T> {
        let deadline = self.deadline?;
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        self.poll(Instant::now())
    }
}
