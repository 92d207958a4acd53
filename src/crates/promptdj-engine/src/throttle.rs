//! Trailing-edge throttle with a merge function
//!
//! The first call opens a window; calls inside it are merged into the
//! pending value; when the window closes the merged value is released once.
//! The throttle holds no timer of its own: the owner sleeps until
//! [`Throttle::deadline`] and then calls [`Throttle::poll`].

use std::time::Duration;
use tokio::time::Instant;

/// Coalesces bursts of inputs into one output per window
pub struct Throttle<T> {
    window: Duration,
    merge: fn(T, T) -> T,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Throttle<T> {
    /// Create a throttle that combines inputs with `merge(pending, incoming)`
    pub fn new(window: Duration, merge: fn(T, T) -> T) -> Self {
        Throttle {
            window,
            merge,
            pending: None,
            deadline: None,
        }
    }

    /// Create a throttle where the latest input wins
    pub fn latest(window: Duration) -> Self {
        Self::new(window, |_, incoming| incoming)
    }

    /// Offer an input; opens a window unless one is already open
    pub fn call(&mut self, now: Instant, input: T) {
        self.pending = Some(match self.pending.take() {
            Some(pending) => (self.merge)(pending, input),
            None => input,
        });
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
    }

    /// When the pending value is due, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drop the pending value and close the window
    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }

    /// Release the merged value if its window has closed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }
}
