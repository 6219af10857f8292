//! Trailing-edge coalescing of change notifications.

use std::future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Collapses bursts of [`Debouncer::trigger`] calls into one firing, a quiet
/// window after the last trigger.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Cancels any pending firing and schedules a new one.
    pub fn trigger(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the pending deadline passes. Never resolves while idle.
    ///
    /// Cancel safe: dropping the future before it completes keeps the deadline.
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => future::pending().await,
        }
    }
}
