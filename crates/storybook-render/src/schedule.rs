//! Cancelable deadlines driven by caller-supplied time.
//!
//! Nothing here spawns a timer. Owners call `poll(now)` from their tick and
//! the task fires at most once per arming.

use std::time::{Duration, Instant};

/// Single-shot deadline that can be re-armed or canceled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduledTask {
    deadline: Option<Instant>,
}

impl ScheduledTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the task to fire `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// Disarm. Returns whether a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fire if the deadline has passed. Firing disarms the task.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Coalesces bursts of notifications into one firing after a quiet period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debouncer {
    quiet: Duration,
    task: ScheduledTask,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            task: ScheduledTask::new(),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Record an event; the quiet period restarts from `now`.
    pub fn notify(&mut self, now: Instant) {
        self.task.schedule(now, self.quiet);
    }

    pub fn is_pending(&self) -> bool {
        self.task.is_pending()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.task.deadline()
    }

    pub fn cancel(&mut self) -> bool {
        self.task.cancel()
    }

    /// True once, when the quiet period after the last notification elapses.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.task.poll(now)
    }
}
