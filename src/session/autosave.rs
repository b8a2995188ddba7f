use std::time::{Duration, Instant};

/// Debounce for progress snapshots: every `touch` pushes the deadline out by
/// `delay`, and `poll` fires once the deadline has passed.
#[derive(Clone, Debug)]
pub struct Autosave {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Autosave {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Restart the timer.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Returns true (and disarms) when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Disarm without firing. Returns whether a save was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}
