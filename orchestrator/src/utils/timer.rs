use std::time::Duration;

use tokio::time::Instant;

/// Attempt counter with a wall-clock deadline fixed at creation.
///
/// The deadline is `interval * max_attempts` after the loop starts, so slow iterations eat into the
/// budget instead of stretching it.
#[derive(Debug, Clone)]
pub struct PollDeadline {
    interval: Duration,
    max_attempts: u32,
    attempt: u32,
    deadline: Instant,
}

impl PollDeadline {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        let deadline = Instant::now() + interval.saturating_mul(max_attempts);
        Self { interval, max_attempts, attempt: 0, deadline }
    }

    /// Start the next attempt. Returns its 1-based number, or `None` once the attempts or the time are used up.
    pub fn next_attempt(&mut self) -> Option<u32> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        if self.attempt > 0 && Instant::now() >= self.deadline {
            return None;
        }
        self.attempt += 1;
        Some(self.attempt)
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether the current attempt has reached the last `window` attempts of the budget, counted
    /// either in attempts or in intervals left before the deadline
    pub fn in_final_window(&self, window: u32) -> bool {
        self.attempt >= self.max_attempts.saturating_sub(window)
            || Instant::now() + self.interval.saturating_mul(window) >= self.deadline
    }

    /// Sleep for one interval, cut short at the deadline
    pub async fn wait(&self) {
        let wake = (Instant::now() + self.interval).min(self.deadline);
        tokio::time::sleep_until(wake).await;
    }
}
