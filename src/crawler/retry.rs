//! Bounded retry schedule shared by the page loader

use std::time::Duration;

/// Maximum attempts the loader makes for one url
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// A fixed number of attempts with linearly increasing backoff
///
/// The wait before attempt `n` (for `n >= 2`) is `backoff * (n - 1)`; the
/// first attempt starts immediately and nothing is slept after the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Returns the delay slept before `attempt` (1-based)
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff * attempt.saturating_sub(1)
    }

    /// Starts a fresh run through the schedule
    pub fn attempts(&self) -> Attempts {
        Attempts {
            policy: *self,
            next: 1,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::from_secs(1))
    }
}

/// Yields attempt numbers, sleeping the backoff between them
///
/// ```no_run
/// # async fn demo() {
/// use normativa_crawler::crawler::RetryPolicy;
/// use std::time::Duration;
///
/// let mut attempts = RetryPolicy::new(3, Duration::from_millis(10)).attempts();
/// while let Some(attempt) = attempts.next().await {
///     if attempt == 2 {
///         break;
///     }
/// }
/// # }
/// ```
#[derive(Debug)]
pub struct Attempts {
    policy: RetryPolicy,
    next: u32,
}

impl Attempts {
    /// Waits out the backoff and returns the next attempt number, or `None`
    /// once the schedule is exhausted
    pub async fn next(&mut self) -> Option<u32> {
        if self.next > self.policy.max_attempts {
            return None;
        }

        let attempt = self.next;
        let delay = self.policy.delay_before(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.next += 1;
        Some(attempt)
    }

    /// Number of attempts handed out so far
    pub fn made(&self) -> u32 {
        self.next - 1
    }
}
