use std::fmt::Debug;
use std::time::Duration;

pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Decides how long to wait before each reconnect attempt.
pub trait BackoffPolicy: Debug + Send + Sync {
    /// Delay before reconnect attempt `attempt` (1-based), or `None` once the
    /// attempts are used up.
    fn delay(&self, attempt: u32) -> Option<Duration>;
}

/// `base * attempt`, for at most `max_attempts` attempts. A delay too large
/// to represent counts as exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    pub base: Duration,
    pub max_attempts: u32,
}

impl LinearBackoff {
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self { base, max_attempts }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF_BASE, DEFAULT_MAX_RECONNECT_ATTEMPTS)
    }
}

impl BackoffPolicy for LinearBackoff {
    fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        self.base.checked_mul(attempt)
    }
}
