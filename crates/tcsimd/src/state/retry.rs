use std::time::Duration;

use tcsim_config::{Config, DEFAULT_RETRY_BASE, DEFAULT_RETRY_CAP};

/// How state file operations space out their retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base: Duration,
    cap: Duration,
}

impl RetryPolicy {
    /// Builds a policy that starts at `base` and stops once the interval
    /// reaches `cap`. A zero base disables retrying.
    #[must_use]
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Policy described by the daemon configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.retry_base(), config.retry_cap())
    }

    /// First interval.
    #[must_use]
    pub const fn base(&self) -> Duration {
        self.base
    }

    /// Interval at which retrying stops.
    #[must_use]
    pub const fn cap(&self) -> Duration {
        self.cap
    }

    /// A fresh schedule. Each operation takes its own so intervals never
    /// carry over between calls.
    #[must_use]
    pub const fn backoff(&self) -> Backoff {
        Backoff {
            interval: self.base,
            cap: self.cap,
        }
    }

    /// Total time one operation can spend waiting before it gives up.
    #[must_use]
    pub fn worst_case(&self) -> Duration {
        let mut backoff = self.backoff();
        let mut total = Duration::ZERO;
        while let Some(delay) = backoff.next_delay() {
            total = total.saturating_add(delay);
        }
        total
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_BASE, DEFAULT_RETRY_CAP)
    }
}

/// Doubling interval schedule for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    interval: Duration,
    cap: Duration,
}

impl Backoff {
    /// Interval the next failure would wait.
    #[must_use]
    pub const fn current(&self) -> Duration {
        self.interval
    }

    /// Yields the wait before the next attempt and doubles the interval, or
    /// `None` once the interval has reached the cap.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.interval.is_zero() || self.interval >= self.cap {
            return None;
        }
        let delay = self.interval;
        self.interval = self.interval.saturating_mul(2);
        Some(delay)
    }
}
