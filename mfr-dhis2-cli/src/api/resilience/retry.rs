//! Fixed-delay retry policy
//!
//! Network failures and 5xx responses are retried; 4xx responses are a
//! definitive rejection and surface immediately.

use std::time::Duration;

/// Retry settings: attempt cap plus a fixed delay between attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one (minimum 1)
    pub max_attempts: u32,
    /// Delay between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_millis(5000),
        }
    }
}

impl RetryConfig {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Upper bound on time spent sleeping between attempts
    pub fn max_total_delay(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

/// Errors that know whether another attempt could succeed
pub trait RetryableError {
    fn is_retryable(&self) -> bool;
}

/// Decides whether a failed attempt is retried and how long to wait
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Server-side failures are transient; client errors are final
    pub fn is_retryable_status(status: u16) -> bool {
        (500..600).contains(&status)
    }

    /// Whether the attempt numbered `attempt` (1-based) may be followed by another
    pub fn should_retry<E: RetryableError>(&self, error: &E, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.config.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.config.delay
    }
}
