//! Resilience configuration with builder pattern
//!
//! Bundles retry behaviour, request timeouts and request logging for the
//! DHIS2 client with sane defaults.

use super::retry::RetryConfig;
use std::time::Duration;

/// How the DHIS2 client retries, times out and logs its requests
#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    /// Per-request timeout; a timed out request counts as a network failure
    pub request_timeout: Duration,
    pub monitoring: MonitoringConfig,
}

/// Request logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringConfig {
    /// Log every request at debug level
    pub request_logging: bool,
    /// Also log request bodies (trace level)
    pub log_bodies: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            request_logging: true,
            log_bodies: false,
        }
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl ResilienceConfig {
    /// Start from the defaults and override selectively
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::new()
    }

    /// Worst-case time a single call can take before surfacing as a failure
    pub fn max_call_duration(&self) -> Duration {
        self.request_timeout * self.retry.max_attempts + self.retry.max_total_delay()
    }
}

/// Incremental construction of a [`ResilienceConfig`]
#[derive(Debug)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ResilienceConfig::default(),
        }
    }

    /// Replace the whole retry section
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set max attempts (including the first)
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts.max(1);
        self
    }

    /// Set the fixed delay between attempts
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry.delay = delay;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Debug-log each request and its status
    pub fn request_logging(mut self, enabled: bool) -> Self {
        self.config.monitoring.request_logging = enabled;
        self
    }

    pub fn log_bodies(mut self, enabled: bool) -> Self {
        self.config.monitoring.log_bodies = enabled;
        self
    }

    /// Finish, yielding the configured value
    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}

impl Default for ResilienceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
