//! Resilience settings for DHIS2 API interactions
//!
//! Fixed-delay retries for transient failures plus request timeouts, so a
//! single unreachable facility cannot stall a batch indefinitely.

pub mod config;
pub mod retry;

pub use config::{MonitoringConfig, ResilienceConfig, ResilienceConfigBuilder};
pub use retry::{RetryConfig, RetryPolicy, RetryableError};
