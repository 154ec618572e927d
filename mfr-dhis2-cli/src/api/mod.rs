//! DHIS2 Web API module
//!
//! Client, error type and the traits the reconciliation services are
//! written against.

pub mod client;
pub mod error;
pub mod resilience;
pub mod traits;

pub use client::Dhis2Client;
pub use error::ApiError;
pub use resilience::{
    MonitoringConfig, ResilienceConfig, RetryConfig, RetryPolicy, RetryableError,
};
pub use traits::{DataStoreApi, OrgUnitApi};
