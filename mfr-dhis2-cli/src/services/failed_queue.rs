//! Failed queue seam
//!
//! Facilities that need a later reconciliation retry are handed to a
//! [`FailedQueue`]; the durable SQLite implementation lives in
//! `config::repository::queue`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A facility to retry later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedQueueEntry {
    /// MFR resource identifier of the facility
    pub facility_id: String,
    /// Why reconciliation did not succeed
    pub reason: String,
}

impl FailedQueueEntry {
    pub fn new(facility_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            facility_id: facility_id.into(),
            reason: reason.into(),
        }
    }
}

/// Append-only sink for facilities that failed reconciliation
#[async_trait]
pub trait FailedQueue: Send + Sync {
    async fn enqueue(&self, entry: FailedQueueEntry) -> anyhow::Result<()>;
}
