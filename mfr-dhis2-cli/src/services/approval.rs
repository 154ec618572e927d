//! Mirror of MFR facilities into the DHIS2 approval datastore
//!
//! Best effort: errors are logged and reported as a status, never returned.
//! A failed read is treated as "no record yet", so the create path runs.

use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiError, DataStoreApi};
use crate::models::{MfrFacility, LAST_UPDATED_KEY, remap_mfr_to_dhis};

/// What a single approval sync did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum ApprovalSyncStatus {
    /// Stored record already carries the same `lastUpdated`
    Skipped,
    /// Stored record overwritten
    Updated,
    /// No record existed; one was created
    Created,
    /// Sync did not complete
    Failed(String),
}

pub struct ApprovalStoreSynchronizer<'a> {
    store: &'a dyn DataStoreApi,
    namespace: String,
}

impl<'a> ApprovalStoreSynchronizer<'a> {
    pub fn new(store: &'a dyn DataStoreApi, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Skip, update or create the datastore record for `facility`
    pub async fn sync_approval_record(&self, facility: &MfrFacility) -> ApprovalSyncStatus {
        match self.try_sync(facility).await {
            Ok(status) => status,
            Err(e) => {
                error!(
                    "Error saving facility {} to datastore: {}",
                    facility.id(),
                    e
                );
                ApprovalSyncStatus::Failed(e.to_string())
            }
        }
    }

    async fn try_sync(&self, facility: &MfrFacility) -> Result<ApprovalSyncStatus, ApiError> {
        let key = facility.id();
        let stored = match self.store.get_entry(&self.namespace, key).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(
                    "Could not read datastore entry {} in {}, treating it as absent: {}",
                    key, self.namespace, e
                );
                None
            }
        };
        let remapped = remap_mfr_to_dhis(facility);

        match stored {
            Some(stored) if is_up_to_date(&stored, facility) => {
                info!(
                    "Facility with MFR ID {} already exists in the datastore, no update needed",
                    key
                );
                Ok(ApprovalSyncStatus::Skipped)
            }
            Some(_) => {
                self.store.put_entry(&self.namespace, key, &remapped).await?;
                info!("Facility with MFR ID {} updated in the datastore", key);
                Ok(ApprovalSyncStatus::Updated)
            }
            None => {
                self.store.post_entry(&self.namespace, key, &remapped).await?;
                info!("Facility with MFR ID {} created in the datastore", key);
                Ok(ApprovalSyncStatus::Created)
            }
        }
    }
}

/// A record without a timestamp on either side is never considered current
fn is_up_to_date(stored: &Value, facility: &MfrFacility) -> bool {
    match (
        stored.get(LAST_UPDATED_KEY).and_then(Value::as_str),
        facility.last_updated(),
    ) {
        (Some(stored), Some(current)) => stored == current,
        _ => false,
    }
}
