//! Seams between the reconciliation services and DHIS2
//!
//! The services only see these traits, so tests drive them with in-memory
//! fakes and production wires in [`Dhis2Client`](super::Dhis2Client).

use async_trait::async_trait;
use serde_json::Value;

use super::error::ApiError;
use crate::models::{OrgUnit, OrgUnitPayload};

/// Org unit lookups and writes
#[async_trait]
pub trait OrgUnitApi: Send + Sync {
    /// Fetch an org unit by its DHIS2 identifier; `None` when it does not exist
    async fn get_by_id(&self, id: &str) -> Result<Option<OrgUnit>, ApiError>;

    /// Fetch an org unit by its code; `None` when no org unit carries it
    async fn get_by_code(&self, code: &str) -> Result<Option<OrgUnit>, ApiError>;

    /// All org units whose name matches exactly
    async fn find_by_name(&self, name: &str) -> Result<Vec<OrgUnit>, ApiError>;

    /// Create an org unit under `parent_id`, returning the new identifier
    async fn create(&self, payload: &OrgUnitPayload, parent_id: &str) -> Result<String, ApiError>;

    /// Overwrite the attributes of an existing org unit, returning its identifier
    async fn update(&self, id: &str, payload: &OrgUnitPayload) -> Result<String, ApiError>;
}

/// DHIS2 key-value datastore access
#[async_trait]
pub trait DataStoreApi: Send + Sync {
    /// Read a datastore entry; `None` when the key does not exist
    async fn get_entry(&self, namespace: &str, key: &str) -> Result<Option<Value>, ApiError>;

    /// Overwrite an existing entry
    async fn put_entry(&self, namespace: &str, key: &str, value: &Value) -> Result<(), ApiError>;

    /// Create a new entry
    async fn post_entry(&self, namespace: &str, key: &str, value: &Value) -> Result<(), ApiError>;
}
