//! Outcome types produced by reconciliation

use serde::Serialize;

use crate::api::ApiError;
use crate::models::FacilityRecord;

/// Reference to the org unit a facility ended up as
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnitRef {
    pub org_unit_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_org_unit_id: Option<String>,
    /// The facility fields are echoed alongside the identifiers
    #[serde(flatten)]
    pub facility: FacilityRecord,
}

/// Result of reconciling one facility that did not fail
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReconciliationOutcome {
    /// No org unit existed; a new one was created
    Created(OrgUnitRef),
    /// An existing org unit was overwritten with the facility's attributes
    Updated(OrgUnitRef),
    /// An existing org unit was found and left untouched
    Unchanged(OrgUnitRef),
    /// No org unit matched and none of the reported ancestors exist in DHIS2
    /// `facility_id` is the MFR resource id, serialized as `id` like the
    /// flattened facility in the other variants
    NoParentResolvable {
        #[serde(rename = "id")]
        facility_id: String,
    },
}

impl ReconciliationOutcome {
    pub fn org_unit(&self) -> Option<&OrgUnitRef> {
        match self {
            Self::Created(r) | Self::Updated(r) | Self::Unchanged(r) => Some(r),
            Self::NoParentResolvable { .. } => None,
        }
    }

    pub fn org_unit_id(&self) -> Option<&str> {
        self.org_unit().map(|r| r.org_unit_id.as_str())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Unchanged(_) => "unchanged",
            Self::NoParentResolvable { .. } => "no parent",
        }
    }
}

/// Step of the reconciliation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStage {
    LookupById,
    LookupByCode,
    ResolveParent,
    CreateOrgUnit,
    UpdateOrgUnit,
}

impl ReconcileStage {
    pub fn label(&self) -> &'static str {
        match self {
            ReconcileStage::LookupById => "lookup by id",
            ReconcileStage::LookupByCode => "lookup by code",
            ReconcileStage::ResolveParent => "parent resolution",
            ReconcileStage::CreateOrgUnit => "org unit creation",
            ReconcileStage::UpdateOrgUnit => "org unit update",
        }
    }
}

/// A facility whose reconciliation failed and should be retried later
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileFailure {
    /// MFR resource identifier
    pub facility_id: String,
    pub facility_name: String,
    pub stage: ReconcileStage,
    pub error: ApiError,
}

impl ReconcileFailure {
    pub fn new(facility: &FacilityRecord, stage: ReconcileStage, error: ApiError) -> Self {
        Self {
            facility_id: facility.id.clone(),
            facility_name: facility.name.clone(),
            stage,
            error,
        }
    }
}

impl std::fmt::Display for ReconcileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Facility '{}' ({}) failed during {}: {}",
            self.facility_name,
            self.facility_id,
            self.stage.label(),
            self.error
        )
    }
}

impl std::error::Error for ReconcileFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
