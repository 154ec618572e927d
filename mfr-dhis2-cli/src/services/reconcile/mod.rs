//! Org unit reconciliation
//!
//! For a single facility the [`Reconciler`] runs, strictly in order:
//! match by DHIS2 id, match by code, and then either update/no-op on the
//! match or resolve a parent, optionally create the intermediate PHCU, and
//! create the facility's org unit. Destination errors come back as a
//! [`ReconcileFailure`]; nothing else escapes.

pub mod batch;
pub mod hierarchy;
pub mod models;

pub use batch::{BatchOrchestrator, BatchReport, ProgressFn};
pub use hierarchy::{HierarchyResolver, MAX_ANCESTOR_DEPTH};
pub use models::{OrgUnitRef, ReconcileFailure, ReconcileStage, ReconciliationOutcome};

use log::{error, info, warn};

use crate::api::OrgUnitApi;
use crate::models::{FacilityRecord, OrgUnit, OrgUnitParent, OrgUnitPayload};

pub struct Reconciler<'a> {
    api: &'a dyn OrgUnitApi,
    resolver: HierarchyResolver<'a>,
}

impl<'a> Reconciler<'a> {
    pub fn new(api: &'a dyn OrgUnitApi) -> Self {
        Self {
            api,
            resolver: HierarchyResolver::new(api),
        }
    }

    /// Reconcile one facility into DHIS2.
    ///
    /// With `update_if_exists` false an existing org unit is reported as
    /// [`ReconciliationOutcome::Unchanged`] without any write.
    pub async fn reconcile(
        &self,
        facility: &FacilityRecord,
        update_if_exists: bool,
    ) -> Result<ReconciliationOutcome, ReconcileFailure> {
        info!(
            "Processing facility '{}' (reports to '{}')",
            facility.name, facility.reports_to.name
        );

        let result = self.reconcile_steps(facility, update_if_exists).await;
        let summary = summarize(facility, &result);
        match &result {
            Ok(_) => info!("{}", summary),
            Err(_) => error!("{}", summary),
        }
        result
    }

    async fn reconcile_steps(
        &self,
        facility: &FacilityRecord,
        update_if_exists: bool,
    ) -> Result<ReconciliationOutcome, ReconcileFailure> {
        match self.find_existing(facility).await? {
            Some(existing) => {
                self.reconcile_existing(facility, existing, update_if_exists)
                    .await
            }
            None => self.reconcile_new(facility).await,
        }
    }

    /// Direct match on the known DHIS2 id, then on the MFR facility id as code
    async fn find_existing(
        &self,
        facility: &FacilityRecord,
    ) -> Result<Option<OrgUnit>, ReconcileFailure> {
        if let Some(dhis_id) = facility.known_dhis_id() {
            let found = self.api.get_by_id(dhis_id).await.map_err(|e| {
                ReconcileFailure::new(facility, ReconcileStage::LookupById, e)
            })?;
            if found.is_some() {
                return Ok(found);
            }
        }

        let code = facility.facility_id.trim();
        if code.is_empty() {
            return Ok(None);
        }
        self.api
            .get_by_code(code)
            .await
            .map_err(|e| ReconcileFailure::new(facility, ReconcileStage::LookupByCode, e))
    }

    async fn reconcile_existing(
        &self,
        facility: &FacilityRecord,
        existing: OrgUnit,
        update_if_exists: bool,
    ) -> Result<ReconciliationOutcome, ReconcileFailure> {
        let parent_org_unit_id = existing.parent_id().map(str::to_string);

        if !update_if_exists {
            return Ok(ReconciliationOutcome::Unchanged(OrgUnitRef {
                org_unit_id: existing.id,
                parent_org_unit_id,
                facility: facility.clone(),
            }));
        }

        // The update must not move the org unit in the hierarchy
        let mut payload = OrgUnitPayload::from_facility(facility);
        payload.parent = existing.parent.as_ref().map(|p| OrgUnitParent::new(p.id.clone()));

        let org_unit_id = self
            .api
            .update(&existing.id, &payload)
            .await
            .map_err(|e| ReconcileFailure::new(facility, ReconcileStage::UpdateOrgUnit, e))?;

        Ok(ReconciliationOutcome::Updated(OrgUnitRef {
            org_unit_id,
            parent_org_unit_id,
            facility: facility.clone(),
        }))
    }

    async fn reconcile_new(
        &self,
        facility: &FacilityRecord,
    ) -> Result<ReconciliationOutcome, ReconcileFailure> {
        let resolved_parent_id = self
            .resolver
            .resolve_parent(facility)
            .await
            .map_err(|e| ReconcileFailure::new(facility, ReconcileStage::ResolveParent, e))?;

        let Some(resolved_parent_id) = resolved_parent_id else {
            return Ok(ReconciliationOutcome::NoParentResolvable {
                facility_id: facility.id.clone(),
            });
        };

        let leaf_parent_id = if facility.needs_phcu() {
            self.create_phcu(facility, &resolved_parent_id)
                .await
                .unwrap_or_else(|| resolved_parent_id.clone())
        } else {
            resolved_parent_id
        };

        let org_unit_id = self
            .api
            .create(&OrgUnitPayload::from_facility(facility), &leaf_parent_id)
            .await
            .map_err(|e| ReconcileFailure::new(facility, ReconcileStage::CreateOrgUnit, e))?;

        Ok(ReconciliationOutcome::Created(OrgUnitRef {
            org_unit_id,
            parent_org_unit_id: Some(leaf_parent_id),
            facility: facility.clone(),
        }))
    }

    /// Create the intermediate PHCU; `None` (logged) if DHIS2 refuses it
    async fn create_phcu(&self, facility: &FacilityRecord, parent_id: &str) -> Option<String> {
        match self
            .api
            .create(&OrgUnitPayload::phcu_for(facility), parent_id)
            .await
        {
            Ok(phcu_id) => {
                info!(
                    "Created PHCU {} for '{}' under {}",
                    phcu_id, facility.name, parent_id
                );
                Some(phcu_id)
            }
            Err(e) => {
                warn!(
                    "Failed to create PHCU for '{}', creating it directly under {}: {}",
                    facility.name, parent_id, e
                );
                None
            }
        }
    }
}

/// One log line per reconciled facility, naming the facility and its reported parent
fn summarize(
    facility: &FacilityRecord,
    result: &Result<ReconciliationOutcome, ReconcileFailure>,
) -> String {
    match result {
        Ok(ReconciliationOutcome::NoParentResolvable { .. }) => format!(
            "No org unit found for any ancestor of '{}' (facility {}, reports to '{}')",
            facility.name, facility.facility_id, facility.reports_to.name
        ),
        Ok(outcome) => format!(
            "Facility '{}' (reports to '{}') {} as org unit {}",
            facility.name,
            facility.reports_to.name,
            outcome.label(),
            outcome.org_unit_id().unwrap_or_default()
        ),
        Err(failure) => format!(
            "Facility '{}' (reports to '{}') failed: {}",
            facility.name, facility.reports_to.name, failure
        ),
    }
}
