//! Parent resolution against the reported MFR hierarchy

use log::{debug, warn};

use crate::api::{ApiError, OrgUnitApi};
use crate::models::{FacilityRecord, ReportsTo};

/// How many reported ancestor levels are tried before giving up
pub const MAX_ANCESTOR_DEPTH: usize = 8;

/// Finds the nearest reported ancestor that already exists in DHIS2
pub struct HierarchyResolver<'a> {
    api: &'a dyn OrgUnitApi,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(api: &'a dyn OrgUnitApi) -> Self {
        Self { api }
    }

    /// Identifier of the first reported ancestor that exists as an org unit.
    ///
    /// Ancestors are tried nearest first. `None` when none of them exist.
    pub async fn resolve_parent(&self, facility: &FacilityRecord) -> Result<Option<String>, ApiError> {
        for (level, ancestor) in facility.ancestors().take(MAX_ANCESTOR_DEPTH).enumerate() {
            if let Some(org_unit_id) = self.lookup(ancestor).await? {
                debug!(
                    "Resolved parent of '{}' to '{}' ({}) at level {}",
                    facility.name, ancestor.name, org_unit_id, level + 1
                );
                return Ok(Some(org_unit_id));
            }
            debug!(
                "Ancestor '{}' of '{}' (level {}) not found in DHIS2",
                ancestor.name,
                facility.name,
                level + 1
            );
        }

        Ok(None)
    }

    /// Match one ancestor level: DHIS2 id, then code, then a unique name
    async fn lookup(&self, ancestor: &ReportsTo) -> Result<Option<String>, ApiError> {
        if let Some(id) = ancestor.known_dhis_id() {
            if let Some(org_unit) = self.api.get_by_id(id).await? {
                return Ok(Some(org_unit.id));
            }
        }

        if let Some(code) = ancestor.known_facility_id() {
            if let Some(org_unit) = self.api.get_by_code(code).await? {
                return Ok(Some(org_unit.id));
            }
        }

        let name = ancestor.name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let mut matches = self.api.find_by_name(name).await?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop().map(|org_unit| org_unit.id)),
            n => {
                warn!("{} org units are named '{}', skipping ambiguous ancestor", n, name);
                Ok(None)
            }
        }
    }
}
