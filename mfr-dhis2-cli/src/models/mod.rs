//! Data model shared by the reconciliation services
//!
//! Facility records arrive from the master facility list (MFR) already
//! normalised; org units are the DHIS2 side of the mapping.

pub mod facility;
pub mod mfr;
pub mod org_unit;

pub use facility::{FacilityRecord, ReportsTo};
pub use mfr::{MfrFacility, MfrMeta, MfrResource, remap_mfr_to_dhis, LAST_UPDATED_KEY};
pub use org_unit::{Geometry, OrgUnit, OrgUnitParent, OrgUnitPayload};
