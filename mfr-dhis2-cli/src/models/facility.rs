//! Normalised facility records coming out of the master facility list

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Facility types that never get an intermediate PHCU level, compared
/// case-insensitively
const PHCU_EXCLUDED_TYPES: &[&str] = &["office", "zonal health department"];

/// A facility as reported by the MFR, ready to be reconciled into DHIS2.
///
/// Never mutated during reconciliation; outcomes echo a clone of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityRecord {
    /// MFR resource identifier, recorded in the failed queue
    pub id: String,
    /// DHIS2 org unit identifier when the facility was synced before
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhis_id: Option<String>,
    /// MFR facility identifier, stored as the org unit `code`
    pub facility_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    /// Facility classification (e.g. "Health Center", "Office")
    #[serde(rename = "type", default)]
    pub facility_type: String,
    #[serde(default)]
    pub is_primary_health_care_unit: bool,
    pub reports_to: ReportsTo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// The parent a facility reports to in the MFR hierarchy.
///
/// Each level may carry its own parent, forming the ancestor chain walked
/// during parent resolution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsTo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhis_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports_to: Option<Box<ReportsTo>>,
}

impl FacilityRecord {
    /// Create a facility with only the required fields set
    pub fn new(
        id: impl Into<String>,
        facility_id: impl Into<String>,
        name: impl Into<String>,
        reports_to: ReportsTo,
    ) -> Self {
        Self {
            id: id.into(),
            dhis_id: None,
            facility_id: facility_id.into(),
            name: name.into(),
            short_name: None,
            facility_type: String::new(),
            is_primary_health_care_unit: false,
            reports_to,
            opening_date: None,
            closed_date: None,
            latitude: None,
            longitude: None,
            phone_number: None,
            email: None,
            last_updated: None,
        }
    }

    /// Whether an intermediate PHCU org unit must sit between this facility
    /// and its resolved parent
    pub fn needs_phcu(&self) -> bool {
        self.is_primary_health_care_unit && !self.is_office_or_zonal_health_department()
    }

    fn is_office_or_zonal_health_department(&self) -> bool {
        let facility_type = self.facility_type.trim();
        PHCU_EXCLUDED_TYPES
            .iter()
            .any(|excluded| facility_type.eq_ignore_ascii_case(excluded))
    }

    /// Known DHIS2 id, ignoring blank strings the MFR sometimes sends
    pub fn known_dhis_id(&self) -> Option<&str> {
        non_blank(self.dhis_id.as_deref())
    }

    /// Iterate the reported ancestors, nearest first
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: Some(&self.reports_to),
        }
    }
}

impl ReportsTo {
    /// A reported parent known only by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_dhis_id(mut self, dhis_id: impl Into<String>) -> Self {
        self.dhis_id = Some(dhis_id.into());
        self
    }

    pub fn with_facility_id(mut self, facility_id: impl Into<String>) -> Self {
        self.facility_id = Some(facility_id.into());
        self
    }

    pub fn with_parent(mut self, parent: ReportsTo) -> Self {
        self.reports_to = Some(Box::new(parent));
        self
    }

    pub fn known_dhis_id(&self) -> Option<&str> {
        non_blank(self.dhis_id.as_deref())
    }

    pub fn known_facility_id(&self) -> Option<&str> {
        non_blank(self.facility_id.as_deref())
    }
}

/// Iterator over a facility's reported ancestor chain
pub struct Ancestors<'a> {
    next: Option<&'a ReportsTo>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ReportsTo;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.reports_to.as_deref();
        Some(current)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
