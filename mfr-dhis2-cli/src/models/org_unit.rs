//! DHIS2 organisation unit shapes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::facility::FacilityRecord;

/// DHIS2 rejects short names longer than this
pub const SHORT_NAME_MAX_LEN: usize = 50;

/// Field selection used when reading org units back from DHIS2
pub const ORG_UNIT_FIELDS: &str = "id,code,name,shortName,parent[id,name],openingDate";

/// An org unit as returned by the DHIS2 API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnit {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<OrgUnitParent>,
}

impl OrgUnit {
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.id.as_str())
    }
}

/// Reference to a parent org unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgUnitParent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl OrgUnitParent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// GeoJSON geometry; facilities only ever carry points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]`
    pub coordinates: Vec<f64>,
}

impl Geometry {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: vec![longitude, latitude],
        }
    }
}

/// Body sent when creating or updating an org unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnitPayload {
    pub name: String,
    pub short_name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<OrgUnitParent>,
}

impl OrgUnitPayload {
    /// Mirror a facility's attributes into an org unit body (no parent set)
    pub fn from_facility(facility: &FacilityRecord) -> Self {
        let short_name = facility
            .short_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&facility.name);

        let geometry = match (facility.longitude, facility.latitude) {
            (Some(lng), Some(lat)) => Some(Geometry::point(lng, lat)),
            _ => None,
        };

        Self {
            name: facility.name.clone(),
            short_name: truncate_short_name(short_name),
            code: facility.facility_id.clone(),
            opening_date: facility.opening_date,
            closed_date: facility.closed_date,
            geometry,
            phone_number: facility.phone_number.clone(),
            email: facility.email.clone(),
            parent: None,
        }
    }

    /// Body for the intermediate PHCU org unit created above a facility
    pub fn phcu_for(facility: &FacilityRecord) -> Self {
        let name = format!("{} PHCU", facility.name);
        Self {
            short_name: truncate_short_name(&name),
            name,
            code: format!("PHCU_{}", facility.facility_id),
            opening_date: facility.opening_date,
            closed_date: None,
            geometry: None,
            phone_number: None,
            email: None,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent = Some(OrgUnitParent::new(parent_id));
        self
    }
}

fn truncate_short_name(name: &str) -> String {
    name.trim().chars().take(SHORT_NAME_MAX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportsTo;
    use serde_json::json;

    fn facility() -> FacilityRecord {
        let mut facility =
            FacilityRecord::new("mfr-1", "F1", "Kebele Clinic", ReportsTo::named("Woreda A"));
        facility.latitude = Some(9.03);
        facility.longitude = Some(38.74);
        facility
    }

    #[test]
    fn test_payload_mirrors_facility() {
        let payload = OrgUnitPayload::from_facility(&facility());

        assert_eq!(payload.name, "Kebele Clinic");
        assert_eq!(payload.short_name, "Kebele Clinic");
        assert_eq!(payload.code, "F1");
        assert_eq!(payload.geometry, Some(Geometry::point(38.74, 9.03)));
        assert!(payload.parent.is_none());
    }

    #[test]
    fn test_short_name_is_truncated() {
        let mut facility = facility();
        facility.name = "x".repeat(80);

        let payload = OrgUnitPayload::from_facility(&facility);
        assert_eq!(payload.short_name.chars().count(), SHORT_NAME_MAX_LEN);
    }

    #[test]
    fn test_phcu_payload() {
        let payload = OrgUnitPayload::phcu_for(&facility()).with_parent("ouWoreda");

        assert_eq!(payload.name, "Kebele Clinic PHCU");
        assert_eq!(payload.code, "PHCU_F1");
        assert_eq!(payload.parent, Some(OrgUnitParent::new("ouWoreda")));
    }

    #[test]
    fn test_payload_serializes_dhis2_field_names() {
        let value = serde_json::to_value(OrgUnitPayload::from_facility(&facility()).with_parent("p1"))
            .unwrap();

        assert_eq!(value["shortName"], json!("Kebele Clinic"));
        assert_eq!(value["parent"], json!({ "id": "p1" }));
        assert_eq!(value["geometry"]["type"], json!("Point"));
        assert!(value.get("openingDate").is_none());
    }
}
