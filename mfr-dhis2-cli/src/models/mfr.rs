//! Raw MFR facility resources and their datastore representation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Datastore key holding the MFR modification timestamp
pub const LAST_UPDATED_KEY: &str = "resource.meta.lastUpdated";

/// A facility entry as delivered by the MFR API (FHIR `Location` bundle entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfrFacility {
    pub resource: MfrResource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfrResource {
    pub id: String,
    #[serde(default)]
    pub meta: MfrMeta,
    /// Everything else on the resource is carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfrMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MfrFacility {
    pub fn id(&self) -> &str {
        &self.resource.id
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.resource.meta.last_updated.as_deref()
    }
}

/// Remap an MFR facility into the flat shape stored in the approval
/// datastore: every leaf becomes a dotted-path key, arrays indexed by
/// position (`resource.identifier.0.value`).
pub fn remap_mfr_to_dhis(facility: &MfrFacility) -> Value {
    let mut flat = Map::new();
    // MfrFacility only holds JSON-compatible data
    if let Ok(value) = serde_json::to_value(facility) {
        flatten_into(&mut flat, None, value);
    }
    Value::Object(flat)
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<String>, value: Value) {
    let join = |key: &str| match &prefix {
        Some(p) => format!("{}.{}", p, key),
        None => key.to_string(),
    };

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(out, Some(join(&key)), child);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.into_iter().enumerate() {
                flatten_into(out, Some(join(&index.to_string())), child);
            }
        }
        leaf => {
            if let Some(key) = prefix {
                out.insert(key, leaf);
            }
        }
    }
}
