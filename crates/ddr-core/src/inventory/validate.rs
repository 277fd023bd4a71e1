//! Structural validation of hand-edited manifests.
//!
//! Validation never fails: manifests are edited by hand and a partially
//! valid file is the normal state of affairs, so faults are returned as data.

use crate::util::is_blank;
use serde::Serialize;
use serde_json::Value;

const STORE_FIELDS: &[&str] = &["repo", "org", "label", "location", "purchase_date", "collections"];
const COLLECTION_FIELDS: &[&str] = &["uuid", "cid", "level"];
const ENTITY_FIELDS: &[&str] = &["eid", "level"];
const ORGANIZATION_FIELDS: &[&str] = &["repo", "org", "id"];

/// Outcome of validating a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "faults", rename_all = "snake_case")]
pub enum Validation {
    Valid,
    /// Human-readable faults in document order.
    Faults(Vec<String>),
}

impl Validation {
    fn from_faults(faults: Vec<String>) -> Self {
        if faults.is_empty() {
            Validation::Valid
        } else {
            Validation::Faults(faults)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    pub fn faults(&self) -> &[String] {
        match self {
            Validation::Valid => &[],
            Validation::Faults(faults) => faults,
        }
    }
}

fn missing(data: &Value, fields: &[&str], prefix: &str, out: &mut Vec<String>) {
    for field in fields {
        if is_blank(data.get(*field)) {
            out.push(format!("{}missing field: {}", prefix, field));
        }
    }
}

/// Check a store manifest for missing fields.
///
/// Collections and entity overrides are numbered from one so a fault can
/// be traced back to its entry.
pub fn validate_store(data: &Value) -> Validation {
    let mut faults = Vec::new();
    missing(data, STORE_FIELDS, "", &mut faults);

    if let Some(collections) = data.get("collections").and_then(Value::as_array) {
        for (n, collection) in collections.iter().enumerate() {
            let n = n + 1;
            missing(collection, COLLECTION_FIELDS, &format!("collection {} ", n), &mut faults);
            if let Some(entities) = collection.get("entities").and_then(Value::as_array) {
                for (m, entity) in entities.iter().enumerate() {
                    missing(
                        entity,
                        ENTITY_FIELDS,
                        &format!("collection {} object {} ", n, m + 1),
                        &mut faults,
                    );
                }
            }
        }
    }

    Validation::from_faults(faults)
}

/// Check an organization descriptor for missing fields.
pub fn validate_organization(data: &Value) -> Validation {
    let mut faults = Vec::new();
    missing(data, ORGANIZATION_FIELDS, "", &mut faults);
    Validation::from_faults(faults)
}
