use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    BRAND_NAME, CREATED_AT, DEFAULT_NUMBER_OF_LOCATIONS, HEADQUARTERS, MIN_YEAR_FOUNDED,
    NUMBER_OF_LOCATIONS, UPDATED_AT, YEAR_FOUNDED,
};

/// A stored document: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Loosely-typed input record as read from the store. Nothing is guaranteed about its shape.
pub type RawRecord = Document;

/// A brand in the canonical schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalBrand {
    pub brand_name: String,
    pub year_founded: i32,
    pub headquarters: String,
    pub number_of_locations: i64,
    #[serde(flatten)]
    pub metadata: RecordMetadata,
}

/// Timestamps owned by the storage layer, carried through normalization unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Value>,
}

impl RecordMetadata {
    pub fn from_raw(record: &RawRecord) -> Self {
        let passthrough = |key: &str| record.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            created_at: passthrough(CREATED_AT),
            updated_at: passthrough(UPDATED_AT),
        }
    }
}

impl CanonicalBrand {
    /// Check every field constraint against the given upper bound for `yearFounded`.
    pub fn satisfies_constraints(&self, current_year: i32) -> bool {
        !self.brand_name.trim().is_empty()
            && !self.headquarters.trim().is_empty()
            && i64::from(self.year_founded) >= MIN_YEAR_FOUNDED
            && self.year_founded <= current_year
            && self.number_of_locations >= DEFAULT_NUMBER_OF_LOCATIONS
    }

    /// Materialize as a storage document holding only the canonical fields and metadata.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(BRAND_NAME.to_string(), Value::from(self.brand_name.clone()));
        doc.insert(YEAR_FOUNDED.to_string(), Value::from(self.year_founded));
        doc.insert(HEADQUARTERS.to_string(), Value::from(self.headquarters.clone()));
        doc.insert(
            NUMBER_OF_LOCATIONS.to_string(),
            Value::from(self.number_of_locations),
        );
        if let Some(created_at) = &self.metadata.created_at {
            doc.insert(CREATED_AT.to_string(), created_at.clone());
        }
        if let Some(updated_at) = &self.metadata.updated_at {
            doc.insert(UPDATED_AT.to_string(), updated_at.clone());
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn brand() -> CanonicalBrand {
        CanonicalBrand {
            brand_name: "Acme".to_string(),
            year_founded: 1850,
            headquarters: "Boston, USA".to_string(),
            number_of_locations: 12,
            metadata: RecordMetadata {
                created_at: Some(json!("2024-01-02T03:04:05Z")),
                updated_at: None,
            },
        }
    }

    #[test]
    fn document_contains_only_canonical_fields_and_present_metadata() {
        let doc = brand().to_document();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(doc.len(), 5);
        assert!(keys.contains(&"brandName"));
        assert!(keys.contains(&"createdAt"));
        assert!(!keys.contains(&"updatedAt"));
        assert_eq!(doc["yearFounded"], json!(1850));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(brand()).unwrap();
        assert_eq!(value["numberOfLocations"], json!(12));
        assert_eq!(value["createdAt"], json!("2024-01-02T03:04:05Z"));
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn metadata_ignores_null_timestamps() {
        let raw = json!({ "createdAt": null, "updatedAt": "2024-05-05" });
        let meta = RecordMetadata::from_raw(raw.as_object().unwrap());
        assert_eq!(meta.created_at, None);
        assert_eq!(meta.updated_at, Some(json!("2024-05-05")));
    }

    #[test]
    fn constraint_check_rejects_future_years() {
        let mut b = brand();
        assert!(b.satisfies_constraints(2024));
        b.year_founded = 2030;
        assert!(!b.satisfies_constraints(2024));
    }
}
