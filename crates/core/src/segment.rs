//! Segment domain types — trait schemas, the trait catalog, and the
//! submission payload sent to the segment collector.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{StudioError, StudioResult};

/// Category of a trait schema. User traits describe the individual,
/// group traits describe the account or organization they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitKind {
    User,
    Group,
}

/// One selectable trait: a display label, a unique key, and its category.
/// Immutable once part of a [`Catalog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitSchema {
    pub label: String,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: TraitKind,
}

impl TraitSchema {
    pub fn new(label: impl Into<String>, key: impl Into<String>, kind: TraitKind) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
            kind,
        }
    }
}

/// The fixed universe of traits a segment can be composed from.
///
/// Entries are ordered (display order for dropdowns) and unique by key.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<TraitSchema>,
}

impl Catalog {
    /// Build a catalog from the given entries, rejecting duplicate keys.
    pub fn new(entries: Vec<TraitSchema>) -> StudioResult<Self> {
        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.key.as_str()) {
                return Err(StudioError::DuplicateTraitKey(entry.key.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// The standard catalog of user and group traits.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                TraitSchema::new("First Name", "first_name", TraitKind::User),
                TraitSchema::new("Last Name", "last_name", TraitKind::User),
                TraitSchema::new("Gender", "gender", TraitKind::User),
                TraitSchema::new("Age", "age", TraitKind::User),
                TraitSchema::new("Account Name", "account_name", TraitKind::Group),
                TraitSchema::new("City", "city", TraitKind::Group),
                TraitSchema::new("State", "state", TraitKind::Group),
            ],
        }
    }

    pub fn get(&self, key: &str) -> Option<&TraitSchema> {
        self.entries.iter().find(|t| t.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraitSchema> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A selected schema as it appears in the submission payload: a single-key
/// map from trait key to display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry(pub TraitSchema);

impl Serialize for SchemaEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.0.key, &self.0.label)?;
        map.end()
    }
}

/// The payload POSTed to the segment collector on a successful submit.
/// `schema` preserves selection order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentPayload {
    pub segment_name: String,
    pub schema: Vec<SchemaEntry>,
}

impl SegmentPayload {
    pub fn new(segment_name: impl Into<String>, schemas: Vec<TraitSchema>) -> Self {
        Self {
            segment_name: segment_name.into(),
            schema: schemas.into_iter().map(SchemaEntry).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.len(), 7);

        let user_traits = catalog.iter().filter(|t| t.kind == TraitKind::User).count();
        let group_traits = catalog.iter().filter(|t| t.kind == TraitKind::Group).count();
        assert_eq!(user_traits, 4);
        assert_eq!(group_traits, 3);

        let age = catalog.get("age").unwrap();
        assert_eq!(age.label, "Age");
        assert_eq!(age.kind, TraitKind::User);
        assert!(catalog.get("shoe_size").is_none());
    }

    #[test]
    fn test_catalog_rejects_duplicate_keys() {
        let result = Catalog::new(vec![
            TraitSchema::new("City", "city", TraitKind::Group),
            TraitSchema::new("City Again", "city", TraitKind::User),
        ]);
        assert!(matches!(result, Err(StudioError::DuplicateTraitKey(k)) if k == "city"));
    }

    #[test]
    fn test_payload_serialization() {
        let payload = SegmentPayload::new(
            "VIP Users",
            vec![
                TraitSchema::new("First Name", "first_name", TraitKind::User),
                TraitSchema::new("City", "city", TraitKind::Group),
            ],
        );

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "segment_name": "VIP Users",
                "schema": [
                    { "first_name": "First Name" },
                    { "city": "City" }
                ]
            })
        );
    }
}
