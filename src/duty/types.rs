//! Duty data model.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Duty category, carried on the wire in the `duty` field.
///
/// Unrecognized values are kept as [`Category::Unknown`] rather than
/// rejected; the router decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Proposer,
    Attester,
    Aggregator,
    SyncCommittee,
    Unknown(String),
}

impl Category {
    /// The four categories that have a processing lane.
    pub const KNOWN: [Category; 4] = [
        Category::Proposer,
        Category::Attester,
        Category::Aggregator,
        Category::SyncCommittee,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Proposer => "PROPOSER",
            Category::Attester => "ATTESTER",
            Category::Aggregator => "AGGREGATOR",
            Category::SyncCommittee => "SYNC_COMMITTEE",
            Category::Unknown(raw) => raw,
        }
    }

    /// Bounded label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Proposer => "proposer",
            Category::Attester => "attester",
            Category::Aggregator => "aggregator",
            Category::SyncCommittee => "sync_committee",
            Category::Unknown(_) => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Unknown(_))
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Unknown(String::new())
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PROPOSER" => Category::Proposer,
            "ATTESTER" => Category::Attester,
            "AGGREGATOR" => Category::Aggregator,
            "SYNC_COMMITTEE" => Category::SyncCommittee,
            _ => Category::Unknown(raw),
        }
    }
}

impl From<&str> for Category {
    fn from(raw: &str) -> Self {
        Category::from(raw.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work received from the duty source.
///
/// Missing and `null` fields both take their zero value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Duty {
    /// Identifier of the validator the duty concerns.
    #[serde(deserialize_with = "null_as_default")]
    pub validator: String,
    /// Lane selector.
    #[serde(rename = "duty", deserialize_with = "null_as_default")]
    pub category: Category,
    /// Sequence marker from the source; not checked for ordering.
    #[serde(deserialize_with = "null_as_default")]
    pub height: u64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Duty {
    pub fn new(validator: impl Into<String>, category: impl Into<Category>, height: u64) -> Self {
        Self {
            validator: validator.into(),
            category: category.into(),
            height,
        }
    }
}

impl fmt::Display for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{validator: {}, duty: {}, height: {}}}",
            self.validator, self.category, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        for category in Category::KNOWN {
            let wire = category.as_str().to_string();
            assert_eq!(Category::from(wire), category);
            assert!(category.is_known());
        }
    }

    #[test]
    fn test_unknown_category_keeps_raw_value() {
        let category = Category::from("proposer");
        assert_eq!(category, Category::Unknown("proposer".into()));
        assert_eq!(category.as_str(), "proposer");
        assert_eq!(category.label(), "unknown");
        assert!(!category.is_known());
    }

    #[test]
    fn test_null_fields_take_zero_value() {
        let duty: Duty =
            serde_json::from_str(r#"{"validator":null,"duty":null,"height":null}"#).unwrap();
        assert_eq!(duty, Duty::default());

        let duty: Duty =
            serde_json::from_str(r#"{"validator":null,"duty":"PROPOSER","height":1}"#).unwrap();
        assert_eq!(duty, Duty::new("", Category::Proposer, 1));
    }

    #[test]
    fn test_duty_serializes_with_wire_field_name() {
        let duty = Duty::new("v1", Category::SyncCommittee, 7);
        let json = serde_json::to_value(&duty).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"validator": "v1", "duty": "SYNC_COMMITTEE", "height": 7})
        );
    }
}
