//! Patient (child) record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A child enrolled at the facility
///
/// Keys not modelled here are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default)]
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, alias = "gruppe_id", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, alias = "eltern_vorname", skip_serializing_if = "Option::is_none")]
    pub guardian_first_name: Option<String>,
    #[serde(default, alias = "eltern_nachname", skip_serializing_if = "Option::is_none")]
    pub guardian_last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Patient {
    /// Legacy key → canonical key
    pub const LEGACY_KEYS: &'static [(&'static str, &'static str)] = &[
        ("gruppe_id", "group_id"),
        ("eltern_vorname", "guardian_first_name"),
        ("eltern_nachname", "guardian_last_name"),
    ];

    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_keys_are_accepted() {
        let patient: Patient = serde_json::from_value(json!({
            "patient_id": "p-1",
            "first_name": "Mia",
            "last_name": "Schulz",
            "gruppe_id": "g-1",
            "eltern_vorname": "Anna",
            "eltern_nachname": "Schulz"
        }))
        .unwrap();

        assert_eq!(patient.group_id.as_deref(), Some("g-1"));
        assert_eq!(patient.guardian_first_name.as_deref(), Some("Anna"));
        assert!(patient.extra.is_empty());
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let input = json!({
            "patient_id": "p-2",
            "first_name": "Leo",
            "last_name": "Brandt",
            "allergies": "Nüsse"
        });
        let patient: Patient = serde_json::from_value(input).unwrap();
        assert_eq!(patient.extra.get("allergies"), Some(&json!("Nüsse")));

        let output = serde_json::to_value(&patient).unwrap();
        assert_eq!(output["allergies"], "Nüsse");
        assert!(output.get("notes").is_none());
        assert_eq!(patient.full_name(), "Leo Brandt");
    }
}
