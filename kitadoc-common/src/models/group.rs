//! Group record

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, alias = "gruppe_id")]
    pub group_id: String,
    pub name: String,
    #[serde(default, alias = "beschreibung")]
    pub description: String,
}

impl Group {
    pub const LEGACY_KEYS: &'static [(&'static str, &'static str)] = &[
        ("gruppe_id", "group_id"),
        ("beschreibung", "description"),
    ];

    /// Groups created on first start of an empty installation
    pub fn defaults() -> Vec<Group> {
        [
            ("Sonnengruppe", "Kinder im Alter von 3-4 Jahren"),
            ("Mondgruppe", "Kinder im Alter von 4-5 Jahren"),
            ("Sternengruppe", "Kinder im Alter von 5-6 Jahren"),
        ]
        .into_iter()
        .map(|(name, description)| Group {
            group_id: String::new(),
            name: name.to_string(),
            description: description.to_string(),
        })
        .collect()
    }
}
