//! Documentation content, one payload shape per documentation type
//!
//! On the wire a documentation record carries `documentation_type` and
//! `content` side by side. [`DocumentationContent::from_parts`] is the only
//! way in: it decodes content that older clients double-encoded as a JSON
//! string and rejects payloads whose shape does not match the type.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::normalise_keys;
use crate::{Error, Result};

/// Closed set of documentation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentationType {
    /// Eingewöhnungsgespräch
    #[serde(alias = "eingewoehnungsgespraech")]
    IntakeConversation,
    /// LEG-Gespräch
    #[serde(alias = "leg_gespraech")]
    DevelopmentConversation,
    /// VSG Beobachtungsbogen
    #[serde(alias = "vsg_beobachtungsbogen")]
    ObservationChecklist,
    /// Elterngespräch
    #[serde(alias = "elterngespraech")]
    ParentConversation,
}

impl DocumentationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentationType::IntakeConversation => "intake_conversation",
            DocumentationType::DevelopmentConversation => "development_conversation",
            DocumentationType::ObservationChecklist => "observation_checklist",
            DocumentationType::ParentConversation => "parent_conversation",
        }
    }
}

impl fmt::Display for DocumentationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intake conversation with guardians
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeConversation {
    #[serde(rename = "gefuehrt_von", default, skip_serializing_if = "Option::is_none")]
    pub led_by: Option<String>,
    #[serde(rename = "gefuehrt_mit", default, skip_serializing_if = "Option::is_none")]
    pub held_with: Option<String>,
    #[serde(rename = "themen", default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<String>,
    #[serde(rename = "elternwuensche", default, skip_serializing_if = "Option::is_none")]
    pub guardian_wishes: Option<String>,
    #[serde(rename = "elternbedenken", default, skip_serializing_if = "Option::is_none")]
    pub guardian_concerns: Option<String>,
    #[serde(rename = "kindererzaehlungen", default, skip_serializing_if = "Option::is_none")]
    pub child_stories: Option<String>,
    #[serde(rename = "absprachen", default, skip_serializing_if = "Option::is_none")]
    pub agreements: Option<String>,
    #[serde(rename = "nachbesprechung", default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(rename = "folgetermin", default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_date: Option<String>,
}

impl IntakeConversation {
    /// Recording form key → canonical key
    pub const LEGACY_KEYS: &'static [(&'static str, &'static str)] = &[
        ("eingewoehnung_gefuehrt_von", "gefuehrt_von"),
        ("eingewoehnung_gefuehrt_mit", "gefuehrt_mit"),
        ("eingewoehnung_themen", "themen"),
        ("eingewoehnung_elternwuensche", "elternwuensche"),
        ("eingewoehnung_elternbedenken", "elternbedenken"),
        ("eingewoehnung_kindererzaehlungen", "kindererzaehlungen"),
        ("eingewoehnung_absprachen", "absprachen"),
        ("eingewoehnung_nachbesprechung", "nachbesprechung"),
        ("eingewoehnung_folgetermin", "folgetermin"),
    ];
}

/// Periodic development conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevelopmentConversation {
    #[serde(rename = "anlass", default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(rename = "gespraechspartner", default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<String>,
    #[serde(rename = "besprochene_themen", default, skip_serializing_if = "Option::is_none")]
    pub topics_discussed: Option<String>,
    #[serde(rename = "vereinbarungen", default, skip_serializing_if = "Option::is_none")]
    pub agreements: Option<String>,
    #[serde(rename = "naechste_schritte", default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<String>,
}

/// Ad hoc parent conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentConversation {
    #[serde(rename = "anlass", default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(rename = "gespraechspartner", default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<String>,
    #[serde(rename = "themen", default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<String>,
}

/// Observation checklist category (A–H)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssessmentCategory {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl AssessmentCategory {
    pub const ALL: [AssessmentCategory; 8] = [
        AssessmentCategory::A,
        AssessmentCategory::B,
        AssessmentCategory::C,
        AssessmentCategory::D,
        AssessmentCategory::E,
        AssessmentCategory::F,
        AssessmentCategory::G,
        AssessmentCategory::H,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AssessmentCategory::A => "A: Sozialverhalten/Konfliktverhalten",
            AssessmentCategory::B => "B: Selbstständigkeit",
            AssessmentCategory::C => "C: Arbeitsverhalten/Merkfähigkeit",
            AssessmentCategory::D => "D: Zahlenverständnis/Mengenverständnis",
            AssessmentCategory::E => "E: Sprache",
            AssessmentCategory::F => "F: Farben und Formen",
            AssessmentCategory::G => "G: Grobmotorik",
            AssessmentCategory::H => "H: Feinmotorik/Graphomotorik",
        }
    }

    /// Checklist items; assessments are keyed by index into this slice
    pub fn items(&self) -> &'static [&'static str] {
        match self {
            AssessmentCategory::A => &[
                "spielt mit anderen Kindern",
                "kommt im allgemeinen mit Kindern gut aus",
                "kann Kritik annehmen",
                "kann gesetzte Regeln einhalten",
                "ist bemüht Konflikte verbal zu lösen",
            ],
            AssessmentCategory::B => &[
                "kann die Toilette ohne Hilfe benutzen",
                "kann Mantel und Jacke anziehen und schließen",
                "kann die Schuhe zubinden",
                "kann seinen Namen und seine Adresse angeben",
            ],
            AssessmentCategory::C => &[
                "kann kleine Arbeitsaufträge durchführen",
                "beteiligt sich aktiv an Gruppenaktivitäten",
                "fragt nach, wenn es etwas nicht verstanden hat",
                "kann sich mit einer Sache ausdauernd beschäftigen",
                "kann Arbeitsaufträge zusammen mit anderen Kindern ausführen",
                "kommt gern in den Kindergarten",
            ],
            AssessmentCategory::D => &[
                "zählt sicher bis 10",
                "Simultanerfassung des Würfels und Mengenerfassung bis 6",
                "kann sich Reihenfolgen sicher merken",
            ],
            AssessmentCategory::E => &[
                "spricht in ganzen Sätzen",
                "erzählt zusammenhängend und verständlich",
                "spricht deutlich und artikuliert",
                "beherrscht die deutsche Sprache",
                "spricht grammatikalisch korrekt",
            ],
            AssessmentCategory::F => &[
                "erkennt und benennt die wichtigsten Farben",
                "erkennt und benennt Kreis, Viereck und Dreieck",
                "kann einzelne Formen herausfinden und kennzeichnen",
            ],
            AssessmentCategory::G => &[
                "kann das Gleichgewicht halten",
                "Bewegungen sind flüssig / Lateralität",
                "Bewegungsabläufe sind altersgerecht entwickelt",
            ],
            AssessmentCategory::H => &[
                "beherrscht Dreipunktgriff",
                "kann die Mittellinie kreuzen",
                "arbeitet aus dem Handgelenk",
                "kann auf der Linie schneiden",
            ],
        }
    }
}

/// Likert-style rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "sicher")]
    Confident,
    #[serde(rename = "ueberwiegend")]
    Mostly,
    #[serde(rename = "teilweise")]
    Partially,
    #[serde(rename = "noch_nicht")]
    NotYet,
    #[serde(rename = "sonstiges")]
    Other,
}

/// Rating of a single checklist item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemAssessment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Rating>,
    /// Free text accompanying [`Rating::Other`]
    #[serde(rename = "sonstigesText", default, skip_serializing_if = "Option::is_none")]
    pub other_text: Option<String>,
}

/// Category-based developmental assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservationChecklist {
    #[serde(rename = "geburtsdatum", default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(rename = "geschlecht", default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "therapien", default, skip_serializing_if = "Option::is_none")]
    pub therapies: Option<String>,
    #[serde(rename = "therapien_seit", default, skip_serializing_if = "Option::is_none")]
    pub therapies_since: Option<String>,
    #[serde(rename = "vsg_assessments", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assessments: BTreeMap<AssessmentCategory, BTreeMap<usize, ItemAssessment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Dictated remarks before they were edited into `remarks`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks_transcription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsg_patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsg_patient_name: Option<String>,
}

impl ObservationChecklist {
    /// Assessment form key → canonical key
    pub const LEGACY_KEYS: &'static [(&'static str, &'static str)] = &[
        ("vsg_geburtsdatum", "geburtsdatum"),
        ("vsg_geschlecht", "geschlecht"),
        ("vsg_therapien", "therapien"),
        ("vsg_therapien_seit", "therapien_seit"),
        ("vsg_bemerkungen", "remarks"),
        ("vsg_bemerkungen_transcription", "remarks_transcription"),
    ];

    /// Every assessed item index must exist in its category
    fn check_item_indices(&self) -> Result<()> {
        for (category, items) in &self.assessments {
            let count = category.items().len();
            if let Some(index) = items.keys().find(|index| **index >= count) {
                return Err(Error::Validation(format!(
                    "content.vsg_assessments.{:?}: item {} out of range (category has {} items)",
                    category, index, count
                )));
            }
        }
        Ok(())
    }
}

/// Documentation payload keyed by documentation type
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentationContent {
    Intake(IntakeConversation),
    Development(DevelopmentConversation),
    Observation(ObservationChecklist),
    Parent(ParentConversation),
    /// Free-text transcript or bullet list, with or without a type
    Notes {
        kind: Option<DocumentationType>,
        text: String,
    },
}

impl DocumentationContent {
    pub fn documentation_type(&self) -> Option<DocumentationType> {
        match self {
            DocumentationContent::Intake(_) => Some(DocumentationType::IntakeConversation),
            DocumentationContent::Development(_) => Some(DocumentationType::DevelopmentConversation),
            DocumentationContent::Observation(_) => Some(DocumentationType::ObservationChecklist),
            DocumentationContent::Parent(_) => Some(DocumentationType::ParentConversation),
            DocumentationContent::Notes { kind, .. } => *kind,
        }
    }

    /// Build content from the wire pair, validating shape against type
    ///
    /// Text is accepted for every type; objects must match the type's payload.
    pub fn from_parts(kind: Option<DocumentationType>, content: Option<Value>) -> Result<Self> {
        let content = content.map(decode_double_encoded);

        let Some(kind) = kind else {
            return match content {
                None | Some(Value::Null) => Ok(DocumentationContent::Notes { kind: None, text: String::new() }),
                Some(Value::String(text)) => Ok(DocumentationContent::Notes { kind: None, text }),
                Some(_) => Err(Error::Validation(
                    "content must be text when documentation_type is not set".to_string(),
                )),
            };
        };

        let payload = match content {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            // merged bullet points or a raw transcript saved under a type
            Some(Value::String(text)) => {
                return Ok(DocumentationContent::Notes { kind: Some(kind), text })
            }
            Some(_) => {
                return Err(Error::Validation(format!(
                    "content for {} must be an object or text",
                    kind
                )))
            }
        };

        let shape_error =
            |e: serde_json::Error| Error::Validation(format!("content does not match {}: {}", kind, e));

        Ok(match kind {
            DocumentationType::IntakeConversation => {
                let payload = normalise_keys(payload, IntakeConversation::LEGACY_KEYS);
                DocumentationContent::Intake(
                    serde_json::from_value(Value::Object(payload)).map_err(shape_error)?,
                )
            }
            DocumentationType::DevelopmentConversation => DocumentationContent::Development(
                serde_json::from_value(Value::Object(payload)).map_err(shape_error)?,
            ),
            DocumentationType::ObservationChecklist => {
                let payload = normalise_keys(payload, ObservationChecklist::LEGACY_KEYS);
                let checklist: ObservationChecklist =
                    serde_json::from_value(Value::Object(payload)).map_err(shape_error)?;
                checklist.check_item_indices()?;
                DocumentationContent::Observation(checklist)
            }
            DocumentationType::ParentConversation => DocumentationContent::Parent(
                serde_json::from_value(Value::Object(payload)).map_err(shape_error)?,
            ),
        })
    }

    /// Canonical wire form of the payload (plain object or text)
    pub fn to_value(&self) -> Value {
        let encoded = match self {
            DocumentationContent::Intake(c) => serde_json::to_value(c),
            DocumentationContent::Development(c) => serde_json::to_value(c),
            DocumentationContent::Observation(c) => serde_json::to_value(c),
            DocumentationContent::Parent(c) => serde_json::to_value(c),
            DocumentationContent::Notes { text, .. } => return Value::String(text.clone()),
        };
        // Plain structs of strings and string-keyed maps always encode
        encoded.unwrap_or(Value::Null)
    }
}

/// `"{\"themen\":\"...\"}"` → `{"themen":"..."}`; anything else passes through
fn decode_double_encoded(value: Value) -> Value {
    if let Value::String(text) = &value {
        if text.trim_start().starts_with('{') {
            if let Ok(decoded @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
                return decoded;
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_type_names_parse() {
        let kind: DocumentationType = serde_json::from_value(json!("leg_gespraech")).unwrap();
        assert_eq!(kind, DocumentationType::DevelopmentConversation);
        assert_eq!(serde_json::to_value(kind).unwrap(), json!("development_conversation"));
    }

    #[test]
    fn test_intake_object_parses() {
        let content = DocumentationContent::from_parts(
            Some(DocumentationType::IntakeConversation),
            Some(json!({"gefuehrt_von": "Frau Weber", "themen": "Schlafen"})),
        )
        .unwrap();

        match &content {
            DocumentationContent::Intake(intake) => {
                assert_eq!(intake.led_by.as_deref(), Some("Frau Weber"));
                assert_eq!(intake.topics.as_deref(), Some("Schlafen"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
        assert_eq!(
            content.to_value(),
            json!({"gefuehrt_von": "Frau Weber", "themen": "Schlafen"})
        );
    }

    #[test]
    fn test_double_encoded_content_is_decoded() {
        let encoded = json!({"anlass": "Halbjahr", "vereinbarungen": "Logopädie"}).to_string();
        let content = DocumentationContent::from_parts(
            Some(DocumentationType::DevelopmentConversation),
            Some(Value::String(encoded)),
        )
        .unwrap();

        assert_eq!(
            content.to_value(),
            json!({"anlass": "Halbjahr", "vereinbarungen": "Logopädie"})
        );
    }

    #[test]
    fn test_mismatched_shape_is_rejected() {
        // development fields sent as an intake conversation
        let err = DocumentationContent::from_parts(
            Some(DocumentationType::IntakeConversation),
            Some(json!({"naechste_schritte": "..."})),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_typed_record_keeps_text() {
        let content = DocumentationContent::from_parts(
            Some(DocumentationType::ParentConversation),
            Some(json!("• - Punkt eins\n• - Punkt zwei")),
        )
        .unwrap();

        assert_eq!(content.documentation_type(), Some(DocumentationType::ParentConversation));
        assert_eq!(content.to_value(), json!("• - Punkt eins\n• - Punkt zwei"));
    }

    #[test]
    fn test_non_object_non_text_is_rejected() {
        let err = DocumentationContent::from_parts(
            Some(DocumentationType::ParentConversation),
            Some(json!(["- Punkt"])),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be an object or text"));
    }

    #[test]
    fn test_untyped_record_keeps_text() {
        let content = DocumentationContent::from_parts(None, Some(json!("Transkript"))).unwrap();
        assert_eq!(
            content,
            DocumentationContent::Notes { kind: None, text: "Transkript".to_string() }
        );
        assert_eq!(content.documentation_type(), None);

        let empty = DocumentationContent::from_parts(None, None).unwrap();
        assert_eq!(empty, DocumentationContent::Notes { kind: None, text: String::new() });
    }

    #[test]
    fn test_recording_form_intake_keys_are_renamed() {
        let content = DocumentationContent::from_parts(
            Some(DocumentationType::IntakeConversation),
            Some(json!({
                "session_date": "2024-03-01",
                "eingewoehnung_gefuehrt_von": "Frau Weber",
                "eingewoehnung_gefuehrt_mit": "Mutter",
                "eingewoehnung_themen": "Schlafen",
                "eingewoehnung_absprachen": "",
                "eingewoehnung_nachbesprechung": "",
                "eingewoehnung_folgetermin": "2024-04-01"
            })),
        )
        .unwrap();

        let value = content.to_value();
        assert_eq!(value["gefuehrt_von"], "Frau Weber");
        assert_eq!(value["themen"], "Schlafen");
        assert_eq!(value["folgetermin"], "2024-04-01");
        assert_eq!(value["session_date"], "2024-03-01");
        assert!(value.get("eingewoehnung_themen").is_none());
    }

    #[test]
    fn test_assessment_form_keys_are_renamed() {
        let content = DocumentationContent::from_parts(
            Some(DocumentationType::ObservationChecklist),
            Some(json!({
                "vsg_geburtsdatum": "2019-05-04",
                "vsg_geschlecht": "weiblich",
                "vsg_therapien": "Ergotherapie",
                "vsg_therapien_seit": "2023",
                "vsg_assessments": {"B": {"0": {"value": "ueberwiegend"}}},
                "vsg_bemerkungen": "ruhig",
                "vsg_bemerkungen_transcription": "sie ist ruhig",
                "vsg_patient_id": "p-1",
                "vsg_patient_name": "Mia Schulz"
            })),
        )
        .unwrap();

        let DocumentationContent::Observation(checklist) = &content else {
            panic!("expected checklist");
        };
        assert_eq!(checklist.date_of_birth.as_deref(), Some("2019-05-04"));
        assert_eq!(checklist.therapies_since.as_deref(), Some("2023"));
        assert_eq!(checklist.remarks.as_deref(), Some("ruhig"));
        assert_eq!(checklist.remarks_transcription.as_deref(), Some("sie ist ruhig"));

        let value = content.to_value();
        assert_eq!(value["geschlecht"], "weiblich");
        assert!(value.get("vsg_bemerkungen").is_none());
    }

    #[test]
    fn test_canonical_remarks_win_over_form_key() {
        let content = DocumentationContent::from_parts(
            Some(DocumentationType::ObservationChecklist),
            Some(json!({"vsg_bemerkungen": "alt", "remarks": "neu"})),
        )
        .unwrap();
        assert_eq!(content.to_value(), json!({"remarks": "neu"}));
    }

    #[test]
    fn test_missing_content_defaults_to_empty_payload() {
        let content =
            DocumentationContent::from_parts(Some(DocumentationType::ParentConversation), None).unwrap();
        assert_eq!(content, DocumentationContent::Parent(ParentConversation::default()));
        assert_eq!(content.to_value(), json!({}));
    }

    #[test]
    fn test_checklist_assessments_parse() {
        let content = DocumentationContent::from_parts(
            Some(DocumentationType::ObservationChecklist),
            Some(json!({
                "vsg_assessments": {
                    "A": {"0": {"value": "sicher"}, "4": {"value": "sonstiges", "sonstigesText": "selten"}},
                    "H": {"1": {"value": "noch_nicht"}}
                },
                "remarks": "aufmerksam"
            })),
        )
        .unwrap();

        let DocumentationContent::Observation(checklist) = content else {
            panic!("expected checklist");
        };
        let a = &checklist.assessments[&AssessmentCategory::A];
        assert_eq!(a[&0].value, Some(Rating::Confident));
        assert_eq!(a[&4].other_text.as_deref(), Some("selten"));
        assert_eq!(
            checklist.assessments[&AssessmentCategory::H][&1].value,
            Some(Rating::NotYet)
        );
    }

    #[test]
    fn test_checklist_item_out_of_range_is_rejected() {
        // category D has three items
        let err = DocumentationContent::from_parts(
            Some(DocumentationType::ObservationChecklist),
            Some(json!({"vsg_assessments": {"D": {"3": {"value": "teilweise"}}}})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_catalogue_sizes() {
        let sizes: Vec<usize> = AssessmentCategory::ALL.iter().map(|c| c.items().len()).collect();
        assert_eq!(sizes, vec![5, 4, 6, 3, 5, 3, 3, 4]);
        assert!(AssessmentCategory::E.title().ends_with("Sprache"));
    }
}
