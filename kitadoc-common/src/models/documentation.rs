//! Documentation record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::content::{DocumentationContent, DocumentationType};
use crate::Error;

/// How the session was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingMethod {
    #[serde(alias = "live")]
    LiveRecording,
    #[serde(alias = "manual")]
    ManualInput,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentationStatus {
    #[default]
    Draft,
    Completed,
    Archived,
}

/// A documented session for one patient
///
/// Serialized through [`DocumentationWire`] so that `documentation_type`
/// and `content` are validated together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DocumentationWire", into = "DocumentationWire")]
pub struct Documentation {
    pub documentation_id: String,
    pub patient_id: String,
    pub content: DocumentationContent,
    pub session_title: String,
    pub session_date: String,
    pub recording_method: RecordingMethod,
    pub status: DocumentationStatus,
    pub consent_given: bool,
    pub duration_minutes: Option<f64>,
    pub uploaded_file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Keys not modelled here, kept verbatim
    pub extra: Map<String, Value>,
}

impl Documentation {
    pub fn documentation_type(&self) -> Option<DocumentationType> {
        self.content.documentation_type()
    }
}

#[derive(Serialize, Deserialize)]
struct DocumentationWire {
    #[serde(default)]
    documentation_id: String,
    patient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    documentation_type: Option<DocumentationType>,
    session_title: String,
    session_date: String,
    recording_method: RecordingMethod,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    status: DocumentationStatus,
    #[serde(default)]
    consent_given: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uploaded_file_url: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

// Serde carries this error as text; the store adds the validation prefix
impl TryFrom<DocumentationWire> for Documentation {
    type Error = String;

    fn try_from(wire: DocumentationWire) -> Result<Self, Self::Error> {
        let content = DocumentationContent::from_parts(wire.documentation_type, wire.content)
            .map_err(|e| match e {
                Error::Validation(message) => message,
                other => other.to_string(),
            })?;
        Ok(Documentation {
            documentation_id: wire.documentation_id,
            patient_id: wire.patient_id,
            content,
            session_title: wire.session_title,
            session_date: wire.session_date,
            recording_method: wire.recording_method,
            status: wire.status,
            consent_given: wire.consent_given,
            duration_minutes: wire.duration_minutes,
            uploaded_file_url: wire.uploaded_file_url,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
            extra: wire.extra,
        })
    }
}

impl From<Documentation> for DocumentationWire {
    fn from(doc: Documentation) -> Self {
        DocumentationWire {
            documentation_type: doc.content.documentation_type(),
            content: Some(doc.content.to_value()),
            documentation_id: doc.documentation_id,
            patient_id: doc.patient_id,
            session_title: doc.session_title,
            session_date: doc.session_date,
            recording_method: doc.recording_method,
            status: doc.status,
            consent_given: doc.consent_given,
            duration_minutes: doc.duration_minutes,
            uploaded_file_url: doc.uploaded_file_url,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            extra: doc.extra,
        }
    }
}
