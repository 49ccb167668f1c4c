//! Record models
//!
//! Wire names follow the frontend's JSON (snake_case, German content keys);
//! legacy key names written by older frontend builds are accepted on input.

mod content;
mod documentation;
mod group;
mod patient;

pub use content::{
    AssessmentCategory, DevelopmentConversation, DocumentationContent, DocumentationType,
    IntakeConversation, ItemAssessment, ObservationChecklist, ParentConversation, Rating,
};
pub use documentation::{Documentation, DocumentationStatus, RecordingMethod};
pub use group::Group;
pub use patient::Patient;

/// Treat JSON `null`, missing and blank strings alike, as the frontend does
pub(crate) fn is_blank(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}
