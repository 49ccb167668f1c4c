//! Documentation store

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::collection::decode_record;
use super::{Collection, Fields, MemoryPersistence, Persistence, Record};
use crate::models::{is_blank, Documentation};
use crate::{ids, time, Error, Result};

const REQUIRED_FIELDS: [&str; 4] = ["patient_id", "session_title", "session_date", "recording_method"];

impl Record for Documentation {
    const KIND: &'static str = "documentation";
    const ID_PREFIX: &'static str = ids::DOCUMENTATION_PREFIX;

    fn id(&self) -> &str {
        &self.documentation_id
    }

    fn set_id(&mut self, id: String) {
        self.documentation_id = id;
    }

    fn touch(&mut self) {
        self.updated_at = Some(time::now());
    }
}

/// Exact-match filter for [`DocumentationStore::list`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentationFilter {
    pub patient_id: Option<String>,
    pub documentation_id: Option<String>,
}

impl DocumentationFilter {
    pub fn for_patient(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: Some(patient_id.into()),
            documentation_id: None,
        }
    }

    /// Empty filter values count as absent
    fn matches(&self, doc: &Documentation) -> bool {
        fn accepts(wanted: &Option<String>, actual: &str) -> bool {
            match wanted.as_deref() {
                Some(id) if !id.is_empty() => id == actual,
                _ => true,
            }
        }
        accepts(&self.patient_id, &doc.patient_id)
            && accepts(&self.documentation_id, &doc.documentation_id)
    }
}

pub struct DocumentationStore {
    docs: Collection<Documentation>,
}

impl DocumentationStore {
    pub fn new(persistence: Arc<dyn Persistence<Documentation>>) -> Self {
        Self {
            docs: Collection::new(persistence),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPersistence::<Documentation>::new()))
    }

    pub fn describe(&self) -> String {
        self.docs.describe()
    }

    pub fn list(&self, filter: &DocumentationFilter) -> Result<Vec<Documentation>> {
        let mut docs = self.docs.all()?;
        docs.retain(|doc| filter.matches(doc));
        Ok(docs)
    }

    pub fn get(&self, id: &str) -> Result<Documentation> {
        self.docs.find(id)
    }

    /// Create a documentation record
    ///
    /// The ID and `created_at` are always assigned here; `status` defaults
    /// to draft when the client does not send one.
    pub fn create(&self, mut fields: Fields) -> Result<Documentation> {
        let missing: Vec<&str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|key| is_blank(fields.get(*key)))
            .collect();
        if !missing.is_empty() {
            return Err(Error::missing_fields(&missing));
        }

        fields.remove("documentation_id");
        fields.remove("updated_at");
        fields.insert("created_at".to_string(), Value::String(time::to_iso(time::now())));
        if fields.get("status").is_some_and(Value::is_null) {
            fields.remove("status");
        }

        let doc = self.docs.insert(decode_record(fields.into())?)?;
        info!(
            documentation_id = %doc.documentation_id,
            patient_id = %doc.patient_id,
            documentation_type = ?doc.documentation_type(),
            "Documentation created"
        );
        Ok(doc)
    }

    pub fn update(&self, id: &str, mut patch: Fields) -> Result<Documentation> {
        patch.remove("created_at");
        let doc = self.docs.merge(id, patch)?;
        info!(documentation_id = %id, status = ?doc.status, "Documentation updated");
        Ok(doc)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.docs.remove(id)?;
        info!(documentation_id = %id, "Documentation deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentationContent, DocumentationStatus, DocumentationType};
    use serde_json::json;
    use std::collections::HashSet;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn intake(patient_id: &str) -> Fields {
        fields(json!({
            "patient_id": patient_id,
            "documentation_type": "intake_conversation",
            "session_title": "Eingewöhnung",
            "session_date": "2024-03-01",
            "recording_method": "manual_input",
            "content": {"themen": "Abschied am Morgen"}
        }))
    }

    #[test]
    fn test_create_assigns_defaults() {
        let store = DocumentationStore::in_memory();
        let doc = store.create(intake("p-1")).unwrap();

        assert!(doc.documentation_id.starts_with("d-"));
        assert_eq!(doc.status, DocumentationStatus::Draft);
        assert!(doc.updated_at.is_none());
        assert_eq!(doc.documentation_type(), Some(DocumentationType::IntakeConversation));
    }

    #[test]
    fn test_create_ids_are_unique() {
        let store = DocumentationStore::in_memory();
        let mut seen = HashSet::new();
        for _ in 0..20 {
            let doc = store.create(intake("p-1")).unwrap();
            assert!(seen.insert(doc.documentation_id));
        }
        assert_eq!(store.list(&DocumentationFilter::default()).unwrap().len(), 20);
    }

    #[test]
    fn test_create_missing_fields_appends_nothing() {
        let store = DocumentationStore::in_memory();
        let err = store
            .create(fields(json!({"patient_id": "p-1", "session_title": ""})))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Validation failed: session_title, session_date, recording_method required"
        );
        assert!(store.list(&DocumentationFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_create_rejects_mismatched_content() {
        let store = DocumentationStore::in_memory();
        let mut payload = intake("p-1");
        payload.insert("content".into(), json!({"vsg_assessments": {}}));

        let err = store.create(payload).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: invalid documentation: content does not match"));
        assert_eq!(message.matches("Validation failed").count(), 1);
        assert!(store.list(&DocumentationFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_status_update_leaves_other_fields() {
        let store = DocumentationStore::in_memory();
        let doc = store.create(intake("p-1")).unwrap();

        store
            .update(&doc.documentation_id, fields(json!({"status": "completed"})))
            .unwrap();

        let all = store.list(&DocumentationFilter::default()).unwrap();
        assert_eq!(all.len(), 1);
        let updated = &all[0];
        assert_eq!(updated.documentation_id, doc.documentation_id);
        assert_eq!(updated.status, DocumentationStatus::Completed);
        assert_eq!(updated.content, doc.content);
        assert_eq!(updated.session_title, doc.session_title);
        assert_eq!(updated.created_at, doc.created_at);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn test_update_can_switch_type_with_content() {
        let store = DocumentationStore::in_memory();
        let doc = store.create(intake("p-1")).unwrap();

        let updated = store
            .update(
                &doc.documentation_id,
                fields(json!({"documentation_type": "parent_conversation", "content": {"anlass": "Rückfrage"}})),
            )
            .unwrap();
        assert!(matches!(updated.content, DocumentationContent::Parent(_)));

        // type change alone leaves intake-shaped content behind
        assert!(store
            .update(&doc.documentation_id, fields(json!({"documentation_type": "observation_checklist"})))
            .is_err());
    }

    #[test]
    fn test_list_filters() {
        let store = DocumentationStore::in_memory();
        let first = store.create(intake("p-1")).unwrap();
        store.create(intake("p-2")).unwrap();
        store.create(intake("p-1")).unwrap();

        assert_eq!(store.list(&DocumentationFilter::for_patient("p-1")).unwrap().len(), 2);

        let by_id = DocumentationFilter {
            patient_id: None,
            documentation_id: Some(first.documentation_id.clone()),
        };
        assert_eq!(store.list(&by_id).unwrap(), vec![first]);
        assert!(store.list(&DocumentationFilter::for_patient("p-9")).unwrap().is_empty());
    }

    #[test]
    fn test_delete_twice() {
        let store = DocumentationStore::in_memory();
        let doc = store.create(intake("p-1")).unwrap();

        store.delete(&doc.documentation_id).unwrap();
        assert!(matches!(store.delete(&doc.documentation_id), Err(Error::NotFound(_))));
        assert!(matches!(store.get(&doc.documentation_id), Err(Error::NotFound(_))));
    }
}
