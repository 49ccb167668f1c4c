//! Generic CRUD over a persisted list of records

use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{normalise_keys, Fields, Persistence};
use crate::{ids, Error, Result};

/// A record kind stored in a [`Collection`]
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Singular name used in messages ("patient")
    const KIND: &'static str;
    /// Prefix of generated identifiers
    const ID_PREFIX: &'static str;
    /// Legacy key → canonical key, applied to incoming fields
    const KEY_ALIASES: &'static [(&'static str, &'static str)] = &[];

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    /// Record-level rules checked after create and after every merge
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Hook run on the merged record before it is stored
    fn touch(&mut self) {}
}

/// Insertion-ordered records over a [`Persistence`] backend
///
/// Every operation loads the whole collection and every mutation saves it
/// back in full.
pub struct Collection<T> {
    persistence: Arc<dyn Persistence<T>>,
    guard: Mutex<()>,
}

impl<T: Record> Collection<T> {
    pub fn new(persistence: Arc<dyn Persistence<T>>) -> Self {
        Self {
            persistence,
            guard: Mutex::new(()),
        }
    }

    pub fn describe(&self) -> String {
        self.persistence.describe()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| Error::Internal(format!("{} collection lock poisoned", T::KIND)))
    }

    fn not_found(id: &str) -> Error {
        Error::NotFound(format!("{} {}", T::KIND, id))
    }

    /// All records in insertion order
    pub fn all(&self) -> Result<Vec<T>> {
        let _guard = self.lock()?;
        self.persistence.load()
    }

    pub fn find(&self, id: &str) -> Result<T> {
        let _guard = self.lock()?;
        self.persistence
            .load()?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))
    }

    /// Append a record; a blank ID is replaced by a generated one
    ///
    /// Returns [`Error::Conflict`] if the record brings an ID already in use.
    pub fn insert(&self, mut record: T) -> Result<T> {
        record.validate()?;

        let _guard = self.lock()?;
        let mut records = self.persistence.load()?;

        if record.id().trim().is_empty() {
            let id = ids::generate_unique(T::ID_PREFIX, records.iter().map(|r| r.id()));
            record.set_id(id);
        } else if records.iter().any(|r| r.id() == record.id()) {
            return Err(Error::Conflict(format!(
                "{} {} already exists",
                T::KIND,
                record.id()
            )));
        }

        records.push(record.clone());
        self.persistence.save(&records)?;
        debug!(kind = T::KIND, id = %record.id(), total = records.len(), "Record inserted");
        Ok(record)
    }

    /// Shallow-merge `patch` into the record with `id`
    ///
    /// Any key may be overwritten except the identifier itself. The merged
    /// record must still deserialize and pass [`Record::validate`].
    pub fn merge(&self, id: &str, patch: Fields) -> Result<T> {
        let patch = normalise_keys(patch, T::KEY_ALIASES);

        let _guard = self.lock()?;
        let mut records = self.persistence.load()?;
        let slot = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;

        let mut merged = merge_fields(slot, patch)?;
        merged.set_id(id.to_string());
        merged.touch();
        merged.validate()?;

        *slot = merged.clone();
        self.persistence.save(&records)?;
        debug!(kind = T::KIND, id = %id, "Record updated");
        Ok(merged)
    }

    /// Remove and return the record with `id`
    pub fn remove(&self, id: &str) -> Result<T> {
        let _guard = self.lock()?;
        let mut records = self.persistence.load()?;
        let index = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;

        let removed = records.remove(index);
        self.persistence.save(&records)?;
        debug!(kind = T::KIND, id = %id, total = records.len(), "Record removed");
        Ok(removed)
    }

    /// Number of records currently persisted
    pub fn len(&self) -> Result<usize> {
        self.all().map(|records| records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }
}

/// Overlay `patch` onto the JSON form of `record` and decode the result
pub(crate) fn merge_fields<T: Record>(record: &T, patch: Fields) -> Result<T> {
    let mut value = serde_json::to_value(record)?;
    let Value::Object(object) = &mut value else {
        return Err(Error::Internal(format!("{} does not encode as an object", T::KIND)));
    };
    object.extend(patch);
    decode_record(Value::Object(std::mem::take(object)))
}

/// Decode a record from client-supplied JSON, reporting shape errors as validation failures
pub(crate) fn decode_record<T: Record>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Validation(format!("invalid {}: {}", T::KIND, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPersistence;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(default)]
        id: String,
        text: String,
        #[serde(default)]
        pinned: bool,
    }

    impl Record for Note {
        const KIND: &'static str = "note";
        const ID_PREFIX: &'static str = "n";

        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }

        fn validate(&self) -> Result<()> {
            if self.text.is_empty() {
                return Err(Error::missing_fields(&["text"]));
            }
            Ok(())
        }
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
            pinned: false,
        }
    }

    fn collection() -> Collection<Note> {
        Collection::new(Arc::new(MemoryPersistence::<Note>::new()))
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_insert_generates_id_when_blank() {
        let notes = collection();
        let created = notes.insert(note("", "hallo")).unwrap();

        assert!(created.id.starts_with("n-"));
        assert_eq!(notes.find(&created.id).unwrap(), created);
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let notes = collection();
        notes.insert(note("n-1", "eins")).unwrap();

        let err = notes.insert(note("n-1", "zwei")).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(notes.len().unwrap(), 1);
    }

    #[test]
    fn test_insert_runs_validation() {
        let notes = collection();
        assert!(matches!(notes.insert(note("", "")), Err(Error::Validation(_))));
        assert!(notes.is_empty().unwrap());
    }

    #[test]
    fn test_merge_overwrites_fields_but_not_id() {
        let notes = collection();
        notes.insert(note("n-1", "eins")).unwrap();

        let merged = notes
            .merge("n-1", fields(json!({"pinned": true, "id": "n-999"})))
            .unwrap();

        assert_eq!(merged.id, "n-1");
        assert!(merged.pinned);
        assert_eq!(merged.text, "eins");
        assert!(notes.find("n-999").is_err());
    }

    #[test]
    fn test_merge_rejects_invalid_result() {
        let notes = collection();
        notes.insert(note("n-1", "eins")).unwrap();

        assert!(matches!(
            notes.merge("n-1", fields(json!({"text": ""}))),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            notes.merge("n-1", fields(json!({"pinned": "ja"}))),
            Err(Error::Validation(_))
        ));
        assert_eq!(notes.find("n-1").unwrap().text, "eins");
    }

    #[test]
    fn test_merge_missing_is_not_found() {
        let notes = collection();
        assert!(matches!(
            notes.merge("n-404", Fields::new()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_then_remove_again() {
        let notes = collection();
        notes.insert(note("n-1", "eins")).unwrap();
        notes.insert(note("n-2", "zwei")).unwrap();

        assert_eq!(notes.remove("n-1").unwrap().text, "eins");
        assert!(matches!(notes.remove("n-1"), Err(Error::NotFound(_))));
        assert_eq!(notes.all().unwrap(), vec![note("n-2", "zwei")]);
    }

    #[test]
    fn test_all_preserves_insertion_order() {
        let notes = collection();
        for (id, text) in [("n-3", "c"), ("n-1", "a"), ("n-2", "b")] {
            notes.insert(note(id, text)).unwrap();
        }
        let ids: Vec<String> = notes.all().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["n-3", "n-1", "n-2"]);
    }
}
