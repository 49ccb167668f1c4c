//! Patient store

use std::sync::Arc;

use tracing::info;

use super::collection::decode_record;
use super::{normalise_keys, Collection, Fields, MemoryPersistence, Persistence, Record};
use crate::models::{is_blank, Patient};
use crate::{ids, Error, Result};

impl Record for Patient {
    const KIND: &'static str = "patient";
    const ID_PREFIX: &'static str = ids::PATIENT_PREFIX;
    const KEY_ALIASES: &'static [(&'static str, &'static str)] = Patient::LEGACY_KEYS;

    fn id(&self) -> &str {
        &self.patient_id
    }

    fn set_id(&mut self, id: String) {
        self.patient_id = id;
    }

    fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.first_name.trim().is_empty() {
            missing.push("first_name");
        }
        if self.last_name.trim().is_empty() {
            missing.push("last_name");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::missing_fields(&missing))
        }
    }
}

pub struct PatientStore {
    patients: Collection<Patient>,
}

impl PatientStore {
    pub fn new(persistence: Arc<dyn Persistence<Patient>>) -> Self {
        Self {
            patients: Collection::new(persistence),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPersistence::<Patient>::new()))
    }

    pub fn describe(&self) -> String {
        self.patients.describe()
    }

    pub fn list(&self) -> Result<Vec<Patient>> {
        self.patients.all()
    }

    pub fn get(&self, id: &str) -> Result<Patient> {
        self.patients.find(id)
    }

    /// Create a patient; `first_name` and `last_name` are required
    ///
    /// A missing or empty `patient_id` gets a generated `p-<millis>` token.
    pub fn create(&self, fields: Fields) -> Result<Patient> {
        let mut fields = normalise_keys(fields, Patient::LEGACY_KEYS);

        let missing: Vec<&str> = ["first_name", "last_name"]
            .into_iter()
            .filter(|key| is_blank(fields.get(*key)))
            .collect();
        if !missing.is_empty() {
            return Err(Error::missing_fields(&missing));
        }

        if is_blank(fields.get("patient_id")) {
            fields.remove("patient_id");
        }

        let patient = self.patients.insert(decode_record(fields.into())?)?;
        info!(patient_id = %patient.patient_id, "Patient created");
        Ok(patient)
    }

    pub fn update(&self, id: &str, patch: Fields) -> Result<Patient> {
        let patient = self.patients.merge(id, patch)?;
        info!(patient_id = %id, "Patient updated");
        Ok(patient)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.patients.remove(id)?;
        info!(patient_id = %id, "Patient deleted");
        Ok(())
    }
}
