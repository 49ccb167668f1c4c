//! Group store
//!
//! Patients reference groups by `group_id` without integrity checks:
//! deleting a group leaves its patients pointing at a missing ID.

use std::sync::Arc;

use tracing::info;

use super::collection::decode_record;
use super::{normalise_keys, Collection, Fields, MemoryPersistence, Persistence, Record};
use crate::models::{is_blank, Group};
use crate::{ids, Error, Result};

impl Record for Group {
    const KIND: &'static str = "group";
    const ID_PREFIX: &'static str = ids::GROUP_PREFIX;
    const KEY_ALIASES: &'static [(&'static str, &'static str)] = Group::LEGACY_KEYS;

    fn id(&self) -> &str {
        &self.group_id
    }

    fn set_id(&mut self, id: String) {
        self.group_id = id;
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::missing_fields(&["name"]));
        }
        Ok(())
    }
}

pub struct GroupStore {
    groups: Collection<Group>,
}

impl GroupStore {
    pub fn new(persistence: Arc<dyn Persistence<Group>>) -> Self {
        Self {
            groups: Collection::new(persistence),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPersistence::<Group>::new()))
    }

    pub fn describe(&self) -> String {
        self.groups.describe()
    }

    pub fn list(&self) -> Result<Vec<Group>> {
        self.groups.all()
    }

    pub fn get(&self, id: &str) -> Result<Group> {
        self.groups.find(id)
    }

    /// Create a group; `name` is required, the ID is always generated
    pub fn create(&self, fields: Fields) -> Result<Group> {
        let mut fields = normalise_keys(fields, Group::LEGACY_KEYS);
        if is_blank(fields.get("name")) {
            return Err(Error::missing_fields(&["name"]));
        }
        fields.remove("group_id");
        if fields.get("description").is_some_and(|v| v.is_null()) {
            fields.remove("description");
        }

        let group = self.groups.insert(decode_record(fields.into())?)?;
        info!(group_id = %group.group_id, name = %group.name, "Group created");
        Ok(group)
    }

    pub fn update(&self, id: &str, patch: Fields) -> Result<Group> {
        let group = self.groups.merge(id, patch)?;
        info!(group_id = %id, "Group updated");
        Ok(group)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.groups.remove(id)?;
        info!(group_id = %id, "Group deleted");
        Ok(())
    }

    /// Insert [`Group::defaults`] if the collection is empty
    ///
    /// Returns the number of groups created.
    pub fn seed_defaults(&self) -> Result<usize> {
        if !self.groups.is_empty()? {
            return Ok(0);
        }
        let defaults = Group::defaults();
        let count = defaults.len();
        for group in defaults {
            self.groups.insert(group)?;
        }
        info!(count, "Seeded default groups");
        Ok(count)
    }
}
