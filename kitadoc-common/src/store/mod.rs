//! Record stores
//!
//! Each store wraps a [`Collection`] over an injected [`Persistence`]
//! backend and adds the record-specific validation rules.
//!
//! Operations on one collection are serialised by a mutex inside this
//! process. There is no cross-request transaction: two PATCHes of the same
//! record are applied one after the other and the later one wins without
//! detecting the lost update.

mod collection;
mod documentation;
mod groups;
mod patients;
mod persistence;

pub use collection::{Collection, Record};
pub use documentation::{DocumentationFilter, DocumentationStore};
pub use groups::GroupStore;
pub use patients::PatientStore;
pub use persistence::{JsonFilePersistence, MemoryPersistence, Persistence};

use serde_json::{Map, Value};

/// JSON object body as received from a client
pub type Fields = Map<String, Value>;

/// Rename legacy keys to their canonical name
///
/// A canonical key present alongside its alias takes precedence.
pub(crate) fn normalise_keys(mut fields: Fields, aliases: &[(&str, &str)]) -> Fields {
    for (legacy, canonical) in aliases {
        if let Some(value) = fields.remove(*legacy) {
            fields.entry(canonical.to_string()).or_insert(value);
        }
    }
    fields
}
