//! Timestamp-based record identifiers
//!
//! Identifiers have the form `<prefix>-<millis>`, e.g. `d-1714555800123`.
//! Two calls within the same millisecond never yield the same token: the
//! numeric part is the larger of the wall clock and the last issued value + 1.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::time;

/// Prefix for patient identifiers
pub const PATIENT_PREFIX: &str = "p";
/// Prefix for group identifiers
pub const GROUP_PREFIX: &str = "g";
/// Prefix for documentation identifiers
pub const DOCUMENTATION_PREFIX: &str = "d";

static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

/// Next strictly increasing millisecond token for this process
fn next_tick() -> u64 {
    let now = time::now_millis();
    let mut last = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ISSUED.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Generate a new identifier with the given prefix
pub fn generate(prefix: &str) -> String {
    format!("{}-{}", prefix, next_tick())
}

/// Generate an identifier not contained in `taken`
///
/// Guards against collisions with records loaded from disk that were
/// created with a clock ahead of ours.
pub fn generate_unique<'a, I>(prefix: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    loop {
        let id = generate(prefix);
        if !taken.clone().into_iter().any(|existing| existing == id) {
            return id;
        }
    }
}
