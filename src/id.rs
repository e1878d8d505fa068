//! Storage id helpers

use uuid::Uuid;

/// Derive a storage id from a caller-supplied key.
///
/// Path separators are folded into underscores so ids stay flat: keys such
/// as `20240102/report.png` map one-to-one onto ids.
pub fn storage_id(key: &str) -> String {
    key.replace('/', "_")
}

/// Generate a fresh random id for anonymous content.
pub fn random_id() -> String {
    Uuid::new_v4().to_string()
}
