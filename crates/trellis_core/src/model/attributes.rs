//! Node attribute maps and precedence merging.
//!
//! # Invariants
//! - Merge result key set is the union of all input key sets.
//! - Precedence is submitted > existing > default, decided per key.

use serde_json::Value;
use std::collections::BTreeMap;

/// Free-form attribute mapping carried by every node.
pub type Attributes = BTreeMap<String, Value>;

/// Merges three attribute tiers into one map.
///
/// A key present in `submitted` always wins; otherwise the `existing` value is
/// kept; otherwise the `defaults` value fills the gap.
pub fn merge_attributes(
    submitted: &Attributes,
    existing: &Attributes,
    defaults: &Attributes,
) -> Attributes {
    let mut merged = defaults.clone();
    for (key, value) in existing {
        merged.insert(key.clone(), value.clone());
    }
    for (key, value) in submitted {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Overlays `patch` onto `target`, touching only the keys present in `patch`.
pub fn overlay_attributes(target: &mut Attributes, patch: &Attributes) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}

/// Converts a JSON object into attributes; other JSON values yield `None`.
pub fn attributes_from_value(value: Value) -> Option<Attributes> {
    match value {
        Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}
