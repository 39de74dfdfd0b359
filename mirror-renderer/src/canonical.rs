//! Canonical JSON form and content hash of a record.
//!
//! 1. Trim text fields, drop blank list entries, serialize to a JSON value.
//! 2. Drop volatile keys (timestamps) at every depth.
//! 3. Sort object keys recursively.
//! 4. Sort and dedup arrays held under unordered-set keys.
//! 5. SHA-256 the compact serialization, hex encode.
//!
//! Arrays under any other key keep their order: acceptance criteria are a
//! checklist and reordering them is a semantic change.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use mirror_core::CanonicalRecord;

use crate::error::RenderError;

/// Keys that never take part in the hash.
pub const VOLATILE_KEYS: &[&str] = &[
    "created_at",
    "createdAt",
    "updated_at",
    "updatedAt",
    "last_synced_at",
    "lastSyncedAt",
    "synced_at",
    "syncedAt",
];

/// Keys whose array values are unordered sets.
pub const SET_KEYS: &[&str] = &["labels", "dependencies", "depends_on", "dependsOn", "tags"];

/// Copy of `record` with text fields trimmed and blank list entries dropped,
/// i.e. the values the rendered content is built from.
pub fn normalized(record: &CanonicalRecord) -> CanonicalRecord {
    fn trimmed(items: &[String]) -> Vec<String> {
        items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    CanonicalRecord {
        title: record.title.trim().to_string(),
        description: record.description.trim().to_string(),
        acceptance_criteria: trimmed(&record.acceptance_criteria),
        dependencies: trimmed(&record.dependencies),
        labels: trimmed(&record.labels),
        priority: record
            .priority
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        ..record.clone()
    }
}

/// Semantic JSON value of `record` in canonical form.
pub fn semantic_value(record: &CanonicalRecord) -> Result<Value, RenderError> {
    let raw = serde_json::to_value(normalized(record))?;
    Ok(canonicalize(&raw))
}

/// Canonicalize an arbitrary JSON value.
pub fn canonicalize(value: &Value) -> Value {
    canonicalize_inner(value, false)
}

fn canonicalize_inner(value: &Value, is_set: bool) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map
                .keys()
                .filter(|k| !VOLATILE_KEYS.contains(&k.as_str()))
                .collect();
            keys.sort();
            // Insert in sorted order so the result is canonical even when
            // serde_json is built with `preserve_order`.
            let mut out = Map::new();
            for key in keys {
                let child_is_set = SET_KEYS.contains(&key.as_str());
                out.insert(key.clone(), canonicalize_inner(&map[key], child_is_set));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            let mut out: Vec<Value> = items.iter().map(|v| canonicalize_inner(v, false)).collect();
            if is_set {
                out.sort_by_cached_key(|v| v.to_string());
                out.dedup();
            }
            Value::Array(out)
        }
        other => other.clone(),
    }
}

/// Lowercase hex SHA-256 of the record's canonical form.
pub fn content_hash(record: &CanonicalRecord) -> Result<String, RenderError> {
    let canonical = semantic_value(record)?;
    let bytes = serde_json::to_vec(&canonical)?;
    Ok(sha256_hex(&bytes))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_are_sorted_recursively() {
        let v = json!({"b": 1, "a": {"z": true, "y": false}});
        assert_eq!(canonicalize(&v).to_string(), r#"{"a":{"y":false,"z":true},"b":1}"#);
    }

    #[test]
    fn set_arrays_are_sorted_and_deduped() {
        let v = json!({"labels": ["b", "a", "b"], "steps": ["b", "a"]});
        let c = canonicalize(&v);
        assert_eq!(c["labels"], json!(["a", "b"]));
        assert_eq!(c["steps"], json!(["b", "a"]), "ordered arrays keep their order");
    }

    #[test]
    fn volatile_keys_are_dropped_at_any_depth() {
        let v = json!({"updatedAt": "x", "nested": {"created_at": "y", "keep": 1}});
        let c = canonicalize(&v);
        assert!(c.get("updatedAt").is_none());
        assert_eq!(c["nested"], json!({"keep": 1}));
    }

    #[test]
    fn sha256_hex_is_lowercase_64_chars() {
        let digest = sha256_hex(b"hello");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
