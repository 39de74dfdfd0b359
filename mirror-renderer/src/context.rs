//! Template context: serializable rendering payload built from a
//! [`CanonicalRecord`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mirror_core::CanonicalRecord;

use crate::canonical::{canonicalize, VOLATILE_KEYS};
use crate::engine::canonical_marker;
use crate::error::RenderError;

/// Payload for the issue body template.
///
/// Unordered sets (dependencies) are sorted here so the body is stable under
/// input reordering, matching the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyContext {
    pub canonical_id: String,
    pub title: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
    pub dependencies: Vec<String>,
    pub priority: Option<String>,
    /// Extra structured fields, sorted by key, values as compact canonical JSON.
    pub details: Vec<DetailCtx>,
    pub marker: String,
}

/// One extra record field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailCtx {
    pub key: String,
    pub value: String,
}

impl BodyContext {
    /// Build a [`BodyContext`] from a record.
    pub fn from_record(record: &CanonicalRecord) -> Self {
        let mut dependencies: Vec<String> = record
            .dependencies
            .iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        dependencies.sort();
        dependencies.dedup();

        let details = record
            .extra
            .iter()
            .filter(|(key, _)| !VOLATILE_KEYS.contains(&key.as_str()))
            .map(|(key, value)| DetailCtx {
                key: key.clone(),
                value: detail_value(value),
            })
            .collect();

        BodyContext {
            canonical_id: record.canonical_id.0.clone(),
            title: record.title.trim().to_string(),
            description: record.description.trim().to_string(),
            acceptance_criteria: record
                .acceptance_criteria
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            dependencies,
            priority: record.priority.clone(),
            details,
            marker: canonical_marker(&record.canonical_id),
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

fn detail_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => canonicalize(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dependencies_sorted_and_trimmed() {
        let mut record = CanonicalRecord::new("I-7", "  Ship it ");
        record.dependencies = vec!["I-9".into(), " I-2".into(), "".into(), "I-9".into()];
        let ctx = BodyContext::from_record(&record);
        assert_eq!(ctx.dependencies, vec!["I-2", "I-9"]);
        assert_eq!(ctx.title, "Ship it");
    }

    #[test]
    fn details_skip_volatile_keys() {
        let mut record = CanonicalRecord::new("I-7", "t");
        record.extra.insert("lastSyncedAt".into(), json!("2026-01-01T00:00:00Z"));
        record.extra.insert("owner".into(), json!({"team": "core", "a": 1}));
        let ctx = BodyContext::from_record(&record);
        assert_eq!(ctx.details.len(), 1);
        assert_eq!(ctx.details[0].key, "owner");
        assert_eq!(ctx.details[0].value, r#"{"a":1,"team":"core"}"#);
    }

    #[test]
    fn to_tera_context_succeeds() {
        let ctx = BodyContext::from_record(&CanonicalRecord::new("I-1", "t"));
        ctx.to_tera_context().expect("context conversion");
    }
}
