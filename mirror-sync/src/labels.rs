//! Managed-label policy.
//!
//! A label is *managed* when the engine may add or replace it: the system
//! marker, anything matching the schema-version pattern, and any explicitly
//! registered key. Everything else on a resource (state markers,
//! operator-added labels) is preserved verbatim on update.

use std::collections::BTreeSet;

use regex::Regex;

use mirror_core::LabelConfig;

use crate::error::SyncError;

#[derive(Debug, Clone)]
pub struct ManagedLabelPolicy {
    system_label: String,
    schema_pattern: Regex,
    extra: BTreeSet<String>,
}

impl ManagedLabelPolicy {
    pub fn new(system_label: impl Into<String>, schema_label_pattern: &str) -> Result<Self, SyncError> {
        Ok(Self {
            system_label: system_label.into(),
            schema_pattern: Regex::new(schema_label_pattern)?,
            extra: BTreeSet::new(),
        })
    }

    pub fn from_config(config: &LabelConfig) -> Result<Self, SyncError> {
        Self::new(config.system_label.clone(), &config.schema_label_pattern)
    }

    /// Register an additional managed label key.
    pub fn with_managed(mut self, label: impl Into<String>) -> Self {
        self.extra.insert(label.into());
        self
    }

    pub fn is_managed(&self, label: &str) -> bool {
        label == self.system_label || self.extra.contains(label) || self.schema_pattern.is_match(label)
    }

    /// `(existing \ managed) ∪ rendered`.
    pub fn merge<'a, I>(&self, existing: I, rendered: &BTreeSet<String>) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        existing
            .into_iter()
            .filter(|label| !self.is_managed(label))
            .cloned()
            .chain(rendered.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ManagedLabelPolicy {
        ManagedLabelPolicy::new("afu9", r"^v\d+(\.\d+)*$").unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn schema_versions_and_system_label_are_managed() {
        let p = policy();
        assert!(p.is_managed("afu9"));
        assert!(p.is_managed("v0.7"));
        assert!(p.is_managed("v12"));
        assert!(!p.is_managed("state:IN_PROGRESS"));
        assert!(!p.is_managed("custom-label"));
        assert!(!p.is_managed("v0.7-beta"));
    }

    #[test]
    fn merge_replaces_schema_label_and_preserves_the_rest() {
        let existing: Vec<String> = ["afu9", "v0.7", "state:IN_PROGRESS", "custom-label"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let merged = policy().merge(&existing, &set(&["afu9", "v0.8"]));
        assert_eq!(merged, set(&["afu9", "custom-label", "state:IN_PROGRESS", "v0.8"]));
    }

    #[test]
    fn explicitly_registered_key_is_managed() {
        let p = policy().with_managed("mirror:stale");
        let merged = p.merge(&vec!["mirror:stale".to_string()], &set(&["afu9"]));
        assert_eq!(merged, set(&["afu9"]));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        assert!(matches!(
            ManagedLabelPolicy::new("afu9", "(unclosed"),
            Err(SyncError::LabelPattern(_))
        ));
    }
}
