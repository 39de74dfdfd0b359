//! Locates the external resource that is canonical for a canonical id.
//!
//! Stage order (each tried only when the previous found nothing):
//! 1. `Body`: body contains the exact canonical marker
//! 2. `Label`: resource carries `<canonical_label_prefix><id>`
//! 3. `Search`: keyword hit whose title or body mentions the id as a token
//!
//! Search hits are re-verified locally; tracker search is fuzzy. Within the
//! first stage that yields candidates the lowest external id wins, so
//! repeated or concurrent resolutions converge on the same resource.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use mirror_core::{CanonicalId, ExternalId};
use mirror_renderer::{canonical_marker, extract_canonical_id};

use crate::error::{SyncError, TrackerOp};
use crate::tracker::{Candidate, SearchQuery, TrackerClient};

/// Which resolution stage produced the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedBy {
    Body,
    Label,
    Search,
}

impl fmt::Display for MatchedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchedBy::Body => f.write_str("body"),
            MatchedBy::Label => f.write_str("label"),
            MatchedBy::Search => f.write_str("search"),
        }
    }
}

/// Outcome of [`CanonicalResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolveResult {
    Found {
        external_id: ExternalId,
        external_url: String,
        matched_by: MatchedBy,
    },
    NotFound,
}

impl ResolveResult {
    pub fn is_found(&self) -> bool {
        matches!(self, ResolveResult::Found { .. })
    }

    pub fn external_id(&self) -> Option<ExternalId> {
        match self {
            ResolveResult::Found { external_id, .. } => Some(*external_id),
            ResolveResult::NotFound => None,
        }
    }
}

/// Read-only resolver over a [`TrackerClient`].
pub struct CanonicalResolver {
    tracker: Arc<dyn TrackerClient>,
    canonical_label_prefix: String,
}

impl CanonicalResolver {
    pub fn new(tracker: Arc<dyn TrackerClient>, canonical_label_prefix: impl Into<String>) -> Self {
        Self {
            tracker,
            canonical_label_prefix: canonical_label_prefix.into(),
        }
    }

    /// Resolve `id` to its canonical external resource.
    ///
    /// Tracker failures are classified and propagated, never swallowed.
    pub async fn resolve(&self, id: &CanonicalId) -> Result<ResolveResult, SyncError> {
        let marker = canonical_marker(id);
        let stages = [
            (MatchedBy::Body, SearchQuery::BodyMarker(marker.clone())),
            (
                MatchedBy::Label,
                SearchQuery::Label(format!("{}{}", self.canonical_label_prefix, id)),
            ),
            (MatchedBy::Search, SearchQuery::Keyword(id.0.clone())),
        ];

        for (matched_by, query) in stages {
            let candidates = self
                .tracker
                .search(&query)
                .await
                .map_err(|e| SyncError::tracker(TrackerOp::Search, e))?;
            let winner = candidates
                .into_iter()
                .filter(|c| self.verifies(c, matched_by, id, &marker))
                .min_by_key(|c| c.id);
            if let Some(hit) = winner {
                tracing::debug!(
                    tracker = self.tracker.name(),
                    canonical_id = %id,
                    external_id = %hit.id,
                    %matched_by,
                    "resolved canonical record"
                );
                return Ok(ResolveResult::Found {
                    external_id: hit.id,
                    external_url: hit.url,
                    matched_by,
                });
            }
        }

        tracing::debug!(
            tracker = self.tracker.name(),
            canonical_id = %id,
            "no external resource found"
        );
        Ok(ResolveResult::NotFound)
    }

    fn verifies(&self, c: &Candidate, stage: MatchedBy, id: &CanonicalId, marker: &str) -> bool {
        if stage != MatchedBy::Body && marked_for_other(c, id) {
            return false;
        }
        match stage {
            MatchedBy::Body => c.body.as_deref().is_some_and(|b| b.contains(marker)),
            MatchedBy::Label => {
                let wanted = format!("{}{}", self.canonical_label_prefix, id);
                c.labels.iter().any(|l| *l == wanted)
            }
            MatchedBy::Search => {
                mentions_token(&c.title, id.as_str())
                    || c.body.as_deref().is_some_and(|b| mentions_token(b, id.as_str()))
            }
        }
    }
}

/// `true` when the candidate body carries the marker of a different record.
fn marked_for_other(c: &Candidate, id: &CanonicalId) -> bool {
    c.body
        .as_deref()
        .and_then(extract_canonical_id)
        .is_some_and(|other| &other != id)
}

/// `true` when `needle` occurs in `haystack` not glued to another id
/// character, so `I-81` does not match inside `I-811`.
pub(crate) fn mentions_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let is_id_char = |c: char| c.is_alphanumeric() || c == '-' || c == '_';
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(is_id_char) && !after.is_some_and(is_id_char)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_match_respects_boundaries() {
        assert!(mentions_token("[I-81] Fix", "I-81"));
        assert!(mentions_token("depends on I-81.", "I-81"));
        assert!(!mentions_token("[I-811] Fix", "I-81"));
        assert!(!mentions_token("XI-81", "I-81"));
        assert!(!mentions_token("anything", ""));
    }

    #[test]
    fn candidate_marked_for_another_record_is_rejected() {
        let candidate = |body: &str| Candidate {
            id: ExternalId(1),
            url: "u".into(),
            title: "[I-2] Second".into(),
            body: Some(body.into()),
            labels: vec![],
        };
        let id = CanonicalId::from("I-1");
        assert!(marked_for_other(
            &candidate("- I-1\n<!-- mirror:canonical-id=I-2 -->"),
            &id
        ));
        assert!(!marked_for_other(&candidate("mentions I-1, no marker"), &id));
        assert!(!marked_for_other(
            &candidate("<!-- mirror:canonical-id=I-1 -->"),
            &id
        ));
    }

    #[test]
    fn resolve_result_serializes_with_mode_tag() {
        let found = ResolveResult::Found {
            external_id: ExternalId(7),
            external_url: "u".into(),
            matched_by: MatchedBy::Label,
        };
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["mode"], "found");
        assert_eq!(json["matched_by"], "label");
        assert_eq!(
            serde_json::to_value(ResolveResult::NotFound).unwrap()["mode"],
            "not_found"
        );
    }
}
