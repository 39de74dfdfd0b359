//! Dry-run comparison of rendered content against the mirrored resource.
//!
//! Nothing is written: resolve, fetch, and diff title, body and the labels an
//! update would apply.

use std::collections::BTreeSet;

use serde::Serialize;
use similar::TextDiff;

use mirror_core::{CanonicalId, CanonicalRecord, ExternalId};

use crate::error::{SyncError, TrackerOp};
use crate::resolver::ResolveResult;
use crate::upsert::UpsertOrchestrator;

/// Difference between a record and its mirrored resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordDiff {
    /// No resource resolves for the canonical id; an upsert would create one.
    NotMirrored { canonical_id: CanonicalId },
    Mirrored {
        canonical_id: CanonicalId,
        external_id: ExternalId,
        /// `(remote, rendered)` when the titles differ.
        title_change: Option<(String, String)>,
        /// Unified diff of the body, `None` when identical.
        body_diff: Option<String>,
        labels_added: BTreeSet<String>,
        labels_removed: BTreeSet<String>,
    },
}

impl RecordDiff {
    /// `true` when an upsert would change nothing remotely.
    pub fn is_clean(&self) -> bool {
        match self {
            RecordDiff::NotMirrored { .. } => false,
            RecordDiff::Mirrored {
                title_change,
                body_diff,
                labels_added,
                labels_removed,
                ..
            } => {
                title_change.is_none()
                    && body_diff.is_none()
                    && labels_added.is_empty()
                    && labels_removed.is_empty()
            }
        }
    }
}

/// Render `record` and compare it with its mirrored resource.
pub async fn diff_record(
    orchestrator: &UpsertOrchestrator,
    record: &CanonicalRecord,
) -> Result<RecordDiff, SyncError> {
    let id = &record.canonical_id;
    let content = orchestrator.renderer().render(record)?;

    let external_id = match orchestrator.resolver().resolve(id).await? {
        ResolveResult::Found { external_id, .. } => external_id,
        ResolveResult::NotFound => {
            return Ok(RecordDiff::NotMirrored {
                canonical_id: id.clone(),
            })
        }
    };

    let remote = orchestrator
        .tracker()
        .get(external_id)
        .await
        .map_err(|e| SyncError::tracker(TrackerOp::Get, e))?;

    let title_change =
        (remote.title != content.title).then(|| (remote.title.clone(), content.title.clone()));

    let remote_body = normalize_line_endings(&remote.body);
    let body_diff = (remote_body != content.body).then(|| {
        TextDiff::from_lines(&remote_body, &content.body)
            .unified_diff()
            .header(&format!("a/{external_id}"), &format!("b/{id}"))
            .context_radius(3)
            .to_string()
    });

    let current: BTreeSet<String> = remote.labels.iter().cloned().collect();
    let applied = orchestrator
        .label_policy()
        .merge(&remote.labels, &content.labels);

    Ok(RecordDiff::Mirrored {
        canonical_id: id.clone(),
        external_id,
        title_change,
        body_diff,
        labels_added: applied.difference(&current).cloned().collect(),
        labels_removed: current.difference(&applied).cloned().collect(),
    })
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
