//! Hash-gated sync pipeline shared by the CLI.
//!
//! Per record:
//! 1. Render (content + hash).
//! 2. Compare with the hash stored in the link → skip if identical.
//! 3. Dry run → report what would be published, touch nothing.
//! 4. Upsert, then refresh the link.
//!
//! The skip only looks at the content hash. A schema-version bump leaves
//! hashes unchanged, so relabeling needs `force`.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use mirror_core::{CanonicalId, CanonicalRecord, ExternalId, Repository};

use crate::error::SyncError;
use crate::link_store::{self, LinkStore};
use crate::upsert::{UpsertMode, UpsertOrchestrator};

/// Knobs for a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Render and compare only; no tracker writes, no store writes.
    pub dry_run: bool,
    /// Upsert even when the stored hash matches.
    pub force: bool,
}

/// Outcome for a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Created {
        canonical_id: CanonicalId,
        external_id: ExternalId,
        external_url: String,
    },
    Updated {
        canonical_id: CanonicalId,
        external_id: ExternalId,
        external_url: String,
    },
    /// Stored hash matches the rendered content.
    Unchanged {
        canonical_id: CanonicalId,
        external_id: ExternalId,
    },
    /// Dry run: the record would have been published.
    WouldUpsert {
        canonical_id: CanonicalId,
        rendered_hash: String,
    },
}

impl SyncOutcome {
    pub fn canonical_id(&self) -> &CanonicalId {
        match self {
            SyncOutcome::Created { canonical_id, .. }
            | SyncOutcome::Updated { canonical_id, .. }
            | SyncOutcome::Unchanged { canonical_id, .. }
            | SyncOutcome::WouldUpsert { canonical_id, .. } => canonical_id,
        }
    }
}

/// Sync `records` against an in-memory link store.
///
/// Stops at the first failing record; links for records processed before it
/// are already updated in `links`.
pub async fn sync_records(
    orchestrator: &UpsertOrchestrator,
    records: &[CanonicalRecord],
    links: &mut LinkStore,
    options: SyncOptions,
) -> Result<Vec<SyncOutcome>, SyncError> {
    let mut outcomes = Vec::with_capacity(records.len());
    for record in records {
        let id = &record.canonical_id;
        let content = orchestrator.renderer().render(record)?;

        if !options.force {
            if let Some(link) = links.get(id) {
                if link.rendered_hash == content.hash {
                    tracing::debug!(canonical_id = %id, "unchanged");
                    outcomes.push(SyncOutcome::Unchanged {
                        canonical_id: id.clone(),
                        external_id: link.external_id,
                    });
                    continue;
                }
            }
        }

        if options.dry_run {
            tracing::info!(canonical_id = %id, "[dry-run] would upsert");
            outcomes.push(SyncOutcome::WouldUpsert {
                canonical_id: id.clone(),
                rendered_hash: content.hash,
            });
            continue;
        }

        let result = orchestrator.upsert_rendered(id, &content).await?;
        links.insert(id.clone(), result.to_link(Utc::now()));
        outcomes.push(match result.mode {
            UpsertMode::Created => SyncOutcome::Created {
                canonical_id: id.clone(),
                external_id: result.external_id,
                external_url: result.external_url,
            },
            UpsertMode::Updated => SyncOutcome::Updated {
                canonical_id: id.clone(),
                external_id: result.external_id,
                external_url: result.external_url,
            },
        });
    }
    Ok(outcomes)
}

/// Load the link store for `repo`, sync `records`, save the store.
///
/// On failure the links gathered so far are still saved, then the error is
/// returned. Dry runs never write the store.
pub async fn run(
    home: &Path,
    repo: &Repository,
    orchestrator: &UpsertOrchestrator,
    records: &[CanonicalRecord],
    options: SyncOptions,
) -> Result<Vec<SyncOutcome>, SyncError> {
    let started_at = Utc::now();
    let mut store = link_store::load_at(home, repo)?;
    let result = sync_records(orchestrator, records, &mut store.links, options).await;

    if !options.dry_run {
        store.synced_at = started_at;
        link_store::save_at(home, repo, &store)?;
    }
    result
}
