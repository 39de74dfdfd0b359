//! Idempotent create-or-update of a canonical record.
//!
//! ## `upsert`: protocol
//!
//! 1. Render the record (content + hash).
//! 2. Resolve the canonical id.
//! 3. Not found → create. A `DUPLICATE` rejection means another caller won
//!    the race: re-resolve exactly once and fall through to step 4. If the
//!    re-resolve still finds nothing, the original error is returned.
//! 4. Found → read current labels, merge with the managed-label policy,
//!    update title, body and labels.
//!
//! No locks are held and nothing is retried beyond the single re-resolve.
//! Convergence under concurrent callers relies on the tracker rejecting a
//! second create for the same canonical marker.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mirror_core::{CanonicalId, CanonicalRecord, ExternalId, LabelConfig, MirrorLink};
use mirror_renderer::{ContentRenderer, RenderedContent};

use crate::classify::ErrorCode;
use crate::error::{SyncError, TrackerOp};
use crate::labels::ManagedLabelPolicy;
use crate::resolver::{CanonicalResolver, ResolveResult};
use crate::tracker::{IssueUpdate, NewIssue, TrackerClient};

/// Whether the upsert created a new resource or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertMode {
    Created,
    Updated,
}

impl fmt::Display for UpsertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertMode::Created => f.write_str("created"),
            UpsertMode::Updated => f.write_str("updated"),
        }
    }
}

/// Outcome of a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertResult {
    pub mode: UpsertMode,
    pub external_id: ExternalId,
    pub external_url: String,
    pub rendered_hash: String,
    pub labels_applied: BTreeSet<String>,
}

impl UpsertResult {
    /// Mirror-facing link fields to persist for the record.
    pub fn to_link(&self, synced_at: DateTime<Utc>) -> MirrorLink {
        MirrorLink {
            external_id: self.external_id,
            external_url: self.external_url.clone(),
            rendered_hash: self.rendered_hash.clone(),
            last_synced_at: synced_at,
        }
    }
}

/// Create-or-update engine over a [`TrackerClient`].
pub struct UpsertOrchestrator {
    tracker: Arc<dyn TrackerClient>,
    renderer: ContentRenderer,
    resolver: CanonicalResolver,
    labels: ManagedLabelPolicy,
}

impl UpsertOrchestrator {
    pub fn new(
        tracker: Arc<dyn TrackerClient>,
        renderer: ContentRenderer,
        resolver: CanonicalResolver,
        labels: ManagedLabelPolicy,
    ) -> Self {
        Self {
            tracker,
            renderer,
            resolver,
            labels,
        }
    }

    /// Build renderer, resolver and label policy from one label config.
    pub fn from_config(tracker: Arc<dyn TrackerClient>, config: &LabelConfig) -> Result<Self, SyncError> {
        let renderer = ContentRenderer::new(config)?;
        let resolver = CanonicalResolver::new(tracker.clone(), config.canonical_label_prefix.clone());
        let labels = ManagedLabelPolicy::from_config(config)?;
        Ok(Self::new(tracker, renderer, resolver, labels))
    }

    pub fn renderer(&self) -> &ContentRenderer {
        &self.renderer
    }

    pub fn resolver(&self) -> &CanonicalResolver {
        &self.resolver
    }

    pub fn tracker(&self) -> &Arc<dyn TrackerClient> {
        &self.tracker
    }

    pub fn label_policy(&self) -> &ManagedLabelPolicy {
        &self.labels
    }

    /// Render `record` and publish it.
    pub async fn upsert(&self, record: &CanonicalRecord) -> Result<UpsertResult, SyncError> {
        let content = self.renderer.render(record)?;
        self.upsert_rendered(&record.canonical_id, &content).await
    }

    /// Publish already-rendered content for `id`.
    pub async fn upsert_rendered(
        &self,
        id: &CanonicalId,
        content: &RenderedContent,
    ) -> Result<UpsertResult, SyncError> {
        let (external_id, external_url) = match self.resolver.resolve(id).await? {
            ResolveResult::Found {
                external_id,
                external_url,
                matched_by,
            } => {
                tracing::debug!(canonical_id = %id, %external_id, %matched_by, "resource already mirrored");
                (external_id, external_url)
            }
            ResolveResult::NotFound => match self.create(id, content).await {
                Ok(created) => return Ok(created),
                Err(err) => self.recover_duplicate(id, err).await?,
            },
        };
        self.update(external_id, &external_url, content).await
    }

    async fn create(&self, id: &CanonicalId, content: &RenderedContent) -> Result<UpsertResult, SyncError> {
        let issue = NewIssue {
            title: content.title.clone(),
            body: content.body.clone(),
            labels: content.labels.iter().cloned().collect(),
        };
        let created = self
            .tracker
            .create(&issue)
            .await
            .map_err(|e| SyncError::tracker(TrackerOp::Create, e))?;
        tracing::info!(
            tracker = self.tracker.name(),
            canonical_id = %id,
            external_id = %created.id,
            "created external resource"
        );
        Ok(UpsertResult {
            mode: UpsertMode::Created,
            external_id: created.id,
            external_url: created.url,
            rendered_hash: content.hash.clone(),
            labels_applied: content.labels.clone(),
        })
    }

    /// Bounded race recovery: one re-resolve after a `DUPLICATE` create.
    ///
    /// Returns the resource the winning caller created, or `err` unchanged
    /// when it is not a duplicate or the re-resolve still finds nothing.
    async fn recover_duplicate(
        &self,
        id: &CanonicalId,
        err: SyncError,
    ) -> Result<(ExternalId, String), SyncError> {
        let is_duplicate = err
            .classification()
            .is_some_and(|c| c.code == ErrorCode::Duplicate);
        if !is_duplicate {
            return Err(err);
        }

        tracing::warn!(
            tracker = self.tracker.name(),
            canonical_id = %id,
            "create lost a race, re-resolving once"
        );
        match self.resolver.resolve(id).await? {
            ResolveResult::Found {
                external_id,
                external_url,
                ..
            } => Ok((external_id, external_url)),
            ResolveResult::NotFound => {
                tracing::warn!(canonical_id = %id, "duplicate reported but nothing resolvable");
                Err(err)
            }
        }
    }

    async fn update(
        &self,
        external_id: ExternalId,
        known_url: &str,
        content: &RenderedContent,
    ) -> Result<UpsertResult, SyncError> {
        let current = self
            .tracker
            .get(external_id)
            .await
            .map_err(|e| SyncError::tracker(TrackerOp::Get, e))?;
        let labels_applied = self.labels.merge(&current.labels, &content.labels);

        let update = IssueUpdate {
            title: Some(content.title.clone()),
            body: Some(content.body.clone()),
            labels: Some(labels_applied.iter().cloned().collect()),
        };
        let updated = self
            .tracker
            .update(external_id, &update)
            .await
            .map_err(|e| SyncError::tracker(TrackerOp::Update, e))?;

        let external_url = if updated.url.is_empty() {
            known_url.to_string()
        } else {
            updated.url
        };
        tracing::info!(tracker = self.tracker.name(), %external_id, "updated external resource");
        Ok(UpsertResult {
            mode: UpsertMode::Updated,
            external_id: updated.id,
            external_url,
            rendered_hash: content.hash.clone(),
            labels_applied,
        })
    }
}
