//! Domain types for the mirror engine.
//!
//! Canonical records are owned upstream and only read here. The status enums
//! use the SCREAMING_SNAKE_CASE wire names the workflow collaborators emit.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable business key of a canonical record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(pub String);

impl CanonicalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CanonicalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CanonicalId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a resource in the external tracker (issue number).
///
/// Ordering is numeric; the resolver relies on it for the lowest-id tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(pub u64);

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ExternalId {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

// ---------------------------------------------------------------------------
// Canonical record
// ---------------------------------------------------------------------------

/// A locally-owned unit of work that is mirrored into the tracker.
///
/// Accepts both snake_case and camelCase keys. Any field not modelled here is
/// kept in `extra` and takes part in the content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(alias = "canonicalId")]
    pub canonical_id: CanonicalId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Ordered checklist; order is significant.
    #[serde(default, alias = "acceptanceCriteria")]
    pub acceptance_criteria: Vec<String>,
    /// Unordered set of canonical ids this record depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Unordered set of record labels.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CanonicalRecord {
    /// Minimal record with only an id and a title.
    pub fn new(canonical_id: impl Into<CanonicalId>, title: impl Into<String>) -> Self {
        Self {
            canonical_id: canonical_id.into(),
            title: title.into(),
            description: String::new(),
            acceptance_criteria: Vec::new(),
            dependencies: Vec::new(),
            labels: Vec::new(),
            priority: None,
            created_at: None,
            updated_at: None,
            extra: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Local workflow status of a canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalStatus {
    #[default]
    Created,
    SpecReady,
    Implementing,
    Verified,
    MergeReady,
    Done,
    Hold,
    Killed,
}

impl LocalStatus {
    pub fn all() -> &'static [LocalStatus] {
        &[
            LocalStatus::Created,
            LocalStatus::SpecReady,
            LocalStatus::Implementing,
            LocalStatus::Verified,
            LocalStatus::MergeReady,
            LocalStatus::Done,
            LocalStatus::Hold,
            LocalStatus::Killed,
        ]
    }

    /// `DONE` and `KILLED` end the workflow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LocalStatus::Done | LocalStatus::Killed)
    }

    /// `CREATED` through `MERGE_READY`.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            LocalStatus::Created
                | LocalStatus::SpecReady
                | LocalStatus::Implementing
                | LocalStatus::Verified
                | LocalStatus::MergeReady
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocalStatus::Created => "CREATED",
            LocalStatus::SpecReady => "SPEC_READY",
            LocalStatus::Implementing => "IMPLEMENTING",
            LocalStatus::Verified => "VERIFIED",
            LocalStatus::MergeReady => "MERGE_READY",
            LocalStatus::Done => "DONE",
            LocalStatus::Hold => "HOLD",
            LocalStatus::Killed => "KILLED",
        }
    }
}

impl fmt::Display for LocalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        LocalStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("unknown local status '{s}'"))
    }
}

/// The tracker's status as interpreted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GithubMirrorStatus {
    Todo,
    InProgress,
    InReview,
    Done,
    Blocked,
    #[default]
    Unknown,
}

impl GithubMirrorStatus {
    pub fn is_known(&self) -> bool {
        !matches!(self, GithubMirrorStatus::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GithubMirrorStatus::Todo => "TODO",
            GithubMirrorStatus::InProgress => "IN_PROGRESS",
            GithubMirrorStatus::InReview => "IN_REVIEW",
            GithubMirrorStatus::Done => "DONE",
            GithubMirrorStatus::Blocked => "BLOCKED",
            GithubMirrorStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for GithubMirrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live execution state of the workflow runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    #[default]
    Idle,
    Running,
    Failed,
    Succeeded,
}

/// Progress of handing a record over to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandoffState {
    #[default]
    NotSent,
    Sent,
    Synced,
    Failed,
}

// ---------------------------------------------------------------------------
// Mirror state
// ---------------------------------------------------------------------------

/// Snapshot of the three status signals for one record.
///
/// Populated by the polling/webhook collaborator; read-only to this workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MirrorState {
    pub local_status: LocalStatus,
    #[serde(default)]
    pub github_mirror_status: GithubMirrorStatus,
    #[serde(default)]
    pub execution_state: ExecutionState,
    #[serde(default)]
    pub handoff_state: HandoffState,
    /// Free text or a serialized JSON payload from the tracker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_external_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_status_updated_at: Option<DateTime<Utc>>,
}

impl MirrorState {
    pub fn new(
        local_status: LocalStatus,
        github_mirror_status: GithubMirrorStatus,
        execution_state: ExecutionState,
    ) -> Self {
        Self {
            local_status,
            github_mirror_status,
            execution_state,
            ..Self::default()
        }
    }

    pub fn with_raw_external_status(mut self, raw: impl Into<String>) -> Self {
        self.raw_external_status = Some(raw.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Mirror link
// ---------------------------------------------------------------------------

/// Mirror-facing derived fields for one canonical record.
///
/// These are the only fields an upsert writes; the record's semantic content
/// is never touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorLink {
    pub external_id: ExternalId,
    pub external_url: String,
    pub rendered_hash: String,
    pub last_synced_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
