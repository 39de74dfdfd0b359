//! Normalization of raw tracker status signals into [`GithubMirrorStatus`].
//!
//! Raw input arrives in several shapes: a governed project field, a
//! `status:`-prefixed label, the resource's own open/closed state, or free
//! text. Each is a [`RawStatusSource`]; [`extract_github_mirror_status`]
//! tries them in fixed priority order.
//!
//! A resource's own `closed` state never maps to `DONE`. Closing is not proof
//! of completion (duplicates and invalid reports are closed too).

use serde::{Deserialize, Serialize};

use mirror_core::GithubMirrorStatus;

/// Label prefixes that carry a status value, compared case-insensitively.
pub const STATUS_LABEL_PREFIXES: &[&str] = &["status:", "status/"];

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where a raw status value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum RawStatusSource {
    /// Explicit status field on a governed project board.
    ProjectField(String),
    /// Label value with the status prefix already stripped.
    Label(String),
    /// The resource's own open/closed state.
    IssueState(String),
    FreeText(String),
}

impl RawStatusSource {
    pub fn value(&self) -> &str {
        match self {
            RawStatusSource::ProjectField(v)
            | RawStatusSource::Label(v)
            | RawStatusSource::IssueState(v)
            | RawStatusSource::FreeText(v) => v,
        }
    }

    pub fn is_from_issue_state(&self) -> bool {
        matches!(self, RawStatusSource::IssueState(_))
    }

    pub fn normalize(&self) -> GithubMirrorStatus {
        map_raw_github_status(self.value(), self.is_from_issue_state())
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Lowercase, trim, treat `_`/`-` as spaces and collapse runs of whitespace.
fn normalize_text(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map a raw status value onto the mirror vocabulary.
///
/// Unrecognized values map to `UNKNOWN`. With `is_from_issue_state`, `closed`
/// maps to `UNKNOWN` instead of `DONE`.
pub fn map_raw_github_status(raw: &str, is_from_issue_state: bool) -> GithubMirrorStatus {
    let text = normalize_text(raw);
    if is_from_issue_state && text == "closed" {
        return GithubMirrorStatus::Unknown;
    }
    match text.as_str() {
        "todo" | "to do" | "backlog" | "new" | "triage" => GithubMirrorStatus::Todo,
        "in progress" | "implementing" | "doing" | "wip" | "started" => {
            GithubMirrorStatus::InProgress
        }
        "in review" | "review" | "pr" | "needs review" | "reviewing" => {
            GithubMirrorStatus::InReview
        }
        "done" | "completed" | "complete" | "closed" | "finished" | "merged" => {
            GithubMirrorStatus::Done
        }
        "blocked" | "hold" | "on hold" | "waiting" => GithubMirrorStatus::Blocked,
        _ => GithubMirrorStatus::Unknown,
    }
}

/// Value of the first status-prefixed label, prefix stripped.
pub fn status_label_value(labels: &[String]) -> Option<&str> {
    labels.iter().find_map(|label| {
        STATUS_LABEL_PREFIXES.iter().find_map(|prefix| {
            let head = label.get(..prefix.len())?;
            head.eq_ignore_ascii_case(prefix)
                .then(|| label[prefix.len()..].trim())
                .filter(|rest| !rest.is_empty())
        })
    })
}

/// Candidate sources in priority order: project field, status label, issue
/// state. Blank values are skipped.
pub fn status_sources(
    project_status_field: Option<&str>,
    labels: &[String],
    issue_state: Option<&str>,
) -> Vec<RawStatusSource> {
    let non_blank = |v: &&str| !v.trim().is_empty();
    let mut sources = Vec::with_capacity(3);
    if let Some(field) = project_status_field.filter(non_blank) {
        sources.push(RawStatusSource::ProjectField(field.to_string()));
    }
    if let Some(label) = status_label_value(labels) {
        sources.push(RawStatusSource::Label(label.to_string()));
    }
    if let Some(state) = issue_state.filter(non_blank) {
        sources.push(RawStatusSource::IssueState(state.to_string()));
    }
    sources
}

/// Compose the raw signals into one mirror status.
///
/// The first source that maps to a known status wins; a higher-priority
/// source with an unrecognized value does not hide a lower one.
pub fn extract_github_mirror_status(
    project_status_field: Option<&str>,
    labels: &[String],
    issue_state: Option<&str>,
) -> GithubMirrorStatus {
    status_sources(project_status_field, labels, issue_state)
        .iter()
        .map(RawStatusSource::normalize)
        .find(GithubMirrorStatus::is_known)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Raw payload
// ---------------------------------------------------------------------------

/// Structured snapshot stored in `raw_external_status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(default, alias = "project_status", alias = "status")]
    pub project_status: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, alias = "issueState", alias = "issue_state")]
    pub state: Option<String>,
}

/// Parsed `raw_external_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawExternalStatus {
    Snapshot(StatusSnapshot),
    FreeText(String),
}

impl RawExternalStatus {
    /// Parse a stored payload: a JSON object is a snapshot, anything else is
    /// free text. Bare `open`/`closed` is read as the resource's own state.
    /// Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('{') {
            if let Ok(snapshot) = serde_json::from_str::<StatusSnapshot>(trimmed) {
                return Some(RawExternalStatus::Snapshot(snapshot));
            }
        }
        match normalize_text(trimmed).as_str() {
            "open" | "closed" => Some(RawExternalStatus::Snapshot(StatusSnapshot {
                state: Some(normalize_text(trimmed)),
                ..StatusSnapshot::default()
            })),
            _ => Some(RawExternalStatus::FreeText(trimmed.to_string())),
        }
    }

    pub fn mirror_status(&self) -> GithubMirrorStatus {
        match self {
            RawExternalStatus::Snapshot(s) => extract_github_mirror_status(
                s.project_status.as_deref(),
                &s.labels,
                s.state.as_deref(),
            ),
            RawExternalStatus::FreeText(text) => RawStatusSource::FreeText(text.clone()).normalize(),
        }
    }

    /// The resource's own state, normalized to `open` / `closed`.
    pub fn issue_state(&self) -> Option<&str> {
        match self {
            RawExternalStatus::Snapshot(StatusSnapshot {
                state: Some(state), ..
            }) => match state.trim() {
                s if s.eq_ignore_ascii_case("open") => Some("open"),
                s if s.eq_ignore_ascii_case("closed") => Some("closed"),
                _ => None,
            },
            _ => None,
        }
    }
}
