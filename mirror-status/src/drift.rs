//! Local vs. external open/closed drift.
//!
//! Drift is only assessed when a mirror signal exists and no execution is
//! running. The open/closed signal comes from the raw payload's state when it
//! carries one, otherwise it is inferred from the mirror status: `DONE` reads
//! as closed, any other known status as open.

use serde::{Deserialize, Serialize};

use mirror_core::{ExecutionState, GithubMirrorStatus, MirrorState};

use crate::raw::RawExternalStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    Info,
    Warning,
}

/// External resource open/closed as seen by the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceSignal {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub has_drift: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<DriftSeverity>,
    pub message: String,
}

impl DriftReport {
    fn none(message: impl Into<String>) -> Self {
        Self {
            has_drift: false,
            severity: None,
            message: message.into(),
        }
    }

    fn drift(severity: DriftSeverity, message: impl Into<String>) -> Self {
        Self {
            has_drift: true,
            severity: Some(severity),
            message: message.into(),
        }
    }
}

/// Where an open/closed signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalOrigin {
    /// The raw payload carried the resource's own state.
    Reported,
    /// Read off a known mirror status.
    Inferred(GithubMirrorStatus),
}

/// Open/closed signal for `state`, `None` when nothing can be said.
pub fn resource_signal(state: &MirrorState) -> Option<ResourceSignal> {
    observed_signal(state).map(|(signal, _)| signal)
}

fn observed_signal(state: &MirrorState) -> Option<(ResourceSignal, SignalOrigin)> {
    let raw = state
        .raw_external_status
        .as_deref()
        .and_then(RawExternalStatus::parse);

    match raw.as_ref().and_then(RawExternalStatus::issue_state) {
        Some("closed") => return Some((ResourceSignal::Closed, SignalOrigin::Reported)),
        Some(_) => return Some((ResourceSignal::Open, SignalOrigin::Reported)),
        None => {}
    }

    let mirror = if state.github_mirror_status.is_known() {
        state.github_mirror_status
    } else {
        raw.as_ref()
            .map(RawExternalStatus::mirror_status)
            .unwrap_or_default()
    };
    let origin = SignalOrigin::Inferred(mirror);
    match mirror {
        GithubMirrorStatus::Unknown => None,
        GithubMirrorStatus::Done => Some((ResourceSignal::Closed, origin)),
        _ => Some((ResourceSignal::Open, origin)),
    }
}

fn has_mirror_signal(state: &MirrorState) -> bool {
    state.github_mirror_status.is_known()
        || state
            .raw_external_status
            .as_deref()
            .is_some_and(|raw| !raw.trim().is_empty())
}

/// Compare the local workflow with the external resource's open/closed state.
pub fn detect_state_drift(state: &MirrorState) -> DriftReport {
    if !has_mirror_signal(state) {
        return DriftReport::none("no mirror signal; drift not assessed");
    }
    if state.execution_state == ExecutionState::Running {
        return DriftReport::none("execution in progress; drift not assessed");
    }
    let Some((signal, origin)) = observed_signal(state) else {
        return DriftReport::none("mirror signal carries no open/closed state");
    };

    let local = state.local_status;
    match (local.is_terminal(), signal, origin) {
        (false, ResourceSignal::Closed, SignalOrigin::Reported) => DriftReport::drift(
            DriftSeverity::Warning,
            format!("external resource closed while local workflow still active ({local})"),
        ),
        (false, ResourceSignal::Closed, SignalOrigin::Inferred(mirror)) => DriftReport::drift(
            DriftSeverity::Warning,
            format!("mirror reports {mirror} while local workflow still active ({local})"),
        ),
        (true, ResourceSignal::Open, SignalOrigin::Reported) => DriftReport::drift(
            DriftSeverity::Info,
            format!(
                "local marked {}; external resource still open",
                local.as_str().to_lowercase()
            ),
        ),
        (true, ResourceSignal::Open, SignalOrigin::Inferred(mirror)) => DriftReport::drift(
            DriftSeverity::Info,
            format!(
                "local marked {}; mirror reports {mirror}",
                local.as_str().to_lowercase()
            ),
        ),
        _ => DriftReport::none("local and external state agree"),
    }
}
