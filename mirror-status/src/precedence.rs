//! Effective status from local, mirror and execution signals.
//!
//! Rules, first match wins:
//! - R1: a running execution keeps the local status.
//! - R2: otherwise a known mirror status maps through a fixed table.
//! - R3: otherwise the local status stands.

use serde::Serialize;

use mirror_core::{ExecutionState, GithubMirrorStatus, LocalStatus, MirrorState};

/// Which rule decided the effective status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecedenceRule {
    ExecutionDominates,
    MirrorDominates,
    LocalFallback,
}

/// Effective status plus the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDecision {
    pub effective: LocalStatus,
    pub rule: PrecedenceRule,
}

/// Fixed mirror → local table. `UNKNOWN` has no mapping.
pub fn map_mirror_to_local(status: GithubMirrorStatus) -> Option<LocalStatus> {
    match status {
        GithubMirrorStatus::Todo => Some(LocalStatus::SpecReady),
        GithubMirrorStatus::InProgress => Some(LocalStatus::Implementing),
        GithubMirrorStatus::InReview => Some(LocalStatus::MergeReady),
        GithubMirrorStatus::Done => Some(LocalStatus::Done),
        GithubMirrorStatus::Blocked => Some(LocalStatus::Hold),
        GithubMirrorStatus::Unknown => None,
    }
}

pub fn decide_effective_status(state: &MirrorState) -> StatusDecision {
    if state.execution_state == ExecutionState::Running {
        return StatusDecision {
            effective: state.local_status,
            rule: PrecedenceRule::ExecutionDominates,
        };
    }
    match map_mirror_to_local(state.github_mirror_status) {
        Some(effective) => StatusDecision {
            effective,
            rule: PrecedenceRule::MirrorDominates,
        },
        None => StatusDecision {
            effective: state.local_status,
            rule: PrecedenceRule::LocalFallback,
        },
    }
}

/// Effective local status for `state`.
pub fn compute_effective_status(state: &MirrorState) -> LocalStatus {
    decide_effective_status(state).effective
}
