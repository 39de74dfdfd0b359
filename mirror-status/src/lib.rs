//! Status precedence, raw status normalization and drift detection.
//!
//! Everything here is a pure function of a [`MirrorState`] snapshot apart
//! from [`state_file::load`].
//!
//! [`MirrorState`]: mirror_core::MirrorState

pub mod drift;
pub mod error;
pub mod precedence;
pub mod raw;
pub mod state_file;

pub use drift::{detect_state_drift, DriftReport, DriftSeverity, ResourceSignal};
pub use error::StatusError;
pub use precedence::{
    compute_effective_status, decide_effective_status, map_mirror_to_local, PrecedenceRule,
    StatusDecision,
};
pub use raw::{
    extract_github_mirror_status, map_raw_github_status, RawExternalStatus, RawStatusSource,
    StatusSnapshot,
};
