//! # mirror-sync
//!
//! Mirror synchronization engine: publishes canonical records to an external
//! tracker with an idempotent, race-tolerant upsert.
//!
//! Call [`UpsertOrchestrator::upsert`] for a single record, or
//! [`pipeline::run`] to sync a batch with hash-gated skips and a persisted
//! link store.

pub mod classify;
pub mod diff;
pub mod error;
pub mod labels;
pub mod link_store;
pub mod memory;
pub mod pipeline;
pub mod resolver;
pub mod tracker;
pub mod upsert;

pub use classify::{classify, Classification, ErrorCode};
pub use error::{ApiError, ApiErrorCode, SyncError, TrackerError, TrackerOp};
pub use labels::ManagedLabelPolicy;
pub use memory::InMemoryTracker;
pub use resolver::{CanonicalResolver, MatchedBy, ResolveResult};
pub use tracker::{
    Candidate, IssueRef, IssueSnapshot, IssueState, IssueUpdate, NewIssue, SearchQuery,
    TrackerClient,
};
pub use upsert::{UpsertMode, UpsertOrchestrator, UpsertResult};
