//! Mirror core library: domain types, configuration persistence, errors.
//!
//! - [`types`]: canonical records, status enums, mirror state and links
//! - [`config`]: `~/.mirror/config.yaml` load / save / init
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{LabelConfig, MirrorConfig, Repository};
pub use error::ConfigError;
pub use types::{
    CanonicalId, CanonicalRecord, ExecutionState, ExternalId, GithubMirrorStatus, HandoffState,
    LocalStatus, MirrorLink, MirrorState,
};
