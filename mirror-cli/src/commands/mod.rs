pub mod diff;
pub mod init;
pub mod render;
pub mod status;
pub mod upsert;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use mirror_core::{config, MirrorConfig};
use mirror_sync::UpsertOrchestrator;

use crate::github::GithubTracker;

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

pub(crate) fn load_config(home: &std::path::Path) -> Result<MirrorConfig> {
    config::load_at(home).context("failed to load mirror config")
}

/// Orchestrator over the GitHub tracker configured in `config`.
pub(crate) fn github_orchestrator(config: &MirrorConfig) -> Result<(bool, UpsertOrchestrator)> {
    let tracker = GithubTracker::from_config(config);
    let has_token = tracker.has_token();
    let orchestrator = UpsertOrchestrator::from_config(Arc::new(tracker), &config.labels)
        .context("invalid label configuration")?;
    Ok((has_token, orchestrator))
}
