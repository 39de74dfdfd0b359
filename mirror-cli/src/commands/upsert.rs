//! `mirror upsert`: publish records through the hash-gated pipeline.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use mirror_sync::pipeline::{self, SyncOptions, SyncOutcome};

use super::{github_orchestrator, home_dir, load_config};
use crate::{block_on, records};

/// Arguments for `mirror upsert`.
#[derive(Args, Debug)]
pub struct UpsertArgs {
    /// Record files (YAML or JSON, one record or a list each).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Show what would be published without touching the tracker.
    #[arg(long)]
    pub dry_run: bool,

    /// Upsert even when the stored content hash is unchanged.
    #[arg(long)]
    pub force: bool,

    /// Emit machine-readable JSON (outcomes, or the API error on failure).
    #[arg(long)]
    pub json: bool,
}

impl UpsertArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let config = load_config(&home)?;
        let records = records::load_all(&self.files)?;
        let (has_token, orchestrator) = github_orchestrator(&config)?;
        if !self.dry_run && !has_token {
            bail!(
                "no GitHub token: set ${} or use --dry-run",
                config.token_env
            );
        }

        let options = SyncOptions {
            dry_run: self.dry_run,
            force: self.force,
        };
        let result = block_on(pipeline::run(
            &home,
            &config.repository,
            &orchestrator,
            &records,
            options,
        ))?;

        let outcomes = match result {
            Ok(outcomes) => outcomes,
            Err(err) => {
                if self.json {
                    let api_error = serde_json::to_string_pretty(&err.to_api_error())
                        .context("failed to serialize error JSON")?;
                    println!("{api_error}");
                }
                return Err(err).context("upsert failed");
            }
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcomes).context("failed to serialize upsert JSON")?
            );
            return Ok(());
        }
        print_outcomes(&config.repository.to_string(), &outcomes, self.dry_run);
        Ok(())
    }
}

fn print_outcomes(repo: &str, outcomes: &[SyncOutcome], dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if outcomes.is_empty() {
        println!("{prefix}✓ '{repo}': nothing to do");
        return;
    }

    let unchanged = outcomes
        .iter()
        .filter(|o| matches!(o, SyncOutcome::Unchanged { .. }))
        .count();
    println!(
        "{prefix}✓ '{repo}' synced ({} published, {unchanged} unchanged)",
        outcomes.len() - unchanged,
    );

    for outcome in outcomes {
        match outcome {
            SyncOutcome::Created {
                canonical_id,
                external_id,
                external_url,
            } => println!("  +  {canonical_id} → {external_id} {external_url}"),
            SyncOutcome::Updated {
                canonical_id,
                external_id,
                external_url,
            } => println!("  ✎  {canonical_id} → {external_id} {external_url}"),
            SyncOutcome::Unchanged {
                canonical_id,
                external_id,
            } => println!("  ·  {canonical_id} → {external_id}"),
            SyncOutcome::WouldUpsert {
                canonical_id,
                rendered_hash,
            } => println!("  ~  {canonical_id} ({})", &rendered_hash[..12.min(rendered_hash.len())]),
        }
    }
}
