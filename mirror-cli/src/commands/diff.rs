//! `mirror diff <file>`: what an upsert would change on the tracker.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use mirror_sync::diff::{diff_record, RecordDiff};

use super::{github_orchestrator, home_dir, load_config};
use crate::{block_on, records};

/// Arguments for `mirror diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Record file to compare against the tracker.
    pub file: PathBuf,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let config = load_config(&home)?;
        let records = records::load_file(&self.file)?;
        let (_, orchestrator) = github_orchestrator(&config)?;

        let diffs = block_on(async {
            let mut diffs = Vec::with_capacity(records.len());
            for record in &records {
                let diff = diff_record(&orchestrator, record)
                    .await
                    .with_context(|| format!("diff failed for '{}'", record.canonical_id))?;
                diffs.push(diff);
            }
            anyhow::Ok(diffs)
        })??;

        for diff in &diffs {
            print_diff(diff);
        }
        Ok(())
    }
}

fn print_diff(diff: &RecordDiff) {
    match diff {
        RecordDiff::NotMirrored { canonical_id } => {
            println!("{canonical_id}: not mirrored yet; upsert would create it");
        }
        RecordDiff::Mirrored { canonical_id, .. } if diff.is_clean() => {
            println!("No differences for '{canonical_id}'.");
        }
        RecordDiff::Mirrored {
            canonical_id,
            external_id,
            title_change,
            body_diff,
            labels_added,
            labels_removed,
        } => {
            println!("{}", format!("{canonical_id} ({external_id})").bold());
            if let Some((remote, rendered)) = title_change {
                println!("{}", format!("- title: {remote}").red());
                println!("{}", format!("+ title: {rendered}").green());
            }
            for label in labels_removed {
                println!("{}", format!("- label: {label}").red());
            }
            for label in labels_added {
                println!("{}", format!("+ label: {label}").green());
            }
            if let Some(body_diff) = body_diff {
                print!("{body_diff}");
                if !body_diff.ends_with('\n') {
                    println!();
                }
            }
        }
    }
}
