//! `mirror status`: effective status and drift for mirror state snapshots.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use mirror_core::{ExecutionState, GithubMirrorStatus, LocalStatus, MirrorState};
use mirror_status::{
    decide_effective_status, detect_state_drift, state_file, DriftReport, DriftSeverity,
    PrecedenceRule,
};

/// Arguments for `mirror status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Mirror state files (YAML or JSON).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let rows = self
            .files
            .iter()
            .map(|path| evaluate(path))
            .collect::<Result<Vec<_>>>()?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(&rows);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusRow {
    file: String,
    local_status: LocalStatus,
    github_mirror_status: GithubMirrorStatus,
    execution_state: ExecutionState,
    effective_status: LocalStatus,
    rule: PrecedenceRule,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_status_updated_at: Option<DateTime<Utc>>,
    drift: DriftReport,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "local")]
    local: String,
    #[tabled(rename = "mirror")]
    mirror: String,
    #[tabled(rename = "execution")]
    execution: String,
    #[tabled(rename = "effective")]
    effective: String,
    #[tabled(rename = "rule")]
    rule: String,
    #[tabled(rename = "mirror age")]
    age: String,
    #[tabled(rename = "drift")]
    drift: String,
}

fn evaluate(path: &Path) -> Result<StatusRow> {
    let state: MirrorState = state_file::load(path)
        .with_context(|| format!("cannot load mirror state '{}'", path.display()))?;
    let decision = decide_effective_status(&state);
    Ok(StatusRow {
        file: path.display().to_string(),
        local_status: state.local_status,
        github_mirror_status: state.github_mirror_status,
        execution_state: state.execution_state,
        effective_status: decision.effective,
        rule: decision.rule,
        external_status_updated_at: state.external_status_updated_at,
        drift: detect_state_drift(&state),
    })
}

fn print_table(rows: &[StatusRow]) {
    let drifting = rows.iter().filter(|r| r.drift.has_drift).count();
    println!(
        "Mirror v{} | {} records | {} drifting",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        drifting
    );

    let table_rows: Vec<StatusTableRow> = rows
        .iter()
        .map(|row| StatusTableRow {
            file: file_name(&row.file),
            local: row.local_status.to_string(),
            mirror: row.github_mirror_status.to_string(),
            execution: format!("{:?}", row.execution_state).to_uppercase(),
            effective: row.effective_status.to_string(),
            rule: rule_label(row.rule).to_string(),
            age: row
                .external_status_updated_at
                .map(format_age)
                .unwrap_or_else(|| "never".to_string()),
            drift: drift_label(&row.drift),
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    for row in rows.iter().filter(|r| r.drift.has_drift) {
        println!("  {} {}: {}", drift_indicator(&row.drift), file_name(&row.file), row.drift.message);
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn rule_label(rule: PrecedenceRule) -> &'static str {
    match rule {
        PrecedenceRule::ExecutionDominates => "execution",
        PrecedenceRule::MirrorDominates => "mirror",
        PrecedenceRule::LocalFallback => "local",
    }
}

fn drift_label(report: &DriftReport) -> String {
    match report.severity {
        Some(DriftSeverity::Warning) => "WARNING".to_string(),
        Some(DriftSeverity::Info) => "INFO".to_string(),
        None => "-".to_string(),
    }
}

fn drift_indicator(report: &DriftReport) -> String {
    match report.severity {
        Some(DriftSeverity::Warning) => "■".yellow().bold().to_string(),
        Some(DriftSeverity::Info) => "■".cyan().bold().to_string(),
        None => "■".green().bold().to_string(),
    }
}

fn format_age(timestamp: DateTime<Utc>) -> String {
    let seconds = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0);
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 60 * 60 => format!("{}m", s / 60),
        s if s < 60 * 60 * 24 => format!("{}h", s / (60 * 60)),
        s => format!("{}d", s / (60 * 60 * 24)),
    }
}
