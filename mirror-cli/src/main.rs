//! Mirror: publish canonical work records to a GitHub issue tracker.
//!
//! # Usage
//!
//! ```text
//! mirror init --repo <owner/name>
//! mirror render <file> [--json]
//! mirror upsert <file>... [--dry-run] [--force] [--json]
//! mirror diff <file>
//! mirror status <state-file>... [--json]
//! ```
//!
//! Logging goes to stderr, filtered by `MIRROR_LOG` (default `warn`).

mod commands;
mod github;
mod records;

use std::future::Future;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, init::InitArgs, render::RenderArgs, status::StatusArgs, upsert::UpsertArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "mirror",
    version,
    about = "Mirror canonical work records into an external issue tracker",
    long_about = None,
)]
struct Cli {
    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Point the mirror at a GitHub repository.
    Init(InitArgs),

    /// Render records to title, body, labels and content hash.
    Render(RenderArgs),

    /// Create or update the tracker issue for each record.
    Upsert(UpsertArgs),

    /// Show what an upsert would change on the tracker.
    Diff(DiffArgs),

    /// Compute effective status and drift for mirror state snapshots.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Render(args) => args.run(),
        Commands::Upsert(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("MIRROR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Drive one async command to completion on a current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
