//! `mirror init --repo <owner/name>`

use anyhow::{Context, Result};
use clap::Args;

use mirror_core::{config, Repository};

use super::home_dir;

/// Point the mirror at a GitHub repository.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Target repository as `owner/name`.
    #[arg(long, short = 'r')]
    pub repo: Repository,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let repo = self.repo.to_string();
        let config = config::init_at(&home, self.repo)
            .with_context(|| format!("failed to init mirror for '{repo}'"))?;

        println!("✓ Mirroring into '{}'", config.repository);
        println!("  Saved to: ~/.mirror/config.yaml");
        println!(
            "  Token read from ${} at upsert time",
            config.token_env
        );
        Ok(())
    }
}
