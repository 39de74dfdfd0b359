//! `mirror render <file> [--json]`: offline preview of rendered content.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mirror_core::{config::load_at, ConfigError, LabelConfig};
use mirror_renderer::{ContentRenderer, RenderedContent};

use super::home_dir;
use crate::records;

/// Arguments for `mirror render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Record file (YAML or JSON, one record or a list).
    pub file: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let labels = label_config()?;
        let renderer = ContentRenderer::new(&labels).context("failed to build renderer")?;
        let records = records::load_file(&self.file)?;

        let rendered = records
            .iter()
            .map(|record| {
                renderer
                    .render(record)
                    .with_context(|| format!("render failed for '{}'", record.canonical_id))
            })
            .collect::<Result<Vec<_>>>()?;

        if self.json {
            let payload = if rendered.len() == 1 {
                serde_json::to_string_pretty(&rendered[0])
            } else {
                serde_json::to_string_pretty(&rendered)
            };
            println!("{}", payload.context("failed to serialize render JSON")?);
            return Ok(());
        }

        for (i, content) in rendered.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print_content(content);
        }
        Ok(())
    }
}

/// Labels from the config when one exists, defaults otherwise; rendering
/// does not need `mirror init`.
fn label_config() -> Result<LabelConfig> {
    let home = home_dir()?;
    match load_at(&home) {
        Ok(config) => Ok(config.labels),
        Err(ConfigError::NotFound { .. }) => Ok(LabelConfig::default()),
        Err(e) => Err(e).context("failed to load mirror config"),
    }
}

fn print_content(content: &RenderedContent) {
    let labels: Vec<&str> = content.labels.iter().map(String::as_str).collect();
    println!("title:  {}", content.title);
    println!("labels: {}", labels.join(", "));
    println!("hash:   {}", content.hash);
    println!();
    print!("{}", content.body);
    if !content.body.ends_with('\n') {
        println!();
    }
}
