//! `shipyard templates`: what can be created.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use shipyard_renderer::{FsTemplateSource, TemplateEntry};

use super::{home_dir, load_config};

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "manifest")]
    manifest: &'static str,
    #[tabled(rename = "welcome")]
    welcome: &'static str,
}

impl From<&TemplateEntry> for TemplateRow {
    fn from(e: &TemplateEntry) -> Self {
        let mark = |present: bool| if present { "yes" } else { "missing" };
        TemplateRow {
            name: e.name.clone(),
            manifest: mark(e.has_manifest),
            welcome: mark(e.has_welcome),
        }
    }
}

impl TemplatesArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let config = load_config(&home)?;
        let source = FsTemplateSource::new(&config.templates_dir);
        let entries = source
            .list()
            .with_context(|| format!("failed to list {}", source.root().display()))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("No templates found in {}", source.root().display());
            return Ok(());
        }

        let rows: Vec<TemplateRow> = entries.iter().map(TemplateRow::from).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");

        let incomplete = entries.iter().filter(|e| !e.is_complete()).count();
        if incomplete > 0 {
            println!(
                "{} {incomplete} template(s) cannot be created until both files exist",
                "note:".yellow()
            );
        }
        Ok(())
    }
}
