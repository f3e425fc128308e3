//! `shipyard render <name>`: local preview, no cluster access.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use shipyard_core::{ResourceName, Setting};
use shipyard_renderer::{FsTemplateSource, TeraRenderer};

use super::{block_on, home_dir, load_config};
use crate::SettingArg;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Resource template name.
    pub name: String,

    /// Template setting, repeatable. Order is kept.
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
    pub settings: Vec<SettingArg>,

    /// Render the welcome text instead of the manifest.
    #[arg(long)]
    pub welcome: bool,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let config = load_config(&home)?;
        let source = FsTemplateSource::new(&config.templates_dir);
        let name = ResourceName::from(self.name);
        let settings: Vec<Setting> = self.settings.into_iter().map(Into::into).collect();
        let welcome = self.welcome;

        let out = block_on(async {
            let template = if welcome {
                source.open_welcome(&name).await?
            } else {
                source.open_manifest(&name).await?
            };
            let mut out = Vec::new();
            TeraRenderer::new()
                .render_stream(&mut out, template, &settings)
                .await
                .with_context(|| format!("failed to render '{name}'"))?;
            Ok::<_, anyhow::Error>(out)
        })??;

        std::io::stdout()
            .write_all(&out)
            .context("failed to write output")?;
        Ok(())
    }
}
