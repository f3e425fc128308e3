//! `shipyard create <name> --team <team> [--set key=value]...`

use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use shipyard_core::{
    registry, CreateRequest, RenderedResource, RequestSetting, Resource, ResourceError,
};

use super::{
    block_on, build_orchestrator, home_dir, load_config, require_user, resource_error, USER_ENV,
};
use crate::SettingArg;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Resource name; also the namespace name.
    pub name: String,

    /// Team the resource is created for.
    #[arg(long, short = 't')]
    pub team: String,

    /// Template setting, repeatable. Order is kept.
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
    pub settings: Vec<SettingArg>,

    /// Acting user's email.
    #[arg(long, short = 'u', env = USER_ENV)]
    pub user: Option<String>,

    /// Print the full result as JSON instead of the welcome text.
    #[arg(long)]
    pub json: bool,
}

impl CreateArgs {
    fn request(&self) -> CreateRequest {
        CreateRequest {
            name: self.name.clone(),
            team_name: self.team.clone(),
            settings: self
                .settings
                .iter()
                .cloned()
                .map(RequestSetting::from)
                .collect(),
        }
    }

    pub fn run(self) -> Result<()> {
        let user = require_user(self.user.clone())?;
        let home = home_dir()?;
        let config = load_config(&home)?;
        let resource = Resource::from(self.request());

        let outcome = block_on(async {
            let orchestrator = build_orchestrator(&home, &config).await?;
            Ok::<_, anyhow::Error>(orchestrator.create(&user, &resource).await)
        })??;
        record_ownership(&home, &resource, &outcome);
        let rendered = outcome.map_err(|e| resource_error("create", e))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rendered)?);
            return Ok(());
        }

        eprintln!(
            "{} {} for team {}",
            "created".green().bold(),
            rendered.name,
            rendered.team_name
        );
        print!("{}", rendered.welcome);
        if !rendered.welcome.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}

/// Record the team as owner whenever its namespace may exist, so a
/// half-provisioned namespace can still be deleted by its team.
fn record_ownership(
    home: &Path,
    resource: &Resource,
    outcome: &Result<RenderedResource, ResourceError>,
) -> bool {
    let namespace_exists = match outcome {
        Ok(_) => true,
        Err(err) => err.after_namespace_created(),
    };
    if !namespace_exists {
        return false;
    }
    match registry::assign_resource_at(home, &resource.team_name, &resource.name) {
        Ok(()) => true,
        Err(err) => {
            eprintln!(
                "{} '{}' exists but could not be recorded for team '{}': {err}",
                "warning:".yellow().bold(),
                resource.name,
                resource.team_name
            );
            false
        }
    }
}
