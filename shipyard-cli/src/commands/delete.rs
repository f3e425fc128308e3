//! `shipyard delete <name>`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use shipyard_core::{registry, RegistryError, ResourceError, ResourceName};

use super::{
    block_on, build_orchestrator, home_dir, load_config, require_user, resource_error, USER_ENV,
};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Resource (namespace) name.
    pub name: String,

    /// Acting user's email.
    #[arg(long, short = 'u', env = USER_ENV)]
    pub user: Option<String>,
}

impl DeleteArgs {
    pub fn run(self) -> Result<()> {
        let user = require_user(self.user)?;
        let home = home_dir()?;
        let config = load_config(&home)?;
        let name = ResourceName::from(self.name);

        let outcome = block_on(async {
            let orchestrator = build_orchestrator(&home, &config).await?;
            Ok::<_, anyhow::Error>(orchestrator.delete(&user, &name).await)
        })??;
        let released = release_ownership(&home, &name, &outcome);
        outcome.map_err(|e| resource_error("delete", e))?;
        released
            .with_context(|| format!("'{name}' was deleted but its ownership record remains"))?;

        println!("{} {}", "deleted".green().bold(), name);
        Ok(())
    }
}

/// Drop the ownership record once the namespace is gone, including when
/// the cluster reports it was already absent.
fn release_ownership(
    home: &Path,
    name: &ResourceName,
    outcome: &Result<(), ResourceError>,
) -> Result<bool, RegistryError> {
    match outcome {
        Ok(()) | Err(ResourceError::NotFound) => registry::release_resource_at(home, name),
        Err(_) => Ok(false),
    }
}
