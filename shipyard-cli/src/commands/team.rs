//! `shipyard team create|add-user|assign|list`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use shipyard_core::{registry, ResourceName, TeamName};

use super::home_dir;

/// Manage teams in `~/.shipyard/teams.yaml`.
#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    /// Register a new, empty team.
    Create(CreateTeamArgs),

    /// Add a member to a team.
    AddUser(AddUserArgs),

    /// Record a team as owner of an existing resource.
    Assign(AssignArgs),

    /// List teams with their members and resources.
    List,
}

#[derive(Args, Debug)]
pub struct CreateTeamArgs {
    pub name: String,
}

#[derive(Args, Debug)]
pub struct AddUserArgs {
    pub team: String,
    pub email: String,
}

#[derive(Args, Debug)]
pub struct AssignArgs {
    pub team: String,
    pub resource: String,
}

pub fn run(cmd: TeamCommand) -> Result<()> {
    let home = home_dir()?;
    match cmd {
        TeamCommand::Create(args) => {
            let team = registry::create_team_at(&home, TeamName::from(args.name))
                .context("failed to create team")?;
            println!("{} team {}", "created".green().bold(), team.name);
        }
        TeamCommand::AddUser(args) => {
            let team = TeamName::from(args.team);
            registry::add_member_at(&home, &team, &args.email)
                .context("failed to add team member")?;
            println!("{} {} to {}", "added".green().bold(), args.email, team);
        }
        TeamCommand::Assign(args) => {
            let team = TeamName::from(args.team);
            let resource = ResourceName::from(args.resource);
            registry::assign_resource_at(&home, &team, &resource)
                .context("failed to assign resource")?;
            println!("{} {} to {}", "assigned".green().bold(), resource, team);
        }
        TeamCommand::List => list(&home)?,
    }
    Ok(())
}

fn list(home: &std::path::Path) -> Result<()> {
    let teams = registry::load_teams_at(home).context("failed to load teams.yaml")?;

    if teams.teams.is_empty() {
        println!("No teams registered.");
        println!("Run: shipyard team create <name>");
        return Ok(());
    }

    if !teams.admins.is_empty() {
        println!("Admins: {}", teams.admins.join(", "));
    }
    for team in &teams.teams {
        println!("\nTeam: {}", team.name);
        for member in &team.members {
            println!("  member   {member}");
        }
        for resource in &team.resources {
            println!("  resource {resource}");
        }
    }
    Ok(())
}
