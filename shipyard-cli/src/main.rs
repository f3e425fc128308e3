//! Shipyard: team resource provisioning CLI.
//!
//! # Usage
//!
//! ```text
//! shipyard create <name> --team <team> [--set key=value]... [--user <email>]
//! shipyard delete <name> [--user <email>]
//! shipyard render <name> [--set key=value]... [--welcome]
//! shipyard templates [--json]
//! shipyard team create|add-user|assign|list
//! ```

mod commands;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    create::CreateArgs, delete::DeleteArgs, render::RenderArgs, team::TeamCommand,
    templates::TemplatesArgs,
};
use shipyard_core::types::{RequestSetting, Setting};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "shipyard",
    version,
    about = "Provision team resources as cluster namespaces",
    long_about = None,
)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision a resource into a new namespace.
    Create(CreateArgs),

    /// Tear down a resource's namespace.
    Delete(DeleteArgs),

    /// Render a resource template locally without touching the cluster.
    Render(RenderArgs),

    /// List available resource templates.
    Templates(TemplatesArgs),

    /// Manage teams, members and resource ownership.
    Team {
        #[command(subcommand)]
        command: TeamCommand,
    },
}

// ---------------------------------------------------------------------------
// Shared `--set key=value` argument
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse a [`Setting`] from `key=value`.
#[derive(Debug, Clone)]
pub struct SettingArg(pub Setting);

impl FromStr for SettingArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok(Self(Setting::new(key.trim(), value)))
            }
            _ => Err(format!("invalid setting '{s}'; expected KEY=VALUE")),
        }
    }
}

impl fmt::Display for SettingArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.0.key, self.0.value)
    }
}

impl From<SettingArg> for Setting {
    fn from(s: SettingArg) -> Self {
        s.0
    }
}

impl From<SettingArg> for RequestSetting {
    fn from(s: SettingArg) -> Self {
        RequestSetting {
            key: s.0.key,
            value: s.0.value,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    match cli.command {
        Commands::Create(args) => args.run(),
        Commands::Delete(args) => args.run(),
        Commands::Render(args) => args.run(),
        Commands::Templates(args) => args.run(),
        Commands::Team { command } => commands::team::run(command),
    }
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_arg_splits_on_first_equals() {
        let arg: SettingArg = "url=postgres://u:p@h/db?x=1".parse().expect("parse");
        assert_eq!(arg.0, Setting::new("url", "postgres://u:p@h/db?x=1"));
    }

    #[test]
    fn setting_arg_allows_empty_value() {
        let arg: SettingArg = "flag=".parse().expect("parse");
        assert_eq!(arg.0.value, "");
    }

    #[test]
    fn setting_arg_rejects_missing_key() {
        assert!("=value".parse::<SettingArg>().is_err());
        assert!("novalue".parse::<SettingArg>().is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
