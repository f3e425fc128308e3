pub mod create;
pub mod delete;
pub mod render;
pub mod team;
pub mod templates;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use shipyard_cluster::KubeGateway;
use shipyard_core::{config, Config, FileTeamRegistry, Orchestrator, ResourceError, User};
use shipyard_renderer::{FsTemplateSource, TeraRenderer};

pub const USER_ENV: &str = "SHIPYARD_USER";

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

pub fn load_config(home: &std::path::Path) -> Result<Config> {
    config::load_at(home).context("failed to load ~/.shipyard/config.yaml")
}

/// Resolve the acting user from `--user` / `SHIPYARD_USER`.
pub fn require_user(user: Option<String>) -> Result<User> {
    match user.filter(|u| !u.trim().is_empty()) {
        Some(email) => Ok(User::new(email.trim())),
        None => Err(anyhow::anyhow!(
            "no user given; pass --user <email> or set {USER_ENV}"
        )),
    }
}

pub fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(fut))
}

/// Wire the production collaborators together.
pub async fn build_orchestrator(home: &std::path::Path, config: &Config) -> Result<Orchestrator> {
    let cluster = KubeGateway::connect(config.kube_context.as_deref(), config.field_manager.clone())
        .await
        .context("failed to connect to the cluster")?;
    debug!(
        templates = %config.templates_dir.display(),
        field_manager = %config.field_manager,
        "cluster client ready"
    );
    Ok(Orchestrator::new(
        Arc::new(FsTemplateSource::new(&config.templates_dir)),
        Arc::new(TeraRenderer::new()),
        Arc::new(cluster),
        Arc::new(FileTeamRegistry::at(home)),
    )
    .with_options(config.orchestrator_options()))
}

/// Attach the normalised code so the caller sees e.g. `PermissionDenied (403)`.
pub fn resource_error(action: &str, err: ResourceError) -> anyhow::Error {
    let code = err.code();
    let step = err.step().map(|s| format!(" at {s}")).unwrap_or_default();
    let headline = format!(
        "{action} failed{step}: {} ({})",
        code.name(),
        code.status_code()
    );
    anyhow::Error::new(err).context(headline)
}
