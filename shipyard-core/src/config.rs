//! `~/.shipyard/config.yaml`.
//!
//! Every field is optional in the file; a missing file yields the defaults.
//! `SHIPYARD_TEMPLATES_DIR` and `SHIPYARD_KUBE_CONTEXT` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::orchestrator::OrchestratorOptions;
use crate::registry::{home, shipyard_dir_at};

pub const TEMPLATES_DIR_ENV: &str = "SHIPYARD_TEMPLATES_DIR";
pub const KUBE_CONTEXT_ENV: &str = "SHIPYARD_KUBE_CONTEXT";

pub const DEFAULT_FIELD_MANAGER: &str = "shipyard";
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of `<name>/manifest.yaml.tera` + `<name>/welcome.txt.tera` pairs.
    /// Relative paths are resolved against `~/.shipyard/`.
    pub templates_dir: PathBuf,
    /// Kubeconfig context; `None` uses the current context.
    pub kube_context: Option<String>,
    /// Field manager recorded on server-side applied objects.
    pub field_manager: String,
    /// Deadline for each collaborator call. `None` disables it.
    pub call_timeout_secs: Option<u64>,
    /// Delete a freshly created namespace when a later step fails.
    pub rollback_on_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            templates_dir: PathBuf::from("templates"),
            kube_context: None,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            call_timeout_secs: Some(DEFAULT_CALL_TIMEOUT_SECS),
            rollback_on_failure: false,
        }
    }
}

impl Config {
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            call_timeout: self.call_timeout_secs.map(Duration::from_secs),
            rollback_on_failure: self.rollback_on_failure,
        }
    }

    fn resolve(mut self, home: &Path) -> Self {
        if self.templates_dir.is_relative() {
            self.templates_dir = shipyard_dir_at(home).join(&self.templates_dir);
        }
        self
    }

    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(TEMPLATES_DIR_ENV).filter(|v| !v.is_empty()) {
            self.templates_dir = PathBuf::from(dir);
        }
        if let Some(ctx) = lookup(KUBE_CONTEXT_ENV).filter(|v| !v.is_empty()) {
            self.kube_context = Some(ctx);
        }
        self
    }
}

/// `<home>/.shipyard/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    shipyard_dir_at(home).join("config.yaml")
}

/// Load the file only, without environment overrides.
pub fn load_file_at(home: &Path) -> Result<Config, RegistryError> {
    let path = config_path_at(home);
    let config = if path.exists() {
        let contents = std::fs::read_to_string(&path)?;
        serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse { path, source: e })?
    } else {
        Config::default()
    };
    Ok(config.resolve(home))
}

/// Load the file and apply environment overrides.
pub fn load_at(home: &Path) -> Result<Config, RegistryError> {
    Ok(load_file_at(home)?.apply_env(|k| std::env::var(k).ok()))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, RegistryError> {
    load_at(&home()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write_config(home: &Path, body: &str) {
        let dir = shipyard_dir_at(home);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), body).unwrap();
    }

    #[test]
    fn defaults_when_missing() {
        let home = TempDir::new().unwrap();
        let config = load_file_at(home.path()).expect("load");
        assert_eq!(
            config.templates_dir,
            home.path().join(".shipyard").join("templates")
        );
        assert_eq!(config.field_manager, "shipyard");
        assert_eq!(
            config.orchestrator_options().call_timeout,
            Some(Duration::from_secs(30))
        );
        assert!(!config.rollback_on_failure);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let home = TempDir::new().unwrap();
        write_config(
            home.path(),
            "templates_dir: /srv/templates\nrollback_on_failure: true\ncall_timeout_secs: null\n",
        );
        let config = load_file_at(home.path()).expect("load");
        assert_eq!(config.templates_dir, PathBuf::from("/srv/templates"));
        assert!(config.rollback_on_failure);
        assert_eq!(config.field_manager, "shipyard");
        assert_eq!(config.orchestrator_options().call_timeout, None);
    }

    #[test]
    fn malformed_file_reports_path() {
        let home = TempDir::new().unwrap();
        write_config(home.path(), "rollback_on_failure: [not, a, bool]\n");
        let err = load_file_at(home.path()).unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            (TEMPLATES_DIR_ENV, "/tmp/tpl"),
            (KUBE_CONTEXT_ENV, "kind-dev"),
        ]
        .into_iter()
        .collect();
        let config = Config::default().apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.templates_dir, PathBuf::from("/tmp/tpl"));
        assert_eq!(config.kube_context.as_deref(), Some("kind-dev"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let config = Config::default().apply_env(|_| Some(String::new()));
        assert_eq!(config, Config::default());
    }
}
