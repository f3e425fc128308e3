//! File-backed team registry and the production [`AuthorizationGate`].
//!
//! # Storage layout
//!
//! ```text
//! ~/.shipyard/
//!   teams.yaml     (mode 0600)
//!   config.yaml    (see crate::config)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::collaborators::AuthorizationGate;
use crate::error::{BoxError, RegistryError};
use crate::types::{ResourceName, TeamName, User};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: TeamName,
    #[serde(default)]
    pub members: Vec<String>,
    /// Resources owned by the team.
    #[serde(default)]
    pub resources: Vec<ResourceName>,
}

/// Root of `teams.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeamRegistry {
    /// Users authorized for every team and resource.
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub teams: Vec<Team>,
}

impl TeamRegistry {
    pub fn team(&self, name: &TeamName) -> Option<&Team> {
        self.teams.iter().find(|t| &t.name == name)
    }

    fn team_mut(&mut self, name: &TeamName) -> Result<&mut Team, RegistryError> {
        self.teams
            .iter_mut()
            .find(|t| &t.name == name)
            .ok_or_else(|| RegistryError::TeamNotFound(name.0.clone()))
    }

    pub fn is_admin(&self, email: &str) -> bool {
        self.admins.iter().any(|a| a == email)
    }

    pub fn is_member(&self, team: &TeamName, email: &str) -> bool {
        self.is_admin(email)
            || self
                .team(team)
                .is_some_and(|t| t.members.iter().any(|m| m == email))
    }

    /// True when `email` belongs to a team that owns `resource`.
    pub fn can_access(&self, resource: &ResourceName, email: &str) -> bool {
        self.is_admin(email)
            || self.teams.iter().any(|t| {
                t.resources.contains(resource) && t.members.iter().any(|m| m == email)
            })
    }

    pub fn owner_of(&self, resource: &ResourceName) -> Option<&TeamName> {
        self.teams
            .iter()
            .find(|t| t.resources.contains(resource))
            .map(|t| &t.name)
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.shipyard/`
pub fn shipyard_dir_at(home: &Path) -> PathBuf {
    home.join(".shipyard")
}

/// `<home>/.shipyard/teams.yaml`: pure, no I/O.
pub fn teams_path_at(home: &Path) -> PathBuf {
    shipyard_dir_at(home).join("teams.yaml")
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load `teams.yaml`. A missing file is an empty registry.
pub fn load_teams_at(home: &Path) -> Result<TeamRegistry, RegistryError> {
    let path = teams_path_at(home);
    if !path.exists() {
        return Ok(TeamRegistry::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    parse_teams(path, &contents)
}

/// Non-blocking `load_teams_at`, for use inside async callers.
pub async fn load_teams_at_async(home: &Path) -> Result<TeamRegistry, RegistryError> {
    let path = teams_path_at(home);
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => parse_teams(path, &contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TeamRegistry::default()),
        Err(e) => Err(e.into()),
    }
}

fn parse_teams(path: PathBuf, contents: &str) -> Result<TeamRegistry, RegistryError> {
    serde_yaml::from_str(contents).map_err(|e| RegistryError::Parse { path, source: e })
}

/// `load_teams_at` convenience wrapper.
pub fn load_teams() -> Result<TeamRegistry, RegistryError> {
    load_teams_at(&home()?)
}

/// Atomically save `teams.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_teams_at(home: &Path, registry: &TeamRegistry) -> Result<(), RegistryError> {
    let dir = shipyard_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    let path = teams_path_at(home);
    let tmp_path = path.with_file_name("teams.yaml.tmp");

    let yaml = serde_yaml::to_string(registry)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_teams_at` convenience wrapper.
pub fn save_teams(registry: &TeamRegistry) -> Result<(), RegistryError> {
    save_teams_at(&home()?, registry)
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

fn update_at<T>(
    home: &Path,
    f: impl FnOnce(&mut TeamRegistry) -> Result<T, RegistryError>,
) -> Result<T, RegistryError> {
    let mut registry = load_teams_at(home)?;
    let out = f(&mut registry)?;
    save_teams_at(home, &registry)?;
    Ok(out)
}

/// Register a new, empty team.
pub fn create_team_at(home: &Path, name: TeamName) -> Result<Team, RegistryError> {
    update_at(home, |registry| {
        if registry.team(&name).is_some() {
            return Err(RegistryError::TeamExists(name.0.clone()));
        }
        let team = Team {
            name,
            members: vec![],
            resources: vec![],
        };
        registry.teams.push(team.clone());
        Ok(team)
    })
}

/// `create_team_at` convenience wrapper.
pub fn create_team(name: TeamName) -> Result<Team, RegistryError> {
    create_team_at(&home()?, name)
}

/// Add `email` to `team`. Idempotent.
pub fn add_member_at(home: &Path, team: &TeamName, email: &str) -> Result<(), RegistryError> {
    update_at(home, |registry| {
        let team = registry.team_mut(team)?;
        if !team.members.iter().any(|m| m == email) {
            team.members.push(email.to_string());
        }
        Ok(())
    })
}

/// `add_member_at` convenience wrapper.
pub fn add_member(team: &TeamName, email: &str) -> Result<(), RegistryError> {
    add_member_at(&home()?, team, email)
}

/// Record `team` as the sole owner of `resource`. Idempotent.
///
/// Any other team's record of `resource` is dropped.
pub fn assign_resource_at(
    home: &Path,
    team: &TeamName,
    resource: &ResourceName,
) -> Result<(), RegistryError> {
    update_at(home, |registry| {
        registry.team_mut(team)?;
        for other in registry.teams.iter_mut().filter(|t| &t.name != team) {
            other.resources.retain(|r| r != resource);
        }
        let owner = registry.team_mut(team)?;
        if !owner.resources.contains(resource) {
            owner.resources.push(resource.clone());
        }
        Ok(())
    })
}

/// `assign_resource_at` convenience wrapper.
pub fn assign_resource(team: &TeamName, resource: &ResourceName) -> Result<(), RegistryError> {
    assign_resource_at(&home()?, team, resource)
}

/// Forget every ownership record of `resource`. Returns whether one existed.
pub fn release_resource_at(home: &Path, resource: &ResourceName) -> Result<bool, RegistryError> {
    update_at(home, |registry| {
        let mut released = false;
        for team in &mut registry.teams {
            let before = team.resources.len();
            team.resources.retain(|r| r != resource);
            released |= team.resources.len() != before;
        }
        Ok(released)
    })
}

/// `release_resource_at` convenience wrapper.
pub fn release_resource(resource: &ResourceName) -> Result<bool, RegistryError> {
    release_resource_at(&home()?, resource)
}

// ---------------------------------------------------------------------------
// AuthorizationGate
// ---------------------------------------------------------------------------

/// [`AuthorizationGate`] backed by `teams.yaml`.
///
/// The file is re-read on every check so edits take effect immediately.
#[derive(Debug, Clone)]
pub struct FileTeamRegistry {
    home: PathBuf,
}

impl FileTeamRegistry {
    pub fn at(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn new() -> Result<Self, RegistryError> {
        Ok(Self::at(home()?))
    }

    pub fn home(&self) -> &Path {
        &self.home
    }
}

#[async_trait]
impl AuthorizationGate for FileTeamRegistry {
    async fn authorize_team(&self, user: &User, team: &TeamName) -> Result<bool, BoxError> {
        let registry = load_teams_at_async(&self.home).await?;
        Ok(registry.is_member(team, &user.email))
    }

    async fn authorize_resource(
        &self,
        user: &User,
        name: &ResourceName,
    ) -> Result<bool, BoxError> {
        let registry = load_teams_at_async(&self.home).await?;
        Ok(registry.can_access(name, &user.email))
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

pub(crate) fn home() -> Result<PathBuf, RegistryError> {
    dirs::home_dir().ok_or(RegistryError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_home() -> TempDir {
        TempDir::new().expect("tempdir")
    }

    fn team() -> TeamName {
        TeamName::from("luizalabs")
    }

    #[test]
    fn teams_path_is_correct() {
        let home = make_home();
        assert!(teams_path_at(home.path()).ends_with(".shipyard/teams.yaml"));
    }

    #[test]
    fn missing_file_is_empty_registry() {
        let home = make_home();
        let registry = load_teams_at(home.path()).expect("load");
        assert_eq!(registry, TeamRegistry::default());
    }

    #[test]
    fn save_sets_file_permissions_and_removes_tmp() {
        let home = make_home();
        save_teams_at(home.path(), &TeamRegistry::default()).expect("save");
        let path = teams_path_at(home.path());
        assert!(path.exists());
        assert!(!path.with_file_name("teams.yaml.tmp").exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn create_team_twice_is_rejected() {
        let home = make_home();
        create_team_at(home.path(), team()).expect("first");
        let err = create_team_at(home.path(), team()).unwrap_err();
        assert!(matches!(err, RegistryError::TeamExists(ref n) if n == "luizalabs"));
    }

    #[test]
    fn add_member_to_unknown_team_fails() {
        let home = make_home();
        let err = add_member_at(home.path(), &team(), "gopher@luizalabs.com").unwrap_err();
        assert!(matches!(err, RegistryError::TeamNotFound(_)));
    }

    #[test]
    fn add_member_is_idempotent() {
        let home = make_home();
        create_team_at(home.path(), team()).unwrap();
        add_member_at(home.path(), &team(), "gopher@luizalabs.com").unwrap();
        add_member_at(home.path(), &team(), "gopher@luizalabs.com").unwrap();
        let registry = load_teams_at(home.path()).unwrap();
        assert_eq!(registry.team(&team()).unwrap().members.len(), 1);
    }

    #[test]
    fn release_resource_reports_whether_it_was_owned() {
        let home = make_home();
        create_team_at(home.path(), team()).unwrap();
        let res = ResourceName::from("teresa");
        assign_resource_at(home.path(), &team(), &res).unwrap();
        assert_eq!(
            load_teams_at(home.path()).unwrap().owner_of(&res),
            Some(&team())
        );
        assert!(release_resource_at(home.path(), &res).unwrap());
        assert!(!release_resource_at(home.path(), &res).unwrap());
        assert!(load_teams_at(home.path()).unwrap().owner_of(&res).is_none());
    }

    #[test]
    fn admins_can_access_everything() {
        let registry = TeamRegistry {
            admins: vec!["root@example.com".into()],
            teams: vec![],
        };
        assert!(registry.is_member(&team(), "root@example.com"));
        assert!(registry.can_access(&ResourceName::from("x"), "root@example.com"));
        assert!(!registry.is_member(&team(), "nobody@example.com"));
    }

    #[tokio::test]
    async fn gate_applies_membership_and_ownership() {
        let home = make_home();
        create_team_at(home.path(), team()).unwrap();
        add_member_at(home.path(), &team(), "gopher@luizalabs.com").unwrap();
        assign_resource_at(home.path(), &team(), &ResourceName::from("teresa")).unwrap();

        let gate = FileTeamRegistry::at(home.path());
        let member = User::new("gopher@luizalabs.com");
        let outsider = User::new("bad-user@luizalabs.com");

        assert!(gate.authorize_team(&member, &team()).await.unwrap());
        assert!(!gate.authorize_team(&outsider, &team()).await.unwrap());
        assert!(gate
            .authorize_resource(&member, &ResourceName::from("teresa"))
            .await
            .unwrap());
        assert!(!gate
            .authorize_resource(&member, &ResourceName::from("other"))
            .await
            .unwrap());
        assert!(!gate
            .authorize_resource(&outsider, &ResourceName::from("teresa"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn gate_denies_when_registry_file_is_missing() {
        let home = make_home();
        let gate = FileTeamRegistry::at(home.path());
        let user = User::new("gopher@luizalabs.com");
        assert!(!gate.authorize_team(&user, &team()).await.unwrap());
        assert!(!gate
            .authorize_resource(&user, &ResourceName::from("teresa"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn gate_surfaces_corrupt_registry_as_error() {
        let home = make_home();
        let dir = shipyard_dir_at(home.path());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("teams.yaml"), b"teams: [unclosed").unwrap();

        let gate = FileTeamRegistry::at(home.path());
        let err = gate
            .authorize_team(&User::new("a@b.c"), &team())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("teams.yaml"), "got: {err}");
    }
}
