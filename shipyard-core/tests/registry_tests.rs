//! Team registry error-message, atomic-write-safety and ownership integration tests.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use shipyard_core::{
    registry::{self, TeamRegistry},
    RegistryError, ResourceName, TeamName,
};

fn team() -> TeamName {
    TeamName::from("luizalabs")
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".shipyard/teams.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = registry::load_teams_at(home.path()).unwrap_err();
    assert!(matches!(err, RegistryError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("teams.yaml"), "got: {err}");
}

#[test]
fn load_wrong_type_yaml_returns_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".shipyard/teams.yaml")
        .write_str("- this is a list, not a mapping\n")
        .expect("write");

    let err = registry::load_teams_at(home.path()).unwrap_err();
    assert!(matches!(err, RegistryError::Parse { .. }), "got: {err}");
}

#[test]
fn hand_written_file_is_accepted() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".shipyard/teams.yaml")
        .write_str(
            "admins: [root@example.com]\nteams:\n  - name: luizalabs\n    members: [gopher@luizalabs.com]\n    resources: [teresa]\n  - name: empty\n",
        )
        .expect("write");

    let reg = registry::load_teams_at(home.path()).expect("load");
    assert_eq!(reg.teams.len(), 2);
    assert!(reg.is_member(&team(), "gopher@luizalabs.com"));
    assert!(reg.can_access(&ResourceName::from("teresa"), "gopher@luizalabs.com"));
    assert!(reg.team(&TeamName::from("empty")).unwrap().members.is_empty());
}

// ---------------------------------------------------------------------------
// 2. Writes
// ---------------------------------------------------------------------------

#[test]
fn save_writes_readable_yaml_and_no_tmp() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::create_team_at(home.path(), team()).expect("create");
    registry::add_member_at(home.path(), &team(), "gopher@luizalabs.com").expect("member");

    home.child(".shipyard/teams.yaml")
        .assert(predicate::str::contains("gopher@luizalabs.com"));
    home.child(".shipyard/teams.yaml.tmp")
        .assert(predicate::path::missing());
}

#[test]
fn assign_then_release_roundtrip() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::create_team_at(home.path(), team()).expect("create");
    let res = ResourceName::from("teresa");

    registry::assign_resource_at(home.path(), &team(), &res).expect("assign");
    registry::assign_resource_at(home.path(), &team(), &res).expect("assign twice");
    let reg = registry::load_teams_at(home.path()).expect("load");
    assert_eq!(reg.team(&team()).unwrap().resources, vec![res.clone()]);

    assert!(registry::release_resource_at(home.path(), &res).expect("release"));
    assert_eq!(
        registry::load_teams_at(home.path()).expect("load"),
        TeamRegistry {
            admins: vec![],
            teams: vec![registry::Team {
                name: team(),
                members: vec![],
                resources: vec![],
            }],
        }
    );
}

#[test]
fn assign_to_unknown_team_fails() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err =
        registry::assign_resource_at(home.path(), &team(), &ResourceName::from("x")).unwrap_err();
    assert!(err.to_string().contains("team 'luizalabs' not found"));
}

#[test]
fn assign_makes_the_team_the_only_owner() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let other = TeamName::from("magalu");
    let res = ResourceName::from("teresa");
    registry::create_team_at(home.path(), team()).expect("create");
    registry::create_team_at(home.path(), other.clone()).expect("create other");
    registry::add_member_at(home.path(), &team(), "gopher@luizalabs.com").expect("member");

    registry::assign_resource_at(home.path(), &team(), &res).expect("assign");
    registry::assign_resource_at(home.path(), &other, &res).expect("reassign");

    let reg = registry::load_teams_at(home.path()).expect("load");
    assert_eq!(reg.owner_of(&res), Some(&other));
    assert!(reg.team(&team()).unwrap().resources.is_empty());
    assert!(!reg.can_access(&res, "gopher@luizalabs.com"));
}

#[test]
fn failed_assign_keeps_existing_owner() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let res = ResourceName::from("teresa");
    registry::create_team_at(home.path(), team()).expect("create");
    registry::assign_resource_at(home.path(), &team(), &res).expect("assign");

    registry::assign_resource_at(home.path(), &TeamName::from("ghost"), &res).unwrap_err();

    let reg = registry::load_teams_at(home.path()).expect("load");
    assert_eq!(reg.owner_of(&res), Some(&team()));
}
