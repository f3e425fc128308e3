//! Domain types for resource provisioning.
//!
//! A [`Resource`] is built once per request from a [`CreateRequest`] and lives
//! only for the duration of one `create` call. The durable state is the
//! cluster namespace named after [`Resource::name`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a resource. Doubles as the namespace name inside the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceName(pub String);

impl ResourceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ResourceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of the team a resource belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamName(pub String);

impl TeamName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TeamName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TeamName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A key/value pair substituted into a template at render time.
///
/// No uniqueness is enforced: duplicates are kept in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Caller identity, owned by the identity subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// A team-scoped, templated add-on to be instantiated as a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: ResourceName,
    pub team_name: TeamName,
    #[serde(default)]
    pub settings: Vec<Setting>,
}

/// Result of a successful provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedResource {
    pub name: ResourceName,
    pub team_name: TeamName,
    /// Manifest as applied to the namespace.
    pub manifest: String,
    /// Rendered welcome template, meant for display to the caller.
    pub welcome: String,
    /// Lowercase hex SHA-256 of `manifest`.
    pub manifest_digest: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Inbound wire object
// ---------------------------------------------------------------------------

/// Setting as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSetting {
    pub key: String,
    pub value: String,
}

/// Inbound creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub team_name: String,
    #[serde(default)]
    pub settings: Vec<RequestSetting>,
}

impl From<RequestSetting> for Setting {
    fn from(s: RequestSetting) -> Self {
        Setting {
            key: s.key,
            value: s.value,
        }
    }
}

impl From<CreateRequest> for Resource {
    fn from(req: CreateRequest) -> Self {
        Resource {
            name: ResourceName(req.name),
            team_name: TeamName(req.team_name),
            settings: req.settings.into_iter().map(Setting::from).collect(),
        }
    }
}

impl From<&CreateRequest> for Resource {
    fn from(req: &CreateRequest) -> Self {
        Resource::from(req.clone())
    }
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

/// Maximum length of a DNS-1123 label.
pub const MAX_NAME_LEN: usize = 63;

/// Checks that `name` is usable verbatim as a namespace name.
///
/// Returns a human-readable reason on failure.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!(
            "name '{name}' is longer than {MAX_NAME_LEN} characters"
        ));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(format!(
            "name '{name}' may only contain lowercase letters, digits and '-'"
        ));
    }
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let bytes = name.as_bytes();
    if !alnum(bytes[0]) || !alnum(bytes[bytes.len() - 1]) {
        return Err(format!(
            "name '{name}' must start and end with a letter or digit"
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
