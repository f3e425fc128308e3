//! Collaborator contracts consumed by the [`Orchestrator`](crate::Orchestrator).
//!
//! Each trait has one production implementation in a sibling crate and one
//! in-memory fake in [`crate::testing`].

use std::fmt;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::BoxError;
use crate::types::{ResourceName, Setting, TeamName, User};

/// A template byte stream. Dropping it releases the underlying handle.
pub type TemplateStream = Box<dyn AsyncRead + Send + Unpin>;

/// Supplies the raw templates for a named resource.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Main manifest template.
    async fn template(&self, name: &ResourceName) -> Result<TemplateStream, BoxError>;

    /// Onboarding text shown to the caller after provisioning.
    async fn welcome_template(&self, name: &ResourceName) -> Result<TemplateStream, BoxError>;
}

/// Merges a template with settings.
///
/// Implementations must be deterministic: identical template bytes and an
/// identical ordered list of settings produce identical output.
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn execute(
        &self,
        out: &mut (dyn AsyncWrite + Send + Unpin),
        template: TemplateStream,
        settings: &[Setting],
    ) -> Result<(), BoxError>;
}

/// Answers whether a user may act for a team or on a resource.
///
/// `Ok(false)` is a denial; `Err` means the question could not be answered.
#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    async fn authorize_team(&self, user: &User, team: &TeamName) -> Result<bool, BoxError>;

    /// Team ownership of `name` is resolved by the implementation.
    async fn authorize_resource(&self, user: &User, name: &ResourceName)
        -> Result<bool, BoxError>;
}

/// Namespace lifecycle and manifest application against a cluster.
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// Creates `namespace`, labelled with the owning team and the creating user.
    async fn create_namespace(
        &self,
        namespace: &str,
        team: &str,
        user_identifier: &str,
    ) -> Result<(), ClusterError>;

    /// Applies a rendered manifest into an existing namespace.
    async fn apply(&self, namespace: &str, manifest: &[u8]) -> Result<(), ClusterError>;

    async fn delete_namespace(&self, namespace: &str) -> Result<(), ClusterError>;

    /// True when `err` means the object already exists. Never panics.
    fn is_already_exists(&self, err: &ClusterError) -> bool;

    /// True when `err` means the object does not exist. Never panics.
    fn is_not_found(&self, err: &ClusterError) -> bool;
}

/// Opaque cluster failure.
///
/// Gateways wrap their own error type; only the gateway that produced it
/// knows how to look inside (see [`ClusterError::downcast_ref`]).
pub struct ClusterError(BoxError);

impl ClusterError {
    pub fn new(err: impl Into<BoxError>) -> Self {
        ClusterError(err.into())
    }

    pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

impl fmt::Debug for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
