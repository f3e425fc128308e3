//! Shipyard core library: domain types, error taxonomy, collaborator
//! contracts and the provisioning [`Orchestrator`].
//!
//! Public API surface:
//! - [`types`]: request/resource structs and name validation
//! - [`error`]: [`ResourceError`], [`ErrorCode`], [`RegistryError`]
//! - [`collaborators`]: template, renderer, cluster and authorization traits
//! - [`orchestrator`]: create / delete sequencing
//! - [`registry`]: file-backed teams, the production authorization gate
//! - [`config`]: `~/.shipyard/config.yaml`

pub mod collaborators;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod registry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use collaborators::{
    AuthorizationGate, ClusterError, ClusterGateway, TemplateRenderer, TemplateSource,
    TemplateStream,
};
pub use config::Config;
pub use error::{BoxError, CallTimedOut, ErrorCode, RegistryError, ResourceError, Step};
pub use orchestrator::{Orchestrator, OrchestratorOptions};
pub use registry::FileTeamRegistry;
pub use types::{
    CreateRequest, RenderedResource, RequestSetting, Resource, ResourceName, Setting, TeamName,
    User,
};
