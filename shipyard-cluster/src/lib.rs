//! # shipyard-cluster
//!
//! Kubernetes implementation of the Shipyard cluster gateway: namespace
//! lifecycle plus server-side apply of rendered manifests.

pub mod error;
pub mod gateway;
pub mod manifest;

pub use error::{ClusterApiError, ConnectError, ManifestError};
pub use gateway::KubeGateway;
pub use manifest::{parse_documents, ManifestObject};
