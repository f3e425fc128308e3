//! Error types for shipyard-cluster.
//!
//! kube errors never cross the crate boundary: they are mapped to
//! [`ClusterApiError`] so the status code survives as plain data.

use shipyard_core::collaborators::ClusterError;
use thiserror::Error;

pub const CONFLICT: u16 = 409;
pub const NOT_FOUND: u16 = 404;

#[derive(Debug, Error)]
pub enum ClusterApiError {
    /// The API server answered with a non-success status.
    #[error("cluster API returned {code} ({reason}): {message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    /// The request never produced an API status (connection, TLS, decoding).
    #[error("cluster request failed: {0}")]
    Transport(#[source] Box<kube::Error>),

    /// Kind could not be resolved through API discovery.
    #[error("unknown resource type {api_version}/{kind}")]
    Discovery {
        api_version: String,
        kind: String,
        #[source]
        source: Box<kube::Error>,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl From<kube::Error> for ClusterApiError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(status) => ClusterApiError::Api {
                code: status.code,
                reason: status.reason.clone(),
                message: status.message.clone(),
            },
            other => ClusterApiError::Transport(Box::new(other)),
        }
    }
}

impl ClusterApiError {
    /// HTTP status of an API rejection, `None` for anything else.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClusterApiError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Problems with a rendered manifest, found before anything is sent.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest document {index} is not valid YAML: {source}")]
    Yaml {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("manifest document {index} is not a mapping")]
    NotAnObject { index: usize },

    #[error("manifest document {index} is missing {field}")]
    MissingField { index: usize, field: &'static str },
}

/// Error raised while building a client.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("failed to create cluster client: {0}")]
    Client(#[source] kube::Error),
}

/// True when `err` is an API conflict produced by this crate.
pub fn is_already_exists(err: &ClusterError) -> bool {
    status_of(err) == Some(CONFLICT)
}

/// True when `err` is an API not-found produced by this crate.
pub fn is_not_found(err: &ClusterError) -> bool {
    status_of(err) == Some(NOT_FOUND)
}

fn status_of(err: &ClusterError) -> Option<u16> {
    err.downcast_ref::<ClusterApiError>()
        .and_then(ClusterApiError::status_code)
}
