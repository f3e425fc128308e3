//! Error types for shipyard-core.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Opaque error returned by collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Provisioning taxonomy
// ---------------------------------------------------------------------------

/// Orchestrator step, recorded on internal errors for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Authorize,
    FetchTemplate,
    FetchWelcomeTemplate,
    CreateNamespace,
    RenderManifest,
    ApplyManifest,
    RenderWelcome,
    DeleteNamespace,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Authorize => "authorize",
            Step::FetchTemplate => "fetch_template",
            Step::FetchWelcomeTemplate => "fetch_welcome_template",
            Step::CreateNamespace => "create_namespace",
            Step::RenderManifest => "render_manifest",
            Step::ApplyManifest => "apply_manifest",
            Step::RenderWelcome => "render_welcome",
            Step::DeleteNamespace => "delete_namespace",
        };
        f.write_str(s)
    }
}

/// Stable, caller-facing error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidArgument,  // 400
    PermissionDenied, // 403
    NotFound,         // 404
    AlreadyExists,    // 409
    Internal,         // 500
}

impl ErrorCode {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidArgument => 400,
            ErrorCode::PermissionDenied => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::AlreadyExists => 409,
            ErrorCode::Internal => 500,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "InvalidArgument",
            ErrorCode::PermissionDenied => "PermissionDenied",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::AlreadyExists => "AlreadyExists",
            ErrorCode::Internal => "InternalServerError",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "invalid-argument",
            ErrorCode::PermissionDenied => "permission-denied",
            ErrorCode::NotFound => "not-found",
            ErrorCode::AlreadyExists => "already-exists",
            ErrorCode::Internal => "internal-server-error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every outcome `Orchestrator::create` / `Orchestrator::delete` can fail with.
///
/// `PermissionDenied`, `AlreadyExists` and `NotFound` are bare sentinels.
/// Everything else collapses into `Internal`, whose `source()` is the original
/// collaborator error.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("resource already exists")]
    AlreadyExists,

    #[error("resource not found")]
    NotFound,

    #[error("internal server error")]
    Internal {
        step: Step,
        #[source]
        source: BoxError,
    },
}

impl ResourceError {
    pub fn internal(step: Step, source: impl Into<BoxError>) -> Self {
        ResourceError::Internal {
            step,
            source: source.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ResourceError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            ResourceError::PermissionDenied => ErrorCode::PermissionDenied,
            ResourceError::AlreadyExists => ErrorCode::AlreadyExists,
            ResourceError::NotFound => ErrorCode::NotFound,
            ResourceError::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Step that failed, for internal errors.
    pub fn step(&self) -> Option<Step> {
        match self {
            ResourceError::Internal { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// True when the failure happened after the namespace was created, so it
    /// may still exist in the cluster.
    pub fn after_namespace_created(&self) -> bool {
        matches!(
            self.step(),
            Some(Step::RenderManifest | Step::ApplyManifest | Step::RenderWelcome)
        )
    }
}

/// Cause attached to internal errors when a collaborator exceeds its deadline.
#[derive(Debug, Error)]
#[error("{step} did not finish within {limit:?}")]
pub struct CallTimedOut {
    pub step: Step,
    pub limit: Duration,
}

// ---------------------------------------------------------------------------
// Team registry / configuration
// ---------------------------------------------------------------------------

/// All errors that can arise from team registry and config file operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("team '{0}' already exists")]
    TeamExists(String),

    #[error("team '{0}' not found")]
    TeamNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn internal_keeps_cause() {
        let err = ResourceError::internal(Step::ApplyManifest, "boom");
        assert_eq!(err.code(), ErrorCode::Internal);
        assert_eq!(err.step(), Some(Step::ApplyManifest));
        assert_eq!(err.to_string(), "internal server error");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("boom"));
    }

    #[test]
    fn sentinel_codes() {
        assert_eq!(ResourceError::PermissionDenied.code().status_code(), 403);
        assert_eq!(ResourceError::AlreadyExists.code().status_code(), 409);
        assert_eq!(ResourceError::NotFound.code().status_code(), 404);
        assert_eq!(ResourceError::NotFound.code().class_name(), "not-found");
        assert!(ResourceError::PermissionDenied.step().is_none());
    }

    #[test]
    fn only_post_creation_steps_leave_a_namespace() {
        for step in [Step::RenderManifest, Step::ApplyManifest, Step::RenderWelcome] {
            assert!(ResourceError::internal(step, "x").after_namespace_created());
        }
        for step in [
            Step::Authorize,
            Step::FetchTemplate,
            Step::FetchWelcomeTemplate,
            Step::CreateNamespace,
            Step::DeleteNamespace,
        ] {
            assert!(!ResourceError::internal(step, "x").after_namespace_created());
        }
        assert!(!ResourceError::AlreadyExists.after_namespace_created());
        assert!(!ResourceError::PermissionDenied.after_namespace_created());
    }

    #[test]
    fn timeout_message_names_step() {
        let err = CallTimedOut {
            step: Step::CreateNamespace,
            limit: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "create_namespace did not finish within 2s");
    }
}
