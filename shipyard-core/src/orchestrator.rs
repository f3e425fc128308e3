//! Provisioning and teardown of team resources.
//!
//! `create`: authorize → fetch both templates → create namespace → render
//! manifest → apply → render welcome. `delete`: authorize → delete namespace.
//! Steps run strictly in order, each at most once, with no retries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::collaborators::{
    AuthorizationGate, ClusterError, ClusterGateway, TemplateRenderer, TemplateSource,
    TemplateStream,
};
use crate::error::{BoxError, CallTimedOut, ResourceError, Step};
use crate::types::{validate_name, RenderedResource, Resource, ResourceName, Setting, User};

/// Tunables for [`Orchestrator`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Upper bound for every individual collaborator call.
    pub call_timeout: Option<Duration>,
    /// Delete the namespace again when a step after its creation fails.
    pub rollback_on_failure: bool,
}

/// Outcome of a bounded collaborator call that did not succeed.
enum CallError<E> {
    Failed(E),
    TimedOut(CallTimedOut),
}

impl CallError<BoxError> {
    fn into_internal(self, step: Step) -> ResourceError {
        match self {
            CallError::Failed(source) => ResourceError::Internal { step, source },
            CallError::TimedOut(t) => ResourceError::internal(step, t),
        }
    }
}

impl CallError<ClusterError> {
    fn into_internal(self, step: Step) -> ResourceError {
        match self {
            CallError::Failed(err) => ResourceError::Internal {
                step,
                source: err.into_inner(),
            },
            CallError::TimedOut(t) => ResourceError::internal(step, t),
        }
    }
}

/// Stateless provisioning service. Build once, clone freely, share across tasks.
#[derive(Clone)]
pub struct Orchestrator {
    source: Arc<dyn TemplateSource>,
    renderer: Arc<dyn TemplateRenderer>,
    cluster: Arc<dyn ClusterGateway>,
    auth: Arc<dyn AuthorizationGate>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn TemplateSource>,
        renderer: Arc<dyn TemplateRenderer>,
        cluster: Arc<dyn ClusterGateway>,
        auth: Arc<dyn AuthorizationGate>,
    ) -> Self {
        Orchestrator {
            source,
            renderer,
            cluster,
            auth,
            options: OrchestratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Provision `resource` on behalf of `user`.
    ///
    /// Returns [`ResourceError::PermissionDenied`] and
    /// [`ResourceError::AlreadyExists`] unwrapped; every other failure is
    /// [`ResourceError::Internal`] with the collaborator error as its source.
    #[instrument(skip_all, fields(resource = %resource.name, team = %resource.team_name))]
    pub async fn create(
        &self,
        user: &User,
        resource: &Resource,
    ) -> Result<RenderedResource, ResourceError> {
        let result = self.create_inner(user, resource).await;
        match &result {
            Ok(rendered) => info!(digest = %rendered.manifest_digest, "resource created"),
            Err(err) => log_failure("create", err),
        }
        result
    }

    /// Tear down the namespace named `name` on behalf of `user`.
    ///
    /// Returns [`ResourceError::PermissionDenied`] and
    /// [`ResourceError::NotFound`] unwrapped.
    #[instrument(skip_all, fields(resource = %name))]
    pub async fn delete(&self, user: &User, name: &ResourceName) -> Result<(), ResourceError> {
        let result = self.delete_inner(user, name).await;
        match &result {
            Ok(()) => info!("resource deleted"),
            Err(err) => log_failure("delete", err),
        }
        result
    }

    async fn create_inner(
        &self,
        user: &User,
        resource: &Resource,
    ) -> Result<RenderedResource, ResourceError> {
        validate_name(resource.name.as_str()).map_err(ResourceError::InvalidArgument)?;
        if resource.team_name.as_str().is_empty() {
            return Err(ResourceError::InvalidArgument(
                "team name must not be empty".to_string(),
            ));
        }

        let allowed = self
            .bounded(
                Step::Authorize,
                self.auth.authorize_team(user, &resource.team_name),
            )
            .await
            .map_err(|e| e.into_internal(Step::Authorize))?;
        if !allowed {
            return Err(ResourceError::PermissionDenied);
        }

        let template = self
            .bounded(Step::FetchTemplate, self.source.template(&resource.name))
            .await
            .map_err(|e| e.into_internal(Step::FetchTemplate))?;
        let welcome = self
            .bounded(
                Step::FetchWelcomeTemplate,
                self.source.welcome_template(&resource.name),
            )
            .await
            .map_err(|e| e.into_internal(Step::FetchWelcomeTemplate))?;

        let namespace = resource.name.as_str();
        match self
            .bounded(
                Step::CreateNamespace,
                self.cluster
                    .create_namespace(namespace, resource.team_name.as_str(), &user.email),
            )
            .await
        {
            Ok(()) => debug!(namespace, "namespace created"),
            Err(CallError::Failed(err)) if self.cluster.is_already_exists(&err) => {
                debug!(namespace, error = %err, "namespace create classified as conflict");
                return Err(ResourceError::AlreadyExists);
            }
            Err(err) => return Err(err.into_internal(Step::CreateNamespace)),
        }

        match self.provision(resource, template, welcome).await {
            Ok(rendered) => Ok(rendered),
            Err(err) => {
                if self.options.rollback_on_failure {
                    self.roll_back(namespace).await;
                } else {
                    warn!(
                        namespace,
                        "provisioning failed after namespace creation; namespace left in place"
                    );
                }
                Err(err)
            }
        }
    }

    /// Steps that run once the namespace exists.
    async fn provision(
        &self,
        resource: &Resource,
        template: TemplateStream,
        welcome: TemplateStream,
    ) -> Result<RenderedResource, ResourceError> {
        let namespace = resource.name.as_str();

        let manifest = self
            .render(Step::RenderManifest, template, &resource.settings)
            .await?;
        self.bounded(Step::ApplyManifest, self.cluster.apply(namespace, &manifest))
            .await
            .map_err(|e| e.into_internal(Step::ApplyManifest))?;
        debug!(namespace, bytes = manifest.len(), "manifest applied");

        let welcome = self
            .render(Step::RenderWelcome, welcome, &resource.settings)
            .await?;

        Ok(RenderedResource {
            name: resource.name.clone(),
            team_name: resource.team_name.clone(),
            manifest_digest: hex::encode(Sha256::digest(&manifest)),
            manifest: String::from_utf8_lossy(&manifest).into_owned(),
            welcome: String::from_utf8_lossy(&welcome).into_owned(),
            created_at: Utc::now(),
        })
    }

    async fn render(
        &self,
        step: Step,
        template: TemplateStream,
        settings: &[Setting],
    ) -> Result<Vec<u8>, ResourceError> {
        let mut out = Vec::new();
        self.bounded(step, self.renderer.execute(&mut out, template, settings))
            .await
            .map_err(|e| e.into_internal(step))?;
        Ok(out)
    }

    async fn roll_back(&self, namespace: &str) {
        match self
            .bounded(Step::DeleteNamespace, self.cluster.delete_namespace(namespace))
            .await
        {
            Ok(()) => info!(namespace, "namespace rolled back"),
            Err(CallError::Failed(err)) => {
                warn!(namespace, error = %err, "rollback failed; namespace left in place")
            }
            Err(CallError::TimedOut(err)) => {
                warn!(namespace, error = %err, "rollback failed; namespace left in place")
            }
        }
    }

    async fn delete_inner(&self, user: &User, name: &ResourceName) -> Result<(), ResourceError> {
        validate_name(name.as_str()).map_err(ResourceError::InvalidArgument)?;

        let allowed = self
            .bounded(Step::Authorize, self.auth.authorize_resource(user, name))
            .await
            .map_err(|e| e.into_internal(Step::Authorize))?;
        if !allowed {
            return Err(ResourceError::PermissionDenied);
        }

        match self
            .bounded(
                Step::DeleteNamespace,
                self.cluster.delete_namespace(name.as_str()),
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(CallError::Failed(err)) if self.cluster.is_not_found(&err) => {
                debug!(error = %err, "namespace delete classified as absent");
                Err(ResourceError::NotFound)
            }
            Err(err) => Err(err.into_internal(Step::DeleteNamespace)),
        }
    }

    /// Runs one collaborator call under the configured deadline.
    async fn bounded<T, E>(
        &self,
        step: Step,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, CallError<E>> {
        debug!(step = %step, "calling collaborator");
        let outcome = match self.options.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(CallError::TimedOut(CallTimedOut { step, limit })),
            },
            None => call.await,
        };
        outcome.map_err(CallError::Failed)
    }
}

fn log_failure(op: &str, err: &ResourceError) {
    match err {
        ResourceError::Internal { step, source } => {
            warn!(op, code = %err.code(), step = %step, error = %source, "operation failed")
        }
        other => warn!(op, code = %other.code(), "operation refused"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
