//! [`KubeGateway`]: the production [`ClusterGateway`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, DynamicObject, Patch, PatchParams, PostParams};
use kube::config::{Config, KubeConfigOptions};
use kube::discovery::{oneshot::pinned_kind, Scope};
use kube::Client;
use tracing::{debug, info, instrument};

use shipyard_core::collaborators::{ClusterError, ClusterGateway};

use crate::error::{self, ClusterApiError, ConnectError};
use crate::manifest::{parse_documents, ManifestObject};

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "shipyard";
pub const TEAM_LABEL: &str = "shipyard.io/team";
pub const CREATED_BY_ANNOTATION: &str = "shipyard.io/created-by";

#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    field_manager: String,
}

impl KubeGateway {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        KubeGateway {
            client,
            field_manager: field_manager.into(),
        }
    }

    /// Build a client from the local kubeconfig; `context` selects a
    /// non-current context.
    pub async fn connect(
        context: Option<&str>,
        field_manager: impl Into<String>,
    ) -> Result<Self, ConnectError> {
        let client = match context {
            None => Client::try_default().await.map_err(ConnectError::Client)?,
            Some(name) => {
                debug!(context = %name, "using kubeconfig context");
                let config = Config::from_kubeconfig(&KubeConfigOptions {
                    context: Some(name.to_string()),
                    ..Default::default()
                })
                .await?;
                Client::try_from(config).map_err(ConnectError::Client)?
            }
        };
        Ok(KubeGateway::new(client, field_manager))
    }

    pub fn field_manager(&self) -> &str {
        &self.field_manager
    }

    async fn apply_object(
        &self,
        namespace: &str,
        mut object: ManifestObject,
    ) -> Result<(), ClusterApiError> {
        let gvk = object.gvk();
        let (resource, caps) =
            pinned_kind(&self.client, &gvk)
                .await
                .map_err(|source| ClusterApiError::Discovery {
                    api_version: object.api_version.clone(),
                    kind: object.kind.clone(),
                    source: Box::new(source),
                })?;

        let api: Api<DynamicObject> = match caps.scope {
            Scope::Namespaced => {
                object.set_namespace(namespace);
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
            Scope::Cluster => Api::all_with(self.client.clone(), &resource),
        };

        let params = PatchParams::apply(&self.field_manager).force();
        api.patch(&object.name, &params, &Patch::Apply(&object.body))
            .await?;
        debug!(kind = %object.kind, name = %object.name, "applied");
        Ok(())
    }
}

/// The namespace object sent on creation.
pub fn namespace_object(namespace: &str, team: &str, user_identifier: &str) -> Namespace {
    let labels = BTreeMap::from([
        (MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string()),
        (TEAM_LABEL.to_string(), team.to_string()),
    ]);
    let annotations = BTreeMap::from([(
        CREATED_BY_ANNOTATION.to_string(),
        user_identifier.to_string(),
    )]);
    Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.to_string()),
            labels: Some(labels),
            annotations: Some(annotations),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    #[instrument(skip(self))]
    async fn create_namespace(
        &self,
        namespace: &str,
        team: &str,
        user_identifier: &str,
    ) -> Result<(), ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        api.create(
            &PostParams::default(),
            &namespace_object(namespace, team, user_identifier),
        )
        .await
        .map_err(|e| ClusterError::new(ClusterApiError::from(e)))?;
        info!(namespace, "namespace created");
        Ok(())
    }

    #[instrument(skip(self, manifest), fields(bytes = manifest.len()))]
    async fn apply(&self, namespace: &str, manifest: &[u8]) -> Result<(), ClusterError> {
        let objects = parse_documents(manifest)
            .map_err(|e| ClusterError::new(ClusterApiError::from(e)))?;
        debug!(objects = objects.len(), "manifest parsed");
        for object in objects {
            self.apply_object(namespace, object)
                .await
                .map_err(ClusterError::new)?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_namespace(&self, namespace: &str) -> Result<(), ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        api.delete(namespace, &DeleteParams::default())
            .await
            .map_err(|e| ClusterError::new(ClusterApiError::from(e)))?;
        info!(namespace, "namespace deletion requested");
        Ok(())
    }

    fn is_already_exists(&self, err: &ClusterError) -> bool {
        error::is_already_exists(err)
    }

    fn is_not_found(&self, err: &ClusterError) -> bool {
        error::is_not_found(err)
    }
}
