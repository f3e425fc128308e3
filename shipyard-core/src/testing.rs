//! In-memory collaborator fakes.
//!
//! Available under `cfg(test)` and with the `testing` feature. Every fake is
//! configured through public fields, so a test states exactly which call fails.

use std::collections::{HashMap, HashSet};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};

use crate::collaborators::{
    AuthorizationGate, ClusterError, ClusterGateway, TemplateRenderer, TemplateSource,
    TemplateStream,
};
use crate::error::BoxError;
use crate::types::{ResourceName, Setting, TeamName, User};

async fn pause(delay: Option<Duration>) {
    if let Some(d) = delay {
        tokio::time::sleep(d).await;
    }
}

// ---------------------------------------------------------------------------
// Template source
// ---------------------------------------------------------------------------

/// Stream that decrements a shared counter when dropped.
struct TrackedStream {
    inner: io::Cursor<Vec<u8>>,
    open: Arc<AtomicUsize>,
}

impl AsyncRead for TrackedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeTemplateSource {
    pub err: Option<String>,
    pub welcome_err: Option<String>,
    pub template_body: String,
    pub welcome_body: String,
    pub delay: Option<Duration>,
    /// Streams handed out and not yet dropped.
    pub open: Arc<AtomicUsize>,
}

impl FakeTemplateSource {
    /// Streams handed out and not yet dropped.
    pub fn open_streams(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn stream(&self, body: &str) -> TemplateStream {
        self.open.fetch_add(1, Ordering::SeqCst);
        Box::new(TrackedStream {
            inner: io::Cursor::new(body.as_bytes().to_vec()),
            open: Arc::clone(&self.open),
        })
    }
}

#[async_trait]
impl TemplateSource for FakeTemplateSource {
    async fn template(&self, _name: &ResourceName) -> Result<TemplateStream, BoxError> {
        pause(self.delay).await;
        match &self.err {
            Some(msg) => Err(msg.clone().into()),
            None => Ok(self.stream(&self.template_body)),
        }
    }

    async fn welcome_template(&self, _name: &ResourceName) -> Result<TemplateStream, BoxError> {
        match &self.welcome_err {
            Some(msg) => Err(msg.clone().into()),
            None => Ok(self.stream(&self.welcome_body)),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

pub const FAKE_REPRESENTATION: &str = "Test Representation";

/// Drains the template and writes [`FAKE_REPRESENTATION`], then fails if `err` is set.
///
/// With `fail_on_call: Some(n)` only the n-th invocation (1-based) fails, so
/// `Some(2)` lets the manifest render pass and fails the welcome render.
#[derive(Default)]
pub struct FakeRenderer {
    pub err: Option<String>,
    pub fail_on_call: Option<usize>,
    pub delay: Option<Duration>,
    pub invocations: AtomicUsize,
}

impl FakeRenderer {
    pub fn calls(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TemplateRenderer for FakeRenderer {
    async fn execute(
        &self,
        out: &mut (dyn AsyncWrite + Send + Unpin),
        mut template: TemplateStream,
        _settings: &[Setting],
    ) -> Result<(), BoxError> {
        let call = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        pause(self.delay).await;
        let mut sink = Vec::new();
        template.read_to_end(&mut sink).await?;
        out.write_all(FAKE_REPRESENTATION.as_bytes()).await?;
        let fails = self.fail_on_call.map_or(true, |n| n == call);
        match &self.err {
            Some(msg) if fails => Err(msg.clone().into()),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Cluster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    CreateNamespace {
        namespace: String,
        team: String,
        user: String,
    },
    Apply {
        namespace: String,
        manifest: String,
    },
    DeleteNamespace {
        namespace: String,
    },
}

/// Cluster fake. The predicates answer with `already_exists` / `not_found`
/// whatever error they are handed.
#[derive(Default)]
pub struct FakeCluster {
    pub create_namespace_err: Option<String>,
    pub apply_err: Option<String>,
    pub delete_namespace_err: Option<String>,
    pub already_exists: bool,
    pub not_found: bool,
    pub delay: Option<Duration>,
    pub log: Mutex<Vec<ClusterCall>>,
}

impl FakeCluster {
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.log.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: ClusterCall) {
        if let Ok(mut calls) = self.log.lock() {
            calls.push(call);
        }
    }

    fn outcome(err: &Option<String>) -> Result<(), ClusterError> {
        match err {
            Some(msg) => Err(ClusterError::new(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ClusterGateway for FakeCluster {
    async fn create_namespace(
        &self,
        namespace: &str,
        team: &str,
        user_identifier: &str,
    ) -> Result<(), ClusterError> {
        self.record(ClusterCall::CreateNamespace {
            namespace: namespace.to_string(),
            team: team.to_string(),
            user: user_identifier.to_string(),
        });
        pause(self.delay).await;
        Self::outcome(&self.create_namespace_err)
    }

    async fn apply(&self, namespace: &str, manifest: &[u8]) -> Result<(), ClusterError> {
        self.record(ClusterCall::Apply {
            namespace: namespace.to_string(),
            manifest: String::from_utf8_lossy(manifest).into_owned(),
        });
        Self::outcome(&self.apply_err)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<(), ClusterError> {
        self.record(ClusterCall::DeleteNamespace {
            namespace: namespace.to_string(),
        });
        pause(self.delay).await;
        Self::outcome(&self.delete_namespace_err)
    }

    fn is_already_exists(&self, _err: &ClusterError) -> bool {
        self.already_exists
    }

    fn is_not_found(&self, _err: &ClusterError) -> bool {
        self.not_found
    }
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// Team membership fake.
///
/// Team checks require explicit membership. Resource checks allow everyone
/// except users registered with [`FakeTeams::deny_resources_for`].
#[derive(Default)]
pub struct FakeTeams {
    pub err: Option<String>,
    pub members: Mutex<HashMap<String, HashSet<String>>>,
    pub resource_denied: Mutex<HashSet<String>>,
}

impl FakeTeams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(self, team: &str, email: &str) -> Self {
        if let Ok(mut members) = self.members.lock() {
            members
                .entry(team.to_string())
                .or_default()
                .insert(email.to_string());
        }
        self
    }

    pub fn deny_resources_for(self, email: &str) -> Self {
        if let Ok(mut denied) = self.resource_denied.lock() {
            denied.insert(email.to_string());
        }
        self
    }

    fn failure(&self) -> Result<(), BoxError> {
        match &self.err {
            Some(msg) => Err(msg.clone().into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthorizationGate for FakeTeams {
    async fn authorize_team(&self, user: &User, team: &TeamName) -> Result<bool, BoxError> {
        self.failure()?;
        let members = self.members.lock().map_err(|e| e.to_string())?;
        Ok(members
            .get(team.as_str())
            .is_some_and(|m| m.contains(&user.email)))
    }

    async fn authorize_resource(
        &self,
        user: &User,
        _name: &ResourceName,
    ) -> Result<bool, BoxError> {
        self.failure()?;
        let denied = self.resource_denied.lock().map_err(|e| e.to_string())?;
        Ok(!denied.contains(&user.email))
    }
}
