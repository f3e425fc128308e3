//! Filesystem template source: [`FsTemplateSource`].
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<name>/manifest.yaml.tera
//! <root>/<name>/welcome.txt.tera
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use shipyard_core::collaborators::{TemplateSource, TemplateStream};
use shipyard_core::error::BoxError;
use shipyard_core::types::ResourceName;

use crate::error::{io_err, SourceError};

pub const MANIFEST_FILE: &str = "manifest.yaml.tera";
pub const WELCOME_FILE: &str = "welcome.txt.tera";

/// One resource directory found by [`FsTemplateSource::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateEntry {
    pub name: String,
    pub has_manifest: bool,
    pub has_welcome: bool,
}

impl TemplateEntry {
    /// Both templates are present, so `create` can use it.
    pub fn is_complete(&self) -> bool {
        self.has_manifest && self.has_welcome
    }
}

#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    root: PathBuf,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsTemplateSource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<name>/manifest.yaml.tera`: pure, no I/O.
    pub fn manifest_path(&self, name: &ResourceName) -> PathBuf {
        self.root.join(name.as_str()).join(MANIFEST_FILE)
    }

    /// `<root>/<name>/welcome.txt.tera`: pure, no I/O.
    pub fn welcome_path(&self, name: &ResourceName) -> PathBuf {
        self.root.join(name.as_str()).join(WELCOME_FILE)
    }

    pub async fn open_manifest(&self, name: &ResourceName) -> Result<TemplateStream, SourceError> {
        open(name, "manifest", self.manifest_path(name)).await
    }

    pub async fn open_welcome(&self, name: &ResourceName) -> Result<TemplateStream, SourceError> {
        open(name, "welcome", self.welcome_path(name)).await
    }

    /// Every resource directory under the root, sorted by name.
    ///
    /// A missing root yields an empty list. Plain files and hidden
    /// directories at the top level are ignored.
    pub fn list(&self) -> Result<Vec<TemplateEntry>, SourceError> {
        if !self.root.exists() {
            return Ok(vec![]);
        }
        let entries = std::fs::read_dir(&self.root).map_err(|e| io_err(&self.root, e))?;
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.root, e))?;
            let path = entry.path();
            let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
            if !meta.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            out.push(TemplateEntry {
                has_manifest: path.join(MANIFEST_FILE).is_file(),
                has_welcome: path.join(WELCOME_FILE).is_file(),
                name,
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

async fn open(
    name: &ResourceName,
    kind: &'static str,
    path: PathBuf,
) -> Result<TemplateStream, SourceError> {
    debug!(resource = %name, kind, path = %path.display(), "opening template");
    match tokio::fs::File::open(&path).await {
        Ok(file) => Ok(Box::new(file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SourceError::TemplateNotFound {
            name: name.to_string(),
            kind,
            path,
        }),
        Err(e) => Err(io_err(path, e)),
    }
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn template(&self, name: &ResourceName) -> Result<TemplateStream, BoxError> {
        Ok(self.open_manifest(name).await?)
    }

    async fn welcome_template(&self, name: &ResourceName) -> Result<TemplateStream, BoxError> {
        Ok(self.open_welcome(name).await?)
    }
}
