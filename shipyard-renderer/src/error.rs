//! Error types for shipyard-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Reading the template stream or writing the output failed.
    #[error("template stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// Template bytes are not UTF-8.
    #[error("template is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// All errors that can arise from locating templates on disk.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no {kind} template for resource '{name}' (expected {path})")]
    TemplateNotFound {
        name: String,
        kind: &'static str,
        path: PathBuf,
    },

    /// Filesystem error while opening or listing templates.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SourceError {
    SourceError::Io {
        path: path.into(),
        source,
    }
}
