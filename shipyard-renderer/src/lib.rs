//! # shipyard-renderer
//!
//! Template storage and rendering for Shipyard resources.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shipyard_core::{ResourceName, Setting};
//! use shipyard_renderer::{FsTemplateSource, TeraRenderer};
//!
//! async fn preview(root: &std::path::Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
//!     let source = FsTemplateSource::new(root);
//!     let template = source.open_manifest(&ResourceName::from("teresa")).await?;
//!     let mut out = Vec::new();
//!     TeraRenderer::new()
//!         .render_stream(&mut out, template, &[Setting::new("replicas", "2")])
//!         .await?;
//!     Ok(out)
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod source;

pub use context::TemplateContext;
pub use engine::TeraRenderer;
pub use error::{RenderError, SourceError};
pub use source::{FsTemplateSource, TemplateEntry};
