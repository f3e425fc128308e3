//! Tera rendering engine: [`TeraRenderer`].

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use shipyard_core::collaborators::{TemplateRenderer, TemplateStream};
use shipyard_core::error::BoxError;
use shipyard_core::types::Setting;

use crate::context::TemplateContext;
use crate::error::RenderError;

/// Tera-based renderer. Stateless; create once and share.
///
/// Autoescaping is off since the output is YAML or plain text, not HTML.
/// CRLF line endings are normalised to LF.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraRenderer;

impl TeraRenderer {
    pub fn new() -> Self {
        TeraRenderer
    }

    /// Render `source` against `settings`.
    pub fn render_str(&self, source: &str, settings: &[Setting]) -> Result<String, RenderError> {
        let ctx = TemplateContext::from_settings(settings).to_tera_context()?;
        let rendered = tera::Tera::one_off(source, &ctx, false)?;
        Ok(rendered.replace("\r\n", "\n"))
    }

    /// Drain `template`, render it, and write the result to `out`.
    pub async fn render_stream(
        &self,
        out: &mut (dyn AsyncWrite + Send + Unpin),
        mut template: TemplateStream,
        settings: &[Setting],
    ) -> Result<(), RenderError> {
        let mut raw = Vec::new();
        template.read_to_end(&mut raw).await?;
        drop(template);
        let source = String::from_utf8(raw)?;
        let rendered = self.render_str(&source, settings)?;
        out.write_all(rendered.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl TemplateRenderer for TeraRenderer {
    async fn execute(
        &self,
        out: &mut (dyn AsyncWrite + Send + Unpin),
        template: TemplateStream,
        settings: &[Setting],
    ) -> Result<(), BoxError> {
        self.render_stream(out, template, settings)
            .await
            .map_err(BoxError::from)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(body: &'static str) -> TemplateStream {
        Box::new(body.as_bytes())
    }

    #[test]
    fn render_str_substitutes_settings() {
        let out = TeraRenderer::new()
            .render_str(
                "replicas: {{ settings.replicas }}",
                &[Setting::new("replicas", "3")],
            )
            .expect("render");
        assert_eq!(out, "replicas: 3");
    }

    #[test]
    fn values_are_not_html_escaped() {
        let out = TeraRenderer::new()
            .render_str("url: {{ settings.url }}", &[Setting::new("url", "a&b<c>")])
            .expect("render");
        assert_eq!(out, "url: a&b<c>");
    }

    #[test]
    fn crlf_is_normalised() {
        let out = TeraRenderer::new()
            .render_str("a: 1\r\nb: {{ settings.b }}\r\n", &[Setting::new("b", "2")])
            .expect("render");
        assert!(!out.contains('\r'));
        assert_eq!(out, "a: 1\nb: 2\n");
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let err = TeraRenderer::new()
            .render_str("{{ settings.missing }}", &[])
            .unwrap_err();
        assert!(matches!(err, RenderError::Tera(_)));
    }

    #[tokio::test]
    async fn execute_writes_to_output() {
        let mut out = Vec::new();
        TeraRenderer::new()
            .execute(
                &mut out,
                stream("{% for s in settings_list %}{{ s.key }}={{ s.value }};{% endfor %}"),
                &[Setting::new("k", "1"), Setting::new("k", "2")],
            )
            .await
            .expect("execute");
        assert_eq!(String::from_utf8(out).unwrap(), "k=1;k=2;");
    }

    #[tokio::test]
    async fn execute_rejects_non_utf8_templates() {
        const NOT_UTF8: &[u8] = &[0xff, 0xfe];
        let mut out = Vec::new();
        let err = TeraRenderer::new()
            .execute(&mut out, Box::new(NOT_UTF8), &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("UTF-8"), "got: {err}");
        assert!(out.is_empty());
    }
}
