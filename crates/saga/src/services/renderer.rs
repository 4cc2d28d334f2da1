//! Document rendering contract.

use std::str::FromStr;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::TransactionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Output formats the rendering engines support (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Odt,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Odt => "odt",
        }
    }

    /// MIME type for HTTP responses carrying a rendered document.
    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Odt => "application/vnd.oasis.opendocument.text",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "odt" => Ok(DocumentFormat::Odt),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Rendering failures. `UnsupportedFormat` is non-retryable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("formato no soportado: {0}")]
    UnsupportedFormat(String),

    #[error("plantilla '{template}' inválida: {reason}")]
    Template { template: String, reason: String },

    #[error("error del motor de renderizado: {0}")]
    Engine(String),
}

/// Data handed to a rendering engine.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    pub alumno: Value,
    pub especialidad: Value,
    pub tipo_documento: String,
    pub transaction_id: TransactionId,
}

/// A rendering engine producing a document blob for a template + context.
///
/// Concrete PDF/DOCX/ODT engines live outside this crate; the orchestrator
/// only depends on this contract.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(
        &self,
        format: DocumentFormat,
        template: &str,
        context: &RenderContext,
    ) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Default)]
struct RendererState {
    render_count: u32,
    fail_reason: Option<String>,
    last_template: Option<String>,
}

/// In-memory renderer for testing. Produces the serialized context as the
/// document body.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRenderer {
    state: Arc<RwLock<RendererState>>,
}

impl InMemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent render fail with an engine error.
    pub fn set_fail_on_render(&self, reason: Option<&str>) {
        self.state.write().unwrap().fail_reason = reason.map(str::to_string);
    }

    /// Returns how many documents were rendered.
    pub fn render_count(&self) -> u32 {
        self.state.read().unwrap().render_count
    }

    /// Returns the template used by the most recent render call.
    pub fn last_template(&self) -> Option<String> {
        self.state.read().unwrap().last_template.clone()
    }
}

#[async_trait]
impl DocumentRenderer for InMemoryRenderer {
    async fn render(
        &self,
        format: DocumentFormat,
        template: &str,
        context: &RenderContext,
    ) -> Result<Vec<u8>, RenderError> {
        let mut state = self.state.write().unwrap();
        state.last_template = Some(template.to_string());

        if let Some(reason) = &state.fail_reason {
            return Err(RenderError::Engine(reason.clone()));
        }

        state.render_count += 1;
        let body = serde_json::json!({
            "format": format.as_str(),
            "template": template,
            "context": context,
        });
        Ok(body.to_string().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_parsing_is_case_insensitive() {
        assert_eq!("pdf".parse::<DocumentFormat>().unwrap(), DocumentFormat::Pdf);
        assert_eq!(
            "DOCX".parse::<DocumentFormat>().unwrap(),
            DocumentFormat::Docx
        );
        assert_eq!("Odt".parse::<DocumentFormat>().unwrap(), DocumentFormat::Odt);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = "xlsx".parse::<DocumentFormat>().unwrap_err();
        assert_eq!(err, RenderError::UnsupportedFormat("xlsx".to_string()));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(DocumentFormat::Pdf.mime_type(), "application/pdf");
        assert!(DocumentFormat::Docx.mime_type().contains("wordprocessingml"));
        assert!(DocumentFormat::Odt.mime_type().contains("opendocument"));
    }

    fn make_context() -> RenderContext {
        RenderContext {
            alumno: json!({"nombre": "ANA"}),
            especialidad: json!({"nombre": "Ingeniería Química"}),
            tipo_documento: "CERTIFICADO_REGULAR".to_string(),
            transaction_id: TransactionId::new(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_renderer_produces_bytes() {
        let renderer = InMemoryRenderer::new();
        let bytes = renderer
            .render(
                DocumentFormat::Pdf,
                "certificado_regular.html",
                &make_context(),
            )
            .await
            .unwrap();

        assert!(!bytes.is_empty());
        assert_eq!(renderer.render_count(), 1);
        assert_eq!(
            renderer.last_template().as_deref(),
            Some("certificado_regular.html")
        );
    }

    #[tokio::test]
    async fn test_in_memory_renderer_can_fail() {
        let renderer = InMemoryRenderer::new();
        renderer.set_fail_on_render(Some("sin memoria"));

        let err = renderer
            .render(DocumentFormat::Pdf, "certificado_regular.html", &make_context())
            .await
            .unwrap_err();
        assert_eq!(err, RenderError::Engine("sin memoria".to_string()));
        assert_eq!(renderer.render_count(), 0);
    }
}
