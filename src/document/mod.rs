//! Document generation
//!
//! Writes the JSON data file for an act or invoice, then runs the external
//! renderer against the matching template. Generation is all-or-nothing per
//! call; a failed render leaves the freshly written JSON in place.

pub mod payload;
pub mod render;

pub use payload::write_payload;
pub use render::{RenderedDocument, Renderer, TypstRenderer};

use crate::config::{DocumentConfig, RendererConfig};
use crate::models::{Customer, DocumentKind, Job};
use crate::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub kind: DocumentKind,
    pub payload_path: PathBuf,
    pub pdf_path: PathBuf,
}

/// Serializer + renderer for both document kinds
pub struct DocumentGenerator {
    act: DocumentConfig,
    invoice: DocumentConfig,
    renderer: Arc<dyn Renderer>,
}

impl DocumentGenerator {
    pub fn new(act: DocumentConfig, invoice: DocumentConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            act,
            invoice,
            renderer,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(
            config.document(DocumentKind::Act),
            config.document(DocumentKind::Invoice),
            Arc::new(TypstRenderer::from_config(config)),
        )
    }

    pub fn config(&self, kind: DocumentKind) -> &DocumentConfig {
        match kind {
            DocumentKind::Act => &self.act,
            DocumentKind::Invoice => &self.invoice,
        }
    }

    pub async fn generate(
        &self,
        kind: DocumentKind,
        customer: &Customer,
        jobs: &[Job],
    ) -> Result<GeneratedDocument> {
        let config = self.config(kind);

        let payload_path = write_payload(config, customer, jobs).await?;
        let rendered = self.renderer.render(config).await?;

        info!(
            kind = %kind,
            customer = %customer.name,
            jobs = jobs.len(),
            "Document generated"
        );

        Ok(GeneratedDocument {
            kind,
            payload_path,
            pdf_path: rendered.pdf_path,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::AgentError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every render request; fails when `fail_with` is set
    #[derive(Default)]
    pub struct RecordingRenderer {
        pub calls: Mutex<Vec<PathBuf>>,
        pub fail_with: Option<String>,
    }

    impl RecordingRenderer {
        pub fn failing(stderr: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some(stderr.to_string()),
            }
        }

        pub fn templates(&self) -> Vec<PathBuf> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Renderer for RecordingRenderer {
        async fn render(&self, config: &DocumentConfig) -> Result<RenderedDocument> {
            self.calls.lock().unwrap().push(config.template_path());

            if let Some(stderr) = &self.fail_with {
                return Err(AgentError::RenderFailure {
                    status: "exit status: 1".to_string(),
                    stderr: stderr.clone(),
                });
            }

            Ok(RenderedDocument {
                pdf_path: config.pdf_path(),
                elapsed_ms: 0,
            })
        }
    }
}
