//! External renderer invocation
//!
//! The compiler reads the JSON data file by convention from its root
//! directory and writes the PDF next to the template.

use crate::config::{DocumentConfig, RendererConfig};
use crate::error::AgentError;
use crate::Result;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub pdf_path: PathBuf,
    pub elapsed_ms: u64,
}

/// Trait for turning a template plus its data file into a PDF
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, config: &DocumentConfig) -> Result<RenderedDocument>;
}

/// Runs `typst compile --root <root> <template>` as a child process
pub struct TypstRenderer {
    program: String,
    timeout: Option<Duration>,
}

impl TypstRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.program.clone()).with_timeout(config.timeout)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed after the program name
    pub fn command_args(config: &DocumentConfig) -> Vec<OsString> {
        vec![
            OsString::from("compile"),
            OsString::from("--root"),
            config.root_dir.clone().into_os_string(),
            config.template_path().into_os_string(),
        ]
    }
}

#[async_trait]
impl Renderer for TypstRenderer {
    async fn render(&self, config: &DocumentConfig) -> Result<RenderedDocument> {
        let start = Instant::now();

        let mut command = Command::new(&self.program);
        command
            .args(Self::command_args(config))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(
            kind = %config.kind,
            template = %config.template_path().display(),
            "Invoking renderer"
        );

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| {
                    error!(kind = %config.kind, "Renderer timed out");
                    AgentError::RenderTimeout(limit)
                })??,
            None => command.output().await?,
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(
                kind = %config.kind,
                status = %output.status,
                stderr = %stderr,
                "Renderer failed"
            );
            return Err(AgentError::RenderFailure {
                status: output.status.to_string(),
                stderr,
            });
        }

        let pdf_path = config.pdf_path();
        info!(
            kind = %config.kind,
            pdf = %pdf_path.display(),
            elapsed_ms,
            "Document rendered"
        );

        Ok(RenderedDocument {
            pdf_path,
            elapsed_ms,
        })
    }
}
