//! Runtime configuration
//!
//! `AppConfig` is read from the environment once at startup (after `.env`
//! is loaded). Document paths travel as an explicit `DocumentConfig` into
//! every generation call.

use crate::error::AgentError;
use crate::models::DocumentKind;
use crate::Result;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TYPST_BIN: &str = "typst";
const DEFAULT_TYPST_ROOT: &str = "typst";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_REQUISITES_FILE: &str = "Карточка НТЦ Татнефть.pdf";
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Where one kind of document lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    pub kind: DocumentKind,
    /// Directory passed to `typst compile --root`
    pub root_dir: PathBuf,
    /// Template file name inside `root_dir`
    pub template: String,
    /// JSON data file name inside `root_dir`, read by the template
    pub output_json: String,
}

impl DocumentConfig {
    pub fn act(root_dir: impl Into<PathBuf>) -> Self {
        Self::for_kind(DocumentKind::Act, root_dir)
    }

    pub fn invoice(root_dir: impl Into<PathBuf>) -> Self {
        Self::for_kind(DocumentKind::Invoice, root_dir)
    }

    pub fn for_kind(kind: DocumentKind, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root_dir: root_dir.into(),
            template: format!("{}.typ", kind.as_str()),
            output_json: format!("{}.json", kind.as_str()),
        }
    }

    pub fn template_path(&self) -> PathBuf {
        self.root_dir.join(&self.template)
    }

    pub fn payload_path(&self) -> PathBuf {
        self.root_dir.join(&self.output_json)
    }

    /// typst writes `<template>.pdf` next to the template by default
    pub fn pdf_path(&self) -> PathBuf {
        self.template_path().with_extension("pdf")
    }
}

#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub program: String,
    pub root_dir: PathBuf,
    /// `None` waits for the compiler indefinitely
    pub timeout: Option<Duration>,
}

impl RendererConfig {
    pub fn document(&self, kind: DocumentKind) -> DocumentConfig {
        DocumentConfig::for_kind(kind, &self.root_dir)
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub renderer: RendererConfig,
    pub requisites_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = match get("TYPST_TIMEOUT_SECS") {
            Some(raw) => parse_number::<u64>("TYPST_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let temperature = match get("AGENT_TEMPERATURE") {
            Some(raw) => parse_number::<f32>("AGENT_TEMPERATURE", &raw)?,
            None => DEFAULT_TEMPERATURE,
        };

        Ok(Self {
            llm: LlmConfig {
                api_key: get("GEMINI_API_KEY").unwrap_or_default(),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature,
            },
            renderer: RendererConfig {
                program: get("TYPST_BIN").unwrap_or_else(|| DEFAULT_TYPST_BIN.to_string()),
                root_dir: get("TYPST_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| Path::new(DEFAULT_TYPST_ROOT).to_path_buf()),
                timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            },
            requisites_file: get("REQUISITES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REQUISITES_FILE)),
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AgentError::Config(format!("{} must be a number, got `{}`", key, raw)))
}
