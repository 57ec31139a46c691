//! Error types for the billing document agent

use std::time::Duration;
use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {

    // =============================
    // Document Generation Errors
    // =============================

    #[error("Renderer exited with {status}: {stderr}")]
    RenderFailure { status: String, stderr: String },

    #[error("Renderer did not finish within {0:?}")]
    RenderTimeout(Duration),

    // =============================
    // Tool Boundary Errors
    // =============================

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    // =============================
    // Conversation Errors
    // =============================

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Tool loop exceeded {0} rounds without a final answer")]
    ToolLoopExceeded(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
