//! Billing Document Agent
//!
//! A conversational assistant that:
//! - Collects customer requisites and line items through a chat
//! - Lets the model call `generate_pdf_act` / `generate_pdf_invoice`
//! - Writes the document data as JSON next to a typst template
//! - Runs `typst compile` to produce the PDF
//!
//! FLOW:
//! USER → AGENT → MODEL → TOOL → JSON + TYPST → PDF

pub mod agent;
pub mod config;
pub mod document;
pub mod error;
pub mod gemini;
pub mod llm;
pub mod models;
pub mod session;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::BillingAgent;
pub use error::AgentError;
