//! Chat model seam
//!
//! Provider-neutral conversation types plus the `ChatModel` trait the agent
//! talks to. `GeminiClient` is the production implementation.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A file previously uploaded to the model service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Part {
    Text(String),
    File(FileRef),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

/// One message of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// Tool signature advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub turns: &'a [Turn],
    pub tools: &'a [FunctionDeclaration],
    pub temperature: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub parts: Vec<Part>,
}

impl ModelReply {
    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn into_turn(self) -> Turn {
        Turn {
            role: Role::Model,
            parts: self.parts,
        }
    }
}

/// Trait for the conversational model (LLM controlled)
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, request: &ChatRequest<'_>) -> Result<ModelReply>;
    async fn upload_file(&self, path: &Path) -> Result<FileRef>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_text_and_calls() {
        let reply = ModelReply {
            parts: vec![
                Part::Text("Готовлю ".to_string()),
                Part::FunctionCall(FunctionCall {
                    name: "generate_pdf_act".to_string(),
                    args: json!({}),
                }),
                Part::Text("акт".to_string()),
            ],
        };

        assert_eq!(reply.text(), "Готовлю акт");
        assert_eq!(reply.function_calls().len(), 1);
        assert_eq!(reply.into_turn().role, Role::Model);
    }
}
