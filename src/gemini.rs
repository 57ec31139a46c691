//! Gemini API client
//!
//! Implements `ChatModel` over the `generateContent` REST endpoint with
//! function calling, plus the media upload endpoint for attachments.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::AgentError;
use crate::llm::{
    ChatModel, ChatRequest, FileRef, FunctionCall, FunctionDeclaration, FunctionResponse,
    ModelReply, Part, Role, Turn,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

const API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Reusable Gemini client (connection-pooled)
///
/// The API key travels in the `x-goog-api-key` header, never in the URL.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    fn ensure_key(&self) -> crate::Result<()> {
        if self.api_key.is_empty() {
            return Err(AgentError::LlmError(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }
        Ok(())
    }

    fn generate_url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", API_BASE, self.model)
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/v1beta/files", API_BASE)
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(&self, request: &ChatRequest<'_>) -> crate::Result<ModelReply> {
        self.ensure_key()?;

        let body = GeminiRequest::from_chat(request);

        info!(
            model = %self.model,
            turns = request.turns.len(),
            tools = request.tools.len(),
            "Calling Gemini API"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                AgentError::LlmError(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(AgentError::LlmError(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            AgentError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        let reply = gemini_response.into_reply()?;

        info!(
            parts = reply.parts.len(),
            function_calls = reply.function_calls().len(),
            "Gemini response received"
        );

        Ok(reply)
    }

    async fn upload_file(&self, path: &Path) -> crate::Result<FileRef> {
        let mime_type = supported_mime_type(path).ok_or_else(|| {
            AgentError::LlmError(format!(
                "{} cannot be attached: Gemini accepts {}; convert the file first",
                path.display(),
                SUPPORTED_UPLOADS
            ))
        })?;

        let bytes = tokio::fs::read(path).await?;
        self.ensure_key()?;

        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        info!(file = %display_name, size = bytes.len(), %mime_type, "Uploading file");

        let response = self
            .client
            .post(self.upload_url())
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                AgentError::LlmError(format!("Gemini upload failed: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini upload error response: {}", error_text);
            return Err(AgentError::LlmError(format!(
                "Gemini upload returned {}: {}",
                status, error_text
            )));
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| {
            AgentError::LlmError(format!("Gemini upload parse error: {}", e.without_url()))
        })?;

        Ok(FileRef {
            name: uploaded.file.name,
            uri: uploaded.file.uri,
            mime_type: uploaded
                .file
                .mime_type
                .unwrap_or_else(|| mime_type.to_string()),
        })
    }
}

const SUPPORTED_UPLOADS: &str = "pdf, txt, md, csv, png, jpg";

/// Mime type of an attachment Gemini can read, by file extension.
///
/// Office formats (docx, xlsx) are not accepted by `generateContent`.
pub fn supported_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "md" => Some("text/markdown"),
        "csv" => Some("text/csv"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

//
// ================= Wire format =================
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSet>,
    generation_config: GenerationConfig,
}

impl GeminiRequest {
    fn from_chat(request: &ChatRequest<'_>) -> Self {
        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![ToolSet {
                function_declarations: request.tools.to_vec(),
            }]
        };

        Self {
            contents: request.turns.iter().map(Content::from_turn).collect(),
            tools,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: 2048,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolSet {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<WirePart>,
}

impl Content {
    fn from_turn(turn: &Turn) -> Self {
        let role = match turn.role {
            Role::User => "user",
            Role::Model => "model",
        };

        Self {
            role: role.to_string(),
            parts: turn.parts.iter().map(WirePart::from_part).collect(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
}

impl WirePart {
    fn from_part(part: &Part) -> Self {
        match part {
            Part::Text(text) => Self {
                text: Some(text.clone()),
                ..Self::default()
            },
            Part::File(file) => Self {
                file_data: Some(FileData {
                    mime_type: file.mime_type.clone(),
                    file_uri: file.uri.clone(),
                }),
                ..Self::default()
            },
            Part::FunctionCall(call) => Self {
                function_call: Some(WireFunctionCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                }),
                ..Self::default()
            },
            Part::FunctionResponse(response) => Self {
                function_response: Some(WireFunctionResponse {
                    name: response.name.clone(),
                    response: response.response.clone(),
                }),
                ..Self::default()
            },
        }
    }

    fn into_part(self) -> Option<Part> {
        if let Some(call) = self.function_call {
            return Some(Part::FunctionCall(FunctionCall {
                name: call.name,
                args: call.args,
            }));
        }
        if let Some(response) = self.function_response {
            return Some(Part::FunctionResponse(FunctionResponse {
                name: response.name,
                response: response.response,
            }));
        }
        self.text.map(Part::Text)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GeminiResponse {
    fn into_reply(self) -> crate::Result<ModelReply> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::LlmError("No response from Gemini API".to_string()))?;

        let parts: Vec<Part> = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(WirePart::into_part)
            .collect();

        if parts.is_empty() {
            return Err(AgentError::LlmError(format!(
                "Empty response from Gemini (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(ModelReply { parts })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    name: String,
    uri: String,
    mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let turns = vec![
            Turn {
                role: Role::User,
                parts: vec![
                    Part::Text("Сгенерируй акт".to_string()),
                    Part::File(FileRef {
                        name: "files/abc".to_string(),
                        uri: "https://example.test/files/abc".to_string(),
                        mime_type: "application/pdf".to_string(),
                    }),
                ],
            },
            Turn {
                role: Role::Model,
                parts: vec![Part::FunctionCall(FunctionCall {
                    name: "generate_pdf_act".to_string(),
                    args: json!({ "jobs": [] }),
                })],
            },
        ];
        let tools = vec![FunctionDeclaration {
            name: "generate_pdf_act".to_string(),
            description: "act".to_string(),
            parameters: json!({ "type": "object" }),
        }];
        let request = ChatRequest {
            turns: &turns,
            tools: &tools,
            temperature: 0.1,
        };

        let value = serde_json::to_value(GeminiRequest::from_chat(&request)).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Сгенерируй акт");
        assert_eq!(
            value["contents"][0]["parts"][1]["fileData"]["fileUri"],
            "https://example.test/files/abc"
        );
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(
            value["contents"][1]["parts"][0]["functionCall"]["name"],
            "generate_pdf_act"
        );
        assert_eq!(
            value["tools"][0]["functionDeclarations"][0]["name"],
            "generate_pdf_act"
        );
        assert!(value["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_no_tools_key_without_declarations() {
        let turns = vec![Turn::user_text("привет")];
        let request = ChatRequest {
            turns: &turns,
            tools: &[],
            temperature: 0.1,
        };

        let value = serde_json::to_value(GeminiRequest::from_chat(&request)).unwrap();
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_response_with_function_call() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Формирую счёт" },
                        { "functionCall": { "name": "generate_pdf_invoice", "args": { "jobs": [] } } }
                    ]
                },
                "finishReason": "STOP"
            }]
        });

        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let reply = response.into_reply().unwrap();

        assert_eq!(reply.text(), "Формирую счёт");
        let calls = reply.function_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "generate_pdf_invoice");
    }

    #[test]
    fn test_empty_candidates_is_error() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(response.into_reply(), Err(AgentError::LlmError(_))));
    }

    #[test]
    fn test_supported_mime_type() {
        assert_eq!(
            supported_mime_type(Path::new("Карточка.PDF")),
            Some("application/pdf")
        );
        assert_eq!(supported_mime_type(Path::new("card.txt")), Some("text/plain"));
        assert_eq!(supported_mime_type(Path::new("Карточка.docx")), None);
        assert_eq!(supported_mime_type(Path::new("card")), None);
    }

    #[test]
    fn test_api_key_not_in_urls() {
        let client =
            GeminiClient::new("secret-key".to_string(), "gemini-2.0-flash".to_string()).unwrap();

        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(!client.upload_url().contains("secret-key"));
    }

    #[tokio::test]
    async fn test_docx_upload_rejected_before_network() {
        let client =
            GeminiClient::new("secret-key".to_string(), "gemini-2.0-flash".to_string()).unwrap();

        let error = client
            .upload_file(Path::new("Карточка НТЦ Татнефть.docx"))
            .await
            .unwrap_err();

        match error {
            AgentError::LlmError(message) => {
                assert!(message.contains("Карточка НТЦ Татнефть.docx"));
                assert!(message.contains("pdf"));
            }
            other => panic!("expected LlmError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = GeminiClient::new(String::new(), "gemini-2.0-flash".to_string()).unwrap();
        let turns = vec![Turn::user_text("привет")];
        let request = ChatRequest {
            turns: &turns,
            tools: &[],
            temperature: 0.1,
        };

        let error = client.generate(&request).await.unwrap_err().to_string();
        assert!(error.to_lowercase().contains("api_key"));
    }
}
