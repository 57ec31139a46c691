//! Billing agent - holds the model, the tools and one conversation
//!
//! USER TURN → MODEL → (FUNCTION CALLS → TOOLS → FUNCTION RESPONSES → MODEL)* → REPLY

pub mod prompt;

use crate::error::AgentError;
use crate::llm::{ChatModel, ChatRequest, FileRef, FunctionDeclaration, FunctionResponse};
use crate::session::ConversationSession;
use crate::tools::ToolRegistry;
use crate::Result;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Model round trips allowed inside one user turn
const MAX_TOOL_ROUNDS: u32 = 8;

pub const DEFAULT_TEMPERATURE: f32 = 0.1;

pub struct BillingAgent {
    model: Box<dyn ChatModel>,
    tools: ToolRegistry,
    declarations: Vec<FunctionDeclaration>,
    session: ConversationSession,
    temperature: f32,
}

impl BillingAgent {
    pub fn new(model: Box<dyn ChatModel>, tools: ToolRegistry) -> Self {
        let declarations = tools.declarations();

        Self {
            model,
            tools,
            declarations,
            session: ConversationSession::new(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session.session_id
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Upload a reference document so it can be attached to a message
    pub async fn upload_file(&self, path: &Path) -> Result<FileRef> {
        let file = self.model.upload_file(path).await?;
        info!(
            session_id = %self.session.session_id,
            file = %file.name,
            "File uploaded"
        );
        Ok(file)
    }

    /// Send a user message and return the model's final text reply.
    ///
    /// Function calls in between are executed against the tool registry and
    /// their outputs fed back to the model until it answers in text. A failed
    /// turn leaves the session as it was before the call.
    pub async fn invoke(&mut self, content: &str, attachments: &[FileRef]) -> Result<String> {
        if content.trim().is_empty() && attachments.is_empty() {
            return Err(AgentError::InvalidToolInput(
                "Message is empty".to_string(),
            ));
        }

        let checkpoint = self.session.turn_count();

        if attachments.is_empty() {
            self.session.push_user_text(content);
        } else {
            self.session.push_user_message(content, attachments);
        }

        let result = self.run_turn().await;
        if result.is_err() {
            self.session.truncate(checkpoint);
            debug!(
                session_id = %self.session.session_id,
                turns = checkpoint,
                "Rolled back failed turn"
            );
        }
        result
    }

    async fn run_turn(&mut self) -> Result<String> {
        let start = Instant::now();

        for round in 1..=MAX_TOOL_ROUNDS {
            let request = ChatRequest {
                turns: self.session.turns(),
                tools: &self.declarations,
                temperature: self.temperature,
            };

            let reply = self.model.generate(&request).await?;

            let calls: Vec<_> = reply.function_calls().into_iter().cloned().collect();

            if calls.is_empty() {
                let text = reply.text();
                self.session.push_model_reply(reply);

                info!(
                    session_id = %self.session.session_id,
                    rounds = round,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Agent turn complete"
                );
                return Ok(text);
            }

            self.session.push_model_reply(reply);

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                debug!(round, tool = %call.name, "Dispatching function call");

                let output = self.tools.handle(call).await;
                results.push(FunctionResponse {
                    name: call.name.clone(),
                    response: serde_json::to_value(&output)?,
                });
            }
            self.session.push_tool_results(results);
        }

        warn!(
            session_id = %self.session.session_id,
            "Model kept calling tools, giving up on this turn"
        );
        Err(AgentError::ToolLoopExceeded(MAX_TOOL_ROUNDS))
    }
}
