//! Conversation session
//!
//! In-memory checkpoint of the single conversation the assistant holds for
//! the life of the process.

use crate::llm::{FileRef, FunctionResponse, ModelReply, Part, Role, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    turns: Vec<Turn>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }

    pub fn push_user_text(&mut self, text: impl Into<String>) {
        self.push(Turn::user_text(text));
    }

    /// User message with attached files, text first
    pub fn push_user_message(&mut self, text: impl Into<String>, attachments: &[FileRef]) {
        let mut parts = Vec::with_capacity(attachments.len() + 1);
        parts.push(Part::Text(text.into()));
        parts.extend(attachments.iter().cloned().map(Part::File));

        self.push(Turn {
            role: Role::User,
            parts,
        });
    }

    pub fn push_model_reply(&mut self, reply: ModelReply) {
        self.push(reply.into_turn());
    }

    /// Function responses go back to the model in a single user turn
    pub fn push_tool_results(&mut self, results: Vec<FunctionResponse>) {
        if results.is_empty() {
            return;
        }

        self.push(Turn {
            role: Role::User,
            parts: results.into_iter().map(Part::FunctionResponse).collect(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Drop every turn after the first `len`
    pub fn truncate(&mut self, len: usize) {
        if len < self.turns.len() {
            self.turns.truncate(len);
            self.updated_at = Utc::now();
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.updated_at = Utc::now();
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}
