//! Conversation types and thread history

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::prompts_builtin;

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Which conversation a prompt belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Free-form chat grounded in earlier user turns
    General,
    /// Chat grounded in the text of the current document
    Document,
}

impl ChatMode {
    /// The system preamble a thread of this mode starts with
    pub fn preamble(&self) -> &'static str {
        match self {
            ChatMode::General => prompts_builtin::GENERAL_PREAMBLE,
            ChatMode::Document => prompts_builtin::DOCUMENT_PREAMBLE,
        }
    }
}

/// Append-only history of turns for one chat mode.
///
/// The first turn is always the system preamble. Turns are only ever pushed
/// to the end; the sole way to shrink a thread is [`ConversationThread::reset`],
/// which keeps the preamble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationThread {
    pub id: Uuid,
    pub mode: ChatMode,
    turns: Vec<Turn>,
}

impl ConversationThread {
    pub fn new(mode: ChatMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            turns: vec![Turn::system(mode.preamble())],
        }
    }

    pub fn general() -> Self {
        Self::new(ChatMode::General)
    }

    pub fn document() -> Self {
        Self::new(ChatMode::Document)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn add_user(&mut self, content: &str) {
        self.turns.push(Turn::user(content));
    }

    pub fn add_assistant(&mut self, content: &str) {
        self.turns.push(Turn::assistant(content));
    }

    /// Every user turn in append order, joined by newlines
    pub fn user_context(&self) -> String {
        self.turns
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when the last turn is a user turn with no assistant reply
    pub fn has_dangling_user_turn(&self) -> bool {
        self.last().map_or(false, |t| t.role == Role::User)
    }

    /// Drop everything but the preamble
    pub fn reset(&mut self) {
        self.turns.truncate(1);
    }
}
