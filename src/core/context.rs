//! Outgoing request assembly
//!
//! Every request is exactly two messages: the persona plus tone instruction,
//! then the user's question prefixed with its grounding context. General chat
//! is grounded in every user turn of its thread, so the context grows with
//! the conversation. Document chat is grounded in the full document text.

use crate::config::{prompts::system_instruction, Tone};
use crate::conversation::{ChatMode, Turn};

use super::chat::ChatError;
use super::session::Session;

pub const QUESTION_LABEL: &str = "User's question:";

pub struct ContextBuilder<'a> {
    session: &'a Session,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Background text for a question in `mode`
    pub fn grounding(&self, mode: ChatMode) -> Result<String, ChatError> {
        match mode {
            ChatMode::General => Ok(self.session.thread(ChatMode::General).user_context()),
            ChatMode::Document => self
                .session
                .document()
                .map(|doc| doc.text().to_string())
                .ok_or(ChatError::NoDocument),
        }
    }

    pub fn build(&self, mode: ChatMode, question: &str) -> Result<Vec<Turn>, ChatError> {
        let context = self.grounding(mode)?;
        Ok(build_messages(self.session.tone, &context, question))
    }
}

pub fn build_messages(tone: Tone, context: &str, question: &str) -> Vec<Turn> {
    vec![
        Turn::system(system_instruction(tone)),
        Turn::user(with_context(context, question)),
    ]
}

fn with_context(context: &str, question: &str) -> String {
    if context.is_empty() {
        question.to_string()
    } else {
        format!("{}\n\n{} {}", context, QUESTION_LABEL, question)
    }
}
