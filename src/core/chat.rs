//! Chat engine
//!
//! The ChatEngine drives one interaction at a time:
//! 1. Appends the user's prompt to the thread for the chosen mode
//! 2. Builds the request (persona + tone, grounding context, question)
//! 3. Makes a single call to the completion endpoint
//! 4. Appends the reply, or leaves the user turn unanswered on failure
//!
//! A failed interaction is not rolled back. The user turn stays in the
//! thread and the user may resubmit.

use std::sync::Arc;

use serde::Serialize;

use crate::conversation::ChatMode;
use crate::providers::{CompletionClient, CompletionError};

use super::context::ContextBuilder;
use super::session::{InteractionState, Session};

/// Reply to a successful interaction
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub mode: ChatMode,
    pub message: String,
    /// Attempt number within the session
    pub interaction: u64,
}

/// Errors from the chat engine
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("No document loaded. Upload a PDF first.")]
    NoDocument,

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl ChatError {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::EmptyPrompt => "empty_prompt",
            ChatError::NoDocument => "no_document",
            ChatError::Completion(e) => e.kind(),
        }
    }
}

/// The core chat engine
pub struct ChatEngine {
    client: Arc<dyn CompletionClient>,
}

impl ChatEngine {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Run one interaction against `session`
    pub async fn chat(
        &self,
        session: &mut Session,
        mode: ChatMode,
        prompt: &str,
    ) -> Result<ChatResponse, ChatError> {
        if prompt.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        if mode == ChatMode::Document && session.document().is_none() {
            return Err(ChatError::NoDocument);
        }

        if session.thread(mode).has_dangling_user_turn() {
            tracing::debug!("Previous {:?} prompt was never answered; resubmitting", mode);
        }

        let interaction = session.begin_interaction();
        session.thread_mut(mode).add_user(prompt);

        let messages = ContextBuilder::new(session).build(mode, prompt)?;
        let endpoint = session.api_url.clone();

        tracing::info!(
            "💬 Interaction {} ({:?}) -> {}",
            interaction,
            mode,
            endpoint
        );

        match self.client.complete(&endpoint, &messages).await {
            Ok(reply) => {
                session.thread_mut(mode).add_assistant(&reply);
                session.finish_interaction(InteractionState::Resolved);
                tracing::debug!("Interaction {} resolved ({} chars)", interaction, reply.len());

                Ok(ChatResponse {
                    mode,
                    message: reply,
                    interaction,
                })
            }
            Err(e) => {
                session.finish_interaction(InteractionState::Failed);
                tracing::warn!("Interaction {} failed [{}]: {}", interaction, e.kind(), e);
                Err(ChatError::Completion(e))
            }
        }
    }
}
