//! Completion endpoint integrations

mod chat_endpoint;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::Turn;

pub use chat_endpoint::ChatEndpointClient;

/// Why a completion produced no reply. Exactly one per failed attempt.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("HTTP error occurred: {status} {body}")]
    Http { status: u16, body: String },

    #[error("The request timed out. Please try again.")]
    Timeout,

    #[error("Request error occurred: {0}")]
    Transport(String),

    #[error("Malformed response from completion endpoint: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::Http { .. } => "http_error",
            CompletionError::Timeout => "timeout",
            CompletionError::Transport(_) => "transport_error",
            CompletionError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// One request, one attempt. No retries.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `messages` to `endpoint` and return the assistant's reply text
    async fn complete(&self, endpoint: &str, messages: &[Turn]) -> Result<String, CompletionError>;
}
