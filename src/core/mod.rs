//! Conversation engine
//!
//! Session state, request assembly and the per-interaction orchestration.

mod chat;
mod context;
mod session;

pub use chat::{ChatEngine, ChatError, ChatResponse};
pub use session::{DocumentInfo, Session, SessionSnapshot, SettingsUpdate, TranscriptEntry};
