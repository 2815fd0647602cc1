//! Per-run session state
//!
//! Holds both conversation threads, the current document and the
//! user-editable settings. Created once at start-up and dropped at exit;
//! nothing here is persisted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{prompts::UnknownTone, prompts_builtin, Config, Tone};
use crate::conversation::{ChatMode, ConversationThread, Role};
use crate::document::Document;

/// Progress of the most recent chat interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionState {
    /// User turn appended, no reply yet
    Pending,
    /// Assistant turn appended
    Resolved,
    /// Completion failed; the user turn stays without a reply
    Failed,
}

pub struct Session {
    general: ConversationThread,
    document_chat: ConversationThread,
    document: Option<Arc<Document>>,
    pub tone: Tone,
    pub api_url: String,
    pub user_name: String,
    interaction_count: u64,
    last_interaction: Option<InteractionState>,
    started_at: DateTime<Utc>,
}

/// One rendered line of a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub speaker: String,
    pub content: String,
}

/// Loaded document summary
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub id: Uuid,
    pub bytes: usize,
    pub chars: usize,
}

impl From<&Document> for DocumentInfo {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            bytes: doc.raw_bytes().len(),
            chars: doc.char_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub tone: Tone,
    pub api_url: String,
    pub user_name: String,
    pub interaction_count: u64,
    pub last_interaction: Option<InteractionState>,
    pub document: Option<DocumentInfo>,
    pub general_turns: usize,
    pub document_turns: usize,
    pub started_at: DateTime<Utc>,
}

/// Partial settings change; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            general: ConversationThread::general(),
            document_chat: ConversationThread::document(),
            document: None,
            tone: config.tone,
            api_url: config.completion.api_url.clone(),
            user_name: config.user_name.clone(),
            interaction_count: 0,
            last_interaction: None,
            started_at: Utc::now(),
        }
    }

    pub fn thread(&self, mode: ChatMode) -> &ConversationThread {
        match mode {
            ChatMode::General => &self.general,
            ChatMode::Document => &self.document_chat,
        }
    }

    pub(crate) fn thread_mut(&mut self, mode: ChatMode) -> &mut ConversationThread {
        match mode {
            ChatMode::General => &mut self.general,
            ChatMode::Document => &mut self.document_chat,
        }
    }

    pub fn document(&self) -> Option<Arc<Document>> {
        self.document.clone()
    }

    /// Swap in a newly uploaded document. Returns the id it replaced.
    pub fn replace_document(&mut self, document: Document) -> Option<Uuid> {
        let previous = self.document.as_ref().map(|d| d.id);
        tracing::info!(
            "📄 Loaded document {} ({} chars){}",
            document.id,
            document.char_count(),
            previous
                .map(|id| format!(", replacing {}", id))
                .unwrap_or_default()
        );
        self.document = Some(Arc::new(document));
        previous
    }

    /// Number of chat attempts, successful or not
    pub fn interaction_count(&self) -> u64 {
        self.interaction_count
    }

    pub fn last_interaction(&self) -> Option<InteractionState> {
        self.last_interaction
    }

    pub(crate) fn begin_interaction(&mut self) -> u64 {
        self.interaction_count += 1;
        self.last_interaction = Some(InteractionState::Pending);
        self.interaction_count
    }

    pub(crate) fn finish_interaction(&mut self, state: InteractionState) {
        self.last_interaction = Some(state);
    }

    /// Return both threads to their preamble
    pub fn reset_conversations(&mut self) {
        self.general.reset();
        self.document_chat.reset();
        self.last_interaction = None;
    }

    pub fn apply_settings(&mut self, update: SettingsUpdate) -> Result<(), UnknownTone> {
        // validate first so a bad tone changes nothing
        let tone = update.tone.as_deref().map(str::parse::<Tone>).transpose()?;

        if let Some(tone) = tone {
            self.tone = tone;
        }
        if let Some(url) = update.api_url {
            self.api_url = url;
        }
        if let Some(name) = update.user_name {
            self.user_name = name;
        }
        Ok(())
    }

    /// Label shown next to a turn; system turns are not displayed
    pub fn speaker_label(&self, role: Role) -> Option<&str> {
        match role {
            Role::System => None,
            Role::User => Some(self.user_name.as_str()),
            Role::Assistant => Some(prompts_builtin::ASSISTANT_NAME),
        }
    }

    pub fn transcript(&self, mode: ChatMode) -> Vec<TranscriptEntry> {
        self.thread(mode)
            .turns()
            .iter()
            .filter_map(|turn| {
                self.speaker_label(turn.role).map(|speaker| TranscriptEntry {
                    role: turn.role,
                    speaker: speaker.to_string(),
                    content: turn.content.clone(),
                })
            })
            .collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tone: self.tone,
            api_url: self.api_url.clone(),
            user_name: self.user_name.clone(),
            interaction_count: self.interaction_count,
            last_interaction: self.last_interaction,
            document: self.document.as_deref().map(DocumentInfo::from),
            general_turns: self.general.len(),
            document_turns: self.document_chat.len(),
            started_at: self.started_at,
        }
    }
}
