//! Downloadable exports as base64 payloads

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::conversation::ConversationThread;

use super::Entity;

pub const ENTITIES_FILENAME: &str = "named_entities.csv";
pub const CONVERSATION_FILENAME: &str = "conversation_history.json";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(String),

    #[error("An error occurred while exporting conversation history: {0}")]
    Json(#[from] serde_json::Error),
}

/// An embedded file with a suggested name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub filename: String,
    pub mime: String,
    /// Base64 (standard alphabet) file content
    pub data: String,
}

impl ExportPayload {
    fn encode(filename: &str, mime: &str, content: &[u8]) -> Self {
        Self {
            filename: filename.to_string(),
            mime: mime.to_string(),
            data: STANDARD.encode(content),
        }
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.data)
    }
}

#[cfg(test)]
impl ExportPayload {
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// `Entity,Type,Color` table of tagged entities
pub fn entities_csv(entities: &[Entity]) -> Result<ExportPayload, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let csv_err = |e: csv::Error| ExportError::Csv(e.to_string());

    writer
        .write_record(["Entity", "Type", "Color"])
        .map_err(csv_err)?;
    for entity in entities {
        writer
            .write_record([
                entity.text.as_str(),
                entity.label.as_str(),
                entity.label.color(),
            ])
            .map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))?;

    Ok(ExportPayload::encode(ENTITIES_FILENAME, "file/csv", &bytes))
}

/// The thread's turns as a pretty-printed JSON array of `{role, content}`
pub fn conversation_json(thread: &ConversationThread) -> Result<ExportPayload, ExportError> {
    let json = serde_json::to_string_pretty(thread.turns())?;
    Ok(ExportPayload::encode(
        CONVERSATION_FILENAME,
        "file/json",
        json.as_bytes(),
    ))
}
