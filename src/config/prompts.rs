//! Persona preambles and response tones
//!
//! The persona ("a helpful assistant named Alfred AI") is fixed. A [`Tone`]
//! only adds a register instruction after it; it never changes who the
//! assistant is.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Response register injected into every outgoing system instruction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Neutral,
    Friendly,
    Formal,
    Casual,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Neutral, Tone::Friendly, Tone::Formal, Tone::Casual];

    pub fn name(&self) -> &'static str {
        match self {
            Tone::Neutral => "Neutral",
            Tone::Friendly => "Friendly",
            Tone::Formal => "Formal",
            Tone::Casual => "Casual",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Tone::Neutral => builtin::NEUTRAL_TONE,
            Tone::Friendly => builtin::FRIENDLY_TONE,
            Tone::Formal => builtin::FORMAL_TONE,
            Tone::Casual => builtin::CASUAL_TONE,
        }
    }

    /// Instruction for a tone given by name. Unknown names get no instruction.
    pub fn instruction_for(name: &str) -> &'static str {
        name.parse::<Tone>().map(|t| t.instruction()).unwrap_or("")
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tone {
    type Err = UnknownTone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTone(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown tone '{0}', expected one of Neutral, Friendly, Formal, Casual")]
pub struct UnknownTone(pub String);

/// System instruction sent with every completion request
pub fn system_instruction(tone: Tone) -> String {
    format!("{} {}", builtin::PERSONA, tone.instruction())
}

/// Built-in prompts that don't require files
pub mod builtin {
    /// Identity shared by every request
    pub const PERSONA: &str = "You are a helpful assistant named Alfred AI.";

    /// Preamble of the general chat thread
    pub const GENERAL_PREAMBLE: &str = PERSONA;

    /// Preamble of the document chat thread
    pub const DOCUMENT_PREAMBLE: &str = "You are a helpful assistant named Alfred AI. Your task is to answer questions based on the provided PDF content.";

    /// Display name used for assistant turns
    pub const ASSISTANT_NAME: &str = "Alfred AI";

    pub const NEUTRAL_TONE: &str = "Respond in a neutral and balanced tone.";
    pub const FRIENDLY_TONE: &str =
        "Respond in a warm and friendly tone, as if talking to a close friend.";
    pub const FORMAL_TONE: &str =
        "Respond in a formal and professional tone, suitable for business communication.";
    pub const CASUAL_TONE: &str = "Respond in a casual and relaxed tone, using informal language.";
}
