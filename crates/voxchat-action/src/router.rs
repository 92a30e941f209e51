//! Command classification for assistant responses.
//!
//! The backend embeds structured commands in its free-text replies by
//! prefixing them with a fixed tag. Tags are matched in table order, so
//! `XX1` always wins over `XX2`.

use serde::{Deserialize, Serialize};

/// Tag announcing an alarm request (`XX1 DayName/YYYY-MM-DD/HH:MM`).
pub const ALARM_TAG: &str = "XX1";
/// Tag announcing a note to save (`XX2 <content>`).
pub const NOTE_TAG: &str = "XX2";

/// A classified assistant response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Command {
    /// Raw alarm payload, trimmed. May be empty.
    SetAlarm(String),
    /// Note content, trimmed. May be empty.
    SaveNote(String),
    /// Plain conversational text, untouched.
    Say(String),
}

#[derive(Clone, Copy)]
enum TaggedKind {
    Alarm,
    Note,
}

const TAGS: [(&str, TaggedKind); 2] = [
    (ALARM_TAG, TaggedKind::Alarm),
    (NOTE_TAG, TaggedKind::Note),
];

/// Classify a raw response. Never fails; empty payloads are left for the
/// caller to report.
pub fn classify(response: &str) -> Command {
    for (tag, kind) in TAGS {
        if let Some(rest) = response.strip_prefix(tag) {
            let payload = rest.trim().to_string();
            return match kind {
                TaggedKind::Alarm => Command::SetAlarm(payload),
                TaggedKind::Note => Command::SaveNote(payload),
            };
        }
    }
    Command::Say(response.to_string())
}

impl Command {
    /// Whether this is a tagged command whose payload is empty.
    pub fn has_empty_payload(&self) -> bool {
        match self {
            Command::SetAlarm(p) | Command::SaveNote(p) => p.is_empty(),
            Command::Say(_) => false,
        }
    }
}
