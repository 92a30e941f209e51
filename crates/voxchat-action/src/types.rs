//! Core types and value objects for the action engine.
//!
//! Defines alarm identifiers and lifecycle states, and the chat entries
//! produced when a response is dispatched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Alarms
// =============================================================================

/// Identifier of a registered alarm.
///
/// Derived from the trigger instant (epoch milliseconds truncated to 32 bits),
/// so two requests resolving to the same millisecond share one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(pub i32);

impl AlarmId {
    /// Derive the id for an alarm firing at `trigger_at`.
    pub fn from_trigger(trigger_at: DateTime<Utc>) -> Self {
        AlarmId(trigger_at.timestamp_millis() as i32)
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AlarmId {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(AlarmId)
            .map_err(|_| format!("Invalid alarm id: {}", s))
    }
}

/// Alarm lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmStatus {
    Scheduled,
    Fired,
    Ringing,
    Dismissed,
    Cancelled,
}

impl AlarmStatus {
    /// Whether no further transition is possible from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, AlarmStatus::Dismissed | AlarmStatus::Cancelled)
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmStatus::Scheduled => write!(f, "scheduled"),
            AlarmStatus::Fired => write!(f, "fired"),
            AlarmStatus::Ringing => write!(f, "ringing"),
            AlarmStatus::Dismissed => write!(f, "dismissed"),
            AlarmStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for AlarmStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AlarmStatus::Scheduled),
            "fired" => Ok(AlarmStatus::Fired),
            "ringing" => Ok(AlarmStatus::Ringing),
            "dismissed" => Ok(AlarmStatus::Dismissed),
            "cancelled" => Ok(AlarmStatus::Cancelled),
            _ => Err(format!("Unknown alarm status: {}", s)),
        }
    }
}

/// A successfully registered one-shot alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledAlarm {
    pub id: AlarmId,
    pub trigger_at: DateTime<Utc>,
}

/// An alarm as tracked by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmEntry {
    pub id: AlarmId,
    pub trigger_at: DateTime<Utc>,
    pub status: AlarmStatus,
}

// =============================================================================
// Chat
// =============================================================================

/// Who a chat entry is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
    System,
    Error,
}

impl ChatRole {
    /// Display prefix used when rendering the conversation.
    pub fn label(self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Assistant",
            ChatRole::System => "System",
            ChatRole::Error => "Error",
        }
    }
}

/// A single line of the rendered conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub text: String,
}

impl ChatEntry {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

impl fmt::Display for ChatEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role.label(), self.text)
    }
}

/// Result of dispatching one assistant response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Entry to append to the conversation.
    pub entry: ChatEntry,
    /// Text to read aloud, if any.
    pub speech: Option<String>,
}
