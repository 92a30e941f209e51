//! Error types for the action engine.
//!
//! The `Display` text of each variant is what the user sees (and hears), so
//! the messages are written as complete sentences.

use crate::alarm::request::EXPECTED_FORMAT;
use crate::types::{AlarmId, AlarmStatus};
use voxchat_core::error::VoxchatError;

/// Errors from parsing, validating, or registering an alarm request.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid alarm format. Expected: {expected}")]
    MalformedFormat { expected: &'static str },
    #[error("Invalid day name: {0}. Must be a full English day name (e.g., Monday)")]
    InvalidDayName(String),
    #[error("Invalid date/time format: {0}. Expected YYYY-MM-DD HH:MM")]
    InvalidDateTime(String),
    #[error(
        "Cannot set alarm in the past! Alarm was for {minutes_ago} minutes ago. \
         Please try again with a future time."
    )]
    PastTime { minutes_ago: i64 },
    #[error("Error setting alarm: {0}")]
    SchedulingFailure(#[from] VoxchatError),
}

impl SchedulingError {
    pub(crate) fn malformed() -> Self {
        SchedulingError::MalformedFormat {
            expected: EXPECTED_FORMAT,
        }
    }
}

/// Errors from alarm lifecycle management.
#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    #[error("Alarm not found: {0}")]
    NotFound(AlarmId),
    #[error("Invalid state transition: {0} -> {1}")]
    InvalidTransition(AlarmStatus, AlarmStatus),
    #[error(transparent)]
    Storage(#[from] VoxchatError),
}

/// Errors from the note store.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("Cannot save empty note")]
    Empty,
    #[error("Note index {index} out of range ({len} notes)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Storage(#[from] VoxchatError),
}

/// Errors from the assistant transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Server connection failed: {0}")]
    Connection(String),
    #[error("Failed to parse server response: {0}")]
    MalformedReply(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduling_error_display() {
        assert_eq!(
            SchedulingError::malformed().to_string(),
            "Invalid alarm format. Expected: DayName/YYYY-MM-DD/HH:MM"
        );
        assert_eq!(
            SchedulingError::InvalidDayName("Funday".to_string()).to_string(),
            "Invalid day name: Funday. Must be a full English day name (e.g., Monday)"
        );
        assert_eq!(
            SchedulingError::InvalidDateTime("2025-13-01 10:00".to_string()).to_string(),
            "Invalid date/time format: 2025-13-01 10:00. Expected YYYY-MM-DD HH:MM"
        );
        assert_eq!(
            SchedulingError::PastTime { minutes_ago: 60 }.to_string(),
            "Cannot set alarm in the past! Alarm was for 60 minutes ago. \
             Please try again with a future time."
        );
    }

    #[test]
    fn test_scheduling_failure_wraps_core_error() {
        let err: SchedulingError = VoxchatError::Storage("disk full".to_string()).into();
        assert!(matches!(err, SchedulingError::SchedulingFailure(_)));
        assert_eq!(
            err.to_string(),
            "Error setting alarm: Storage error: disk full"
        );
    }

    #[test]
    fn test_alarm_error_display() {
        let err = AlarmError::InvalidTransition(AlarmStatus::Cancelled, AlarmStatus::Ringing);
        assert_eq!(
            err.to_string(),
            "Invalid state transition: cancelled -> ringing"
        );
        assert_eq!(AlarmError::NotFound(AlarmId(5)).to_string(), "Alarm not found: 5");
    }

    #[test]
    fn test_note_error_display() {
        assert_eq!(NoteError::Empty.to_string(), "Cannot save empty note");
        assert_eq!(
            NoteError::IndexOutOfRange { index: 3, len: 2 }.to_string(),
            "Note index 3 out of range (2 notes)"
        );
        let err: NoteError = VoxchatError::Storage("locked".to_string()).into();
        assert_eq!(err.to_string(), "Storage error: locked");
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(
            TransportError::Connection("timed out".to_string()).to_string(),
            "Server connection failed: timed out"
        );
        assert_eq!(
            TransportError::MalformedReply("missing field".to_string()).to_string(),
            "Failed to parse server response: missing field"
        );
    }

    #[test]
    fn test_errors_implement_debug() {
        let dbg = format!("{:?}", SchedulingError::PastTime { minutes_ago: 2 });
        assert!(dbg.contains("PastTime"));
        let dbg = format!("{:?}", AlarmError::NotFound(AlarmId(1)));
        assert!(dbg.contains("NotFound"));
    }
}
