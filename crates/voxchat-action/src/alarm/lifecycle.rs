//! Alarm state machine with validated transitions.
//!
//! Enforces the one-shot alarm lifecycle:
//! Scheduled -> Fired -> Ringing -> Dismissed
//! Scheduled -> Cancelled

use crate::error::AlarmError;
use crate::types::AlarmStatus;

/// Validate that a status transition is allowed.
///
/// Valid transitions:
/// - Scheduled -> Fired
/// - Scheduled -> Cancelled
/// - Fired -> Ringing
/// - Fired -> Dismissed (dismissed before the ringing screen started)
/// - Ringing -> Dismissed
pub fn validate_transition(from: AlarmStatus, to: AlarmStatus) -> Result<(), AlarmError> {
    let valid = matches!(
        (from, to),
        (AlarmStatus::Scheduled, AlarmStatus::Fired)
            | (AlarmStatus::Scheduled, AlarmStatus::Cancelled)
            | (AlarmStatus::Fired, AlarmStatus::Ringing)
            | (AlarmStatus::Fired, AlarmStatus::Dismissed)
            | (AlarmStatus::Ringing, AlarmStatus::Dismissed)
    );

    if valid {
        Ok(())
    } else {
        Err(AlarmError::InvalidTransition(from, to))
    }
}

/// The state `cancel` moves an alarm into, if cancelling it does anything.
///
/// Alarms that already fired are dismissed rather than cancelled; finished
/// alarms are left alone.
pub fn cancel_target(from: AlarmStatus) -> Option<AlarmStatus> {
    match from {
        AlarmStatus::Scheduled => Some(AlarmStatus::Cancelled),
        AlarmStatus::Fired | AlarmStatus::Ringing => Some(AlarmStatus::Dismissed),
        AlarmStatus::Dismissed | AlarmStatus::Cancelled => None,
    }
}
