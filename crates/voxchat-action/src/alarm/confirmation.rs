//! User-facing text for a scheduled alarm.

use chrono::{DateTime, TimeZone};
use std::fmt;

/// `Monday, Jan 15 at 03:30 pm`
const TRIGGER_FORMAT: &str = "%A, %b %d at %I:%M %P";

/// What the user is told after an alarm has been registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Trigger time rendered in the local timezone.
    pub formatted_time: String,
    /// Distance from now, e.g. `2 hours and 5 minutes`.
    pub time_until: String,
}

impl Confirmation {
    pub fn new<Tz: TimeZone>(trigger_local: &DateTime<Tz>, delta_ms: i64) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self {
            formatted_time: format_trigger(trigger_local),
            time_until: format_time_until(delta_ms),
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alarm set for {} in {}",
            self.formatted_time, self.time_until
        )
    }
}

/// Render a trigger instant as `<Weekday>, <Mon> <DD> at <hh:mm> <am|pm>`.
pub fn format_trigger<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format(TRIGGER_FORMAT).to_string()
}

/// Render a millisecond delta as whole hours and minutes.
///
/// Minutes use truncating division, so a delta inside the past-time
/// tolerance renders as `0 minutes`.
pub fn format_time_until(delta_ms: i64) -> String {
    let minutes = delta_ms / 60_000;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{} hours and {} minutes", hours, minutes % 60)
    } else {
        format!("{} minutes", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    const MINUTE: i64 = 60_000;

    #[test]
    fn test_time_until_hours_and_minutes() {
        assert_eq!(format_time_until(125 * MINUTE), "2 hours and 5 minutes");
        assert_eq!(format_time_until(60 * MINUTE), "1 hours and 0 minutes");
    }

    #[test]
    fn test_time_until_minutes_only() {
        assert_eq!(format_time_until(59 * MINUTE + 59_999), "59 minutes");
        assert_eq!(format_time_until(30 * MINUTE), "30 minutes");
        assert_eq!(format_time_until(59_999), "0 minutes");
    }

    #[test]
    fn test_time_until_within_tolerance() {
        assert_eq!(format_time_until(-30_000), "0 minutes");
        assert_eq!(format_time_until(0), "0 minutes");
    }

    #[test]
    fn test_format_trigger_pm() {
        let at = Utc.with_ymd_and_hms(2025, 1, 13, 15, 30, 0).unwrap();
        assert_eq!(format_trigger(&at), "Monday, Jan 13 at 03:30 pm");
    }

    #[test]
    fn test_format_trigger_am_zero_padded_day() {
        let at = Utc.with_ymd_and_hms(2025, 3, 7, 8, 5, 0).unwrap();
        assert_eq!(format_trigger(&at), "Friday, Mar 07 at 08:05 am");
    }

    #[test]
    fn test_format_trigger_midnight_and_noon() {
        let midnight = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(format_trigger(&midnight), "Wednesday, Jan 15 at 12:00 am");
        let noon = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(format_trigger(&noon), "Wednesday, Jan 15 at 12:00 pm");
    }

    #[test]
    fn test_format_trigger_uses_given_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let at = Utc
            .with_ymd_and_hms(2025, 1, 15, 22, 30, 0)
            .unwrap()
            .with_timezone(&tz);
        assert_eq!(format_trigger(&at), "Thursday, Jan 16 at 12:30 am");
    }

    #[test]
    fn test_confirmation_display() {
        let at = Utc.with_ymd_and_hms(2025, 1, 13, 15, 30, 0).unwrap();
        let confirmation = Confirmation::new(&at, 125 * MINUTE);
        assert_eq!(
            confirmation.to_string(),
            "Alarm set for Monday, Jan 13 at 03:30 pm in 2 hours and 5 minutes"
        );
    }
}
