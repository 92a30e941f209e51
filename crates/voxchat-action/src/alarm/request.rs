//! Alarm payload parsing.
//!
//! The wire format is `DayName/YYYY-MM-DD/HH:MM`, e.g. `Monday/2025-01-15/15:30`.
//! The day name is validated on its own and is not compared with the weekday
//! of the date.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

use crate::error::SchedulingError;

/// Shape every alarm payload must follow.
pub const EXPECTED_FORMAT: &str = "DayName/YYYY-MM-DD/HH:MM";

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Full English weekday name as sent by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayName {
    pub const ALL: [DayName; 7] = [
        DayName::Monday,
        DayName::Tuesday,
        DayName::Wednesday,
        DayName::Thursday,
        DayName::Friday,
        DayName::Saturday,
        DayName::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DayName::Monday => "Monday",
            DayName::Tuesday => "Tuesday",
            DayName::Wednesday => "Wednesday",
            DayName::Thursday => "Thursday",
            DayName::Friday => "Friday",
            DayName::Saturday => "Saturday",
            DayName::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DayName {
    type Err = SchedulingError;

    /// Exact, case-sensitive match against the seven full names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayName::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| SchedulingError::InvalidDayName(s.to_string()))
    }
}

/// A parsed alarm payload, still in wall-clock terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmRequest {
    pub day_name: DayName,
    pub date: NaiveDate,
    pub time_of_day: NaiveTime,
}

impl AlarmRequest {
    /// Parse a `DayName/YYYY-MM-DD/HH:MM` payload.
    pub fn parse(raw: &str) -> Result<Self, SchedulingError> {
        let parts: Vec<&str> = raw.trim().split('/').map(str::trim).collect();
        let [day, date, time] = parts.as_slice() else {
            return Err(SchedulingError::malformed());
        };

        let day_name: DayName = day.parse()?;

        let joined = format!("{} {}", date, time);
        if !has_shape(date, "dddd-dd-dd") || !has_shape(time, "dd:dd") {
            return Err(SchedulingError::InvalidDateTime(joined));
        }
        let local = NaiveDateTime::parse_from_str(&joined, DATE_TIME_FORMAT)
            .map_err(|_| SchedulingError::InvalidDateTime(joined.clone()))?;

        Ok(Self {
            day_name,
            date: local.date(),
            time_of_day: local.time(),
        })
    }

    /// The requested wall-clock date-time, without a timezone.
    pub fn local_date_time(&self) -> NaiveDateTime {
        self.date.and_time(self.time_of_day)
    }
}

/// Check `s` against a template where `d` stands for an ASCII digit and any
/// other byte must match literally.
fn has_shape(s: &str, template: &str) -> bool {
    s.len() == template.len()
        && s.bytes().zip(template.bytes()).all(|(c, t)| match t {
            b'd' => c.is_ascii_digit(),
            _ => c == t,
        })
}
