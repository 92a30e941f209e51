//! Alarm scheduling: payload -> validated trigger instant -> registration.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use voxchat_core::config::AlarmConfig;

use crate::alarm::confirmation::Confirmation;
use crate::alarm::request::AlarmRequest;
use crate::alarm::ringing::Silencer;
use crate::error::SchedulingError;
use crate::facility::AlarmFacility;
use crate::types::{AlarmId, ScheduledAlarm};

const DEFAULT_PAST_TOLERANCE_SECS: i64 = 60;

/// Turns alarm payloads into one-shot registrations on an [`AlarmFacility`].
pub struct AlarmScheduler {
    facility: Arc<dyn AlarmFacility>,
    silencer: Option<Arc<dyn Silencer>>,
    past_tolerance: Duration,
}

impl AlarmScheduler {
    /// Create a scheduler with the default 60 second past-time tolerance.
    pub fn new(facility: Arc<dyn AlarmFacility>) -> Self {
        Self {
            facility,
            silencer: None,
            past_tolerance: Duration::seconds(DEFAULT_PAST_TOLERANCE_SECS),
        }
    }

    /// Create a scheduler using the `[alarm]` config section.
    pub fn from_config(facility: Arc<dyn AlarmFacility>, config: &AlarmConfig) -> Self {
        let secs = i64::try_from(config.past_tolerance_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        Self::new(facility).with_past_tolerance(Duration::seconds(secs))
    }

    /// Stop the ringing when the alarm being cancelled is the one ringing.
    pub fn with_silencer(mut self, silencer: Arc<dyn Silencer>) -> Self {
        self.silencer = Some(silencer);
        self
    }

    pub fn with_past_tolerance(mut self, tolerance: Duration) -> Self {
        self.past_tolerance = tolerance;
        self
    }

    /// Parse `DayName/YYYY-MM-DD/HH:MM`, validate it against `now` and
    /// register it with the facility.
    pub fn parse_and_schedule<Tz>(
        &self,
        raw: &str,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Confirmation, SchedulingError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        debug!(raw = %raw, "Parsing alarm payload");
        let request = AlarmRequest::parse(raw)?;
        self.schedule(&request, now, tz)
    }

    /// Validate an already parsed request and register it.
    pub fn schedule<Tz>(
        &self,
        request: &AlarmRequest,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Confirmation, SchedulingError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let trigger_local = self.trigger_instant(request, tz)?;
        let trigger_at = trigger_local.with_timezone(&Utc);
        let delta_ms = self.check_not_stale(trigger_at, now)?;

        let alarm = ScheduledAlarm {
            id: AlarmId::from_trigger(trigger_at),
            trigger_at,
        };
        self.facility
            .register_exact_oneshot(alarm.trigger_at, alarm.id)?;

        let confirmation = Confirmation::new(&trigger_local, delta_ms);
        info!(
            id = %alarm.id,
            day = %request.day_name,
            trigger_at = %alarm.trigger_at,
            time_until = %confirmation.time_until,
            "Alarm scheduled"
        );
        Ok(confirmation)
    }

    /// Withdraw an alarm, silencing it if it is the one ringing. Never fails.
    pub fn cancel(&self, id: AlarmId) {
        self.facility.cancel(id);
        if let Some(silencer) = &self.silencer {
            if silencer.silence(id) {
                debug!(%id, "Ringing stopped on cancel");
            }
        }
    }

    /// Interpret the requested wall-clock time in `tz`.
    fn trigger_instant<Tz: TimeZone>(
        &self,
        request: &AlarmRequest,
        tz: &Tz,
    ) -> Result<DateTime<Tz>, SchedulingError> {
        let local = request.local_date_time();
        tz.from_local_datetime(&local).earliest().ok_or_else(|| {
            SchedulingError::InvalidDateTime(local.format("%Y-%m-%d %H:%M").to_string())
        })
    }

    /// Signed distance to the trigger in milliseconds, rejecting alarms more
    /// than the tolerance in the past.
    fn check_not_stale(
        &self,
        trigger_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<i64, SchedulingError> {
        let delta_ms = (trigger_at - now).num_milliseconds();
        if delta_ms > 0 {
            return Ok(delta_ms);
        }
        if delta_ms > -self.past_tolerance.num_milliseconds() {
            info!(delta_ms, "Alarm time just passed, scheduling anyway");
            return Ok(delta_ms);
        }
        let minutes_ago = -delta_ms / 60_000;
        warn!(delta_ms, minutes_ago, "Alarm time is in the past");
        Err(SchedulingError::PastTime { minutes_ago })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::registry::AlarmRegistry;
    use crate::alarm::ringing::testing::RecordingPresenter;
    use crate::alarm::ringing::RingingSlot;
    use crate::types::AlarmStatus;
    use chrono::FixedOffset;
    use voxchat_core::error::VoxchatError;

    /// 2025-01-15T10:00:00 in UTC.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
    }

    fn scheduler() -> (AlarmScheduler, Arc<AlarmRegistry>) {
        let registry = Arc::new(AlarmRegistry::new());
        (AlarmScheduler::new(registry.clone()), registry)
    }

    struct FailingFacility;

    impl AlarmFacility for FailingFacility {
        fn register_exact_oneshot(
            &self,
            _trigger_at: DateTime<Utc>,
            _id: AlarmId,
        ) -> voxchat_core::Result<()> {
            Err(VoxchatError::Storage("alarm service unavailable".to_string()))
        }

        fn cancel(&self, _id: AlarmId) {}
    }

    #[test]
    fn test_future_alarm_scheduled() {
        let (scheduler, registry) = scheduler();
        let confirmation = scheduler
            .parse_and_schedule("Wednesday/2025-01-15/15:30", now(), &Utc)
            .unwrap();

        assert_eq!(confirmation.formatted_time, "Wednesday, Jan 15 at 03:30 pm");
        assert_eq!(confirmation.time_until, "5 hours and 30 minutes");
        assert_eq!(
            confirmation.to_string(),
            "Alarm set for Wednesday, Jan 15 at 03:30 pm in 5 hours and 30 minutes"
        );

        let trigger = Utc.with_ymd_and_hms(2025, 1, 15, 15, 30, 0).unwrap();
        let entry = registry.get(AlarmId::from_trigger(trigger)).unwrap();
        assert_eq!(entry.trigger_at, trigger);
        assert_eq!(entry.status, AlarmStatus::Scheduled);
    }

    #[test]
    fn test_125_minutes_ahead() {
        let (scheduler, _) = scheduler();
        let confirmation = scheduler
            .parse_and_schedule("Wednesday/2025-01-15/12:05", now(), &Utc)
            .unwrap();
        assert_eq!(confirmation.time_until, "2 hours and 5 minutes");
    }

    #[test]
    fn test_under_an_hour_ahead() {
        let (scheduler, _) = scheduler();
        let confirmation = scheduler
            .parse_and_schedule("Wednesday/2025-01-15/10:45", now(), &Utc)
            .unwrap();
        assert_eq!(confirmation.time_until, "45 minutes");
    }

    #[test]
    fn test_one_hour_in_past_rejected() {
        let (scheduler, registry) = scheduler();
        let err = scheduler
            .parse_and_schedule("Wednesday/2025-01-15/09:00", now(), &Utc)
            .unwrap_err();
        assert!(matches!(err, SchedulingError::PastTime { minutes_ago: 60 }));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_thirty_seconds_in_past_accepted() {
        let (scheduler, registry) = scheduler();
        let now = now() + Duration::seconds(30);
        let confirmation = scheduler
            .parse_and_schedule("Wednesday/2025-01-15/10:00", now, &Utc)
            .unwrap();
        assert_eq!(confirmation.time_until, "0 minutes");
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_exactly_now_accepted() {
        let (scheduler, _) = scheduler();
        assert!(scheduler
            .parse_and_schedule("Wednesday/2025-01-15/10:00", now(), &Utc)
            .is_ok());
    }

    #[test]
    fn test_tolerance_boundary() {
        let (scheduler, _) = scheduler();
        let just_inside = now() + Duration::milliseconds(59_999);
        assert!(scheduler
            .parse_and_schedule("Wednesday/2025-01-15/10:00", just_inside, &Utc)
            .is_ok());

        let at_limit = now() + Duration::seconds(60);
        let err = scheduler
            .parse_and_schedule("Wednesday/2025-01-15/10:00", at_limit, &Utc)
            .unwrap_err();
        assert!(matches!(err, SchedulingError::PastTime { minutes_ago: 1 }));
    }

    #[test]
    fn test_minutes_ago_floors() {
        let (scheduler, _) = scheduler();
        let now = now() + Duration::seconds(150);
        let err = scheduler
            .parse_and_schedule("Wednesday/2025-01-15/10:00", now, &Utc)
            .unwrap_err();
        assert!(matches!(err, SchedulingError::PastTime { minutes_ago: 2 }));
    }

    #[test]
    fn test_custom_tolerance() {
        let registry = Arc::new(AlarmRegistry::new());
        let config = AlarmConfig {
            past_tolerance_secs: 300,
            ..AlarmConfig::default()
        };
        let scheduler = AlarmScheduler::from_config(registry, &config);
        let now = now() + Duration::minutes(4);
        assert!(scheduler
            .parse_and_schedule("Wednesday/2025-01-15/10:00", now, &Utc)
            .is_ok());
    }

    #[test]
    fn test_trigger_interpreted_in_local_timezone() {
        let (scheduler, registry) = scheduler();
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        // 15:30 at UTC+2 is 13:30 UTC.
        let confirmation = scheduler
            .parse_and_schedule("Wednesday/2025-01-15/15:30", now(), &tz)
            .unwrap();
        assert_eq!(confirmation.formatted_time, "Wednesday, Jan 15 at 03:30 pm");
        assert_eq!(confirmation.time_until, "3 hours and 30 minutes");

        let trigger = Utc.with_ymd_and_hms(2025, 1, 15, 13, 30, 0).unwrap();
        assert!(registry.get(AlarmId::from_trigger(trigger)).is_ok());
    }

    #[test]
    fn test_parse_errors_propagate() {
        let (scheduler, registry) = scheduler();
        assert!(matches!(
            scheduler.parse_and_schedule("Monday/2025-01-15", now(), &Utc),
            Err(SchedulingError::MalformedFormat { .. })
        ));
        assert!(matches!(
            scheduler.parse_and_schedule("monday/2025-01-15/15:30", now(), &Utc),
            Err(SchedulingError::InvalidDayName(_))
        ));
        assert!(matches!(
            scheduler.parse_and_schedule("Monday/2025-01-15/25:00", now(), &Utc),
            Err(SchedulingError::InvalidDateTime(_))
        ));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_mismatched_day_name_still_scheduled() {
        let (scheduler, _) = scheduler();
        let confirmation = scheduler
            .parse_and_schedule("Friday/2025-01-15/15:30", now(), &Utc)
            .unwrap();
        // The confirmation reports the real weekday of the date.
        assert!(confirmation.formatted_time.starts_with("Wednesday"));
    }

    #[test]
    fn test_facility_failure_wrapped() {
        let scheduler = AlarmScheduler::new(Arc::new(FailingFacility));
        let err = scheduler
            .parse_and_schedule("Wednesday/2025-01-15/15:30", now(), &Utc)
            .unwrap_err();
        assert!(matches!(err, SchedulingError::SchedulingFailure(_)));
        assert!(err.to_string().starts_with("Error setting alarm:"));
    }

    #[test]
    fn test_duplicate_requests_collapse() {
        let (scheduler, registry) = scheduler();
        scheduler
            .parse_and_schedule("Wednesday/2025-01-15/15:30", now(), &Utc)
            .unwrap();
        scheduler
            .parse_and_schedule("Wednesday/2025-01-15/15:30", now(), &Utc)
            .unwrap();
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_cancel_twice_is_fine() {
        let (scheduler, registry) = scheduler();
        scheduler
            .parse_and_schedule("Wednesday/2025-01-15/15:30", now(), &Utc)
            .unwrap();
        let id = registry.list()[0].id;

        scheduler.cancel(id);
        scheduler.cancel(id);
        assert_eq!(registry.get(id).unwrap().status, AlarmStatus::Cancelled);

        scheduler.cancel(AlarmId(12345));
    }

    #[test]
    fn test_cancel_stops_ringing() {
        let registry = Arc::new(AlarmRegistry::new());
        let slot = Arc::new(RingingSlot::new(RecordingPresenter::default()));
        let scheduler = AlarmScheduler::new(registry.clone()).with_silencer(slot.clone());

        scheduler
            .parse_and_schedule("Wednesday/2025-01-15/15:30", now(), &Utc)
            .unwrap();
        let id = registry.list()[0].id;
        registry.mark(id, AlarmStatus::Fired).unwrap();
        slot.start(id);
        registry.mark(id, AlarmStatus::Ringing).unwrap();

        scheduler.cancel(id);
        assert_eq!(slot.ringing(), None);
        assert_eq!(registry.get(id).unwrap().status, AlarmStatus::Dismissed);
        assert_eq!(
            slot.presenter().events(),
            vec![format!("start {}", id), format!("stop {}", id)]
        );
    }

    #[test]
    fn test_cancel_other_alarm_keeps_ringing() {
        let registry = Arc::new(AlarmRegistry::new());
        let slot = Arc::new(RingingSlot::new(RecordingPresenter::default()));
        let scheduler = AlarmScheduler::new(registry.clone()).with_silencer(slot.clone());

        scheduler
            .parse_and_schedule("Wednesday/2025-01-15/15:30", now(), &Utc)
            .unwrap();
        scheduler
            .parse_and_schedule("Wednesday/2025-01-15/18:00", now(), &Utc)
            .unwrap();
        let ringing = registry.list()[0].id;
        let later = registry.list()[1].id;
        registry.mark(ringing, AlarmStatus::Fired).unwrap();
        slot.start(ringing);
        registry.mark(ringing, AlarmStatus::Ringing).unwrap();

        scheduler.cancel(later);
        assert_eq!(slot.ringing(), Some(ringing));
        assert_eq!(registry.get(ringing).unwrap().status, AlarmStatus::Ringing);
        assert_eq!(registry.get(later).unwrap().status, AlarmStatus::Cancelled);
        assert_eq!(slot.presenter().events(), vec![format!("start {}", ringing)]);
    }

    #[test]
    fn test_local_time_in_dst_gap_rejected() {
        let (scheduler, registry) = scheduler();
        let now = Utc.with_ymd_and_hms(2025, 3, 29, 12, 0, 0).unwrap();
        let err = scheduler
            .parse_and_schedule("Sunday/2025-03-30/02:30", now, &chrono_tz::Europe::Berlin)
            .unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidDateTime(ref s) if s == "2025-03-30 02:30"));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_ambiguous_local_time_uses_earliest() {
        let (scheduler, registry) = scheduler();
        let now = Utc.with_ymd_and_hms(2025, 10, 25, 22, 30, 0).unwrap();
        let confirmation = scheduler
            .parse_and_schedule("Sunday/2025-10-26/02:30", now, &chrono_tz::Europe::Berlin)
            .unwrap();

        // 02:30 happens at 00:30 UTC (CEST) and again at 01:30 UTC (CET).
        let earliest = Utc.with_ymd_and_hms(2025, 10, 26, 0, 30, 0).unwrap();
        assert_eq!(registry.list()[0].trigger_at, earliest);
        assert_eq!(confirmation.formatted_time, "Sunday, Oct 26 at 02:30 am");
        assert_eq!(confirmation.time_until, "2 hours and 0 minutes");
    }
}
