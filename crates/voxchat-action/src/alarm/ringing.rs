//! Ownership of the "currently ringing" side effect.
//!
//! The presentation layer hands back an owned handle when it starts sound or
//! vibration and takes it back to stop. `RingingSlot` keeps at most one such
//! handle, so starting a second alarm always silences the first.

use std::sync::Mutex;
use tracing::{info, warn};

use crate::types::AlarmId;

/// Presentation layer that can ring for an alarm.
pub trait RingingPresenter: Send + Sync {
    /// Whatever the presenter needs to stop this particular ringing.
    type Handle: Send;

    fn start_ringing(&self, alarm: AlarmId) -> Self::Handle;
    fn stop_ringing(&self, handle: Self::Handle);
}

/// Anything that can silence a ringing alarm.
pub trait Silencer: Send + Sync {
    /// Stop ringing if `alarm` is the one ringing. Returns whether it was.
    fn silence(&self, alarm: AlarmId) -> bool;
}

/// Single-owner holder for the active ringing handle.
pub struct RingingSlot<P: RingingPresenter> {
    presenter: P,
    active: Mutex<Option<(AlarmId, P::Handle)>>,
}

impl<P: RingingPresenter> RingingSlot<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            active: Mutex::new(None),
        }
    }

    /// Start ringing for `alarm`, stopping whatever was ringing before.
    pub fn start(&self, alarm: AlarmId) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((previous, handle)) = active.take() {
            warn!(%previous, next = %alarm, "Alarm still ringing, stopping it first");
            self.presenter.stop_ringing(handle);
        }
        let handle = self.presenter.start_ringing(alarm);
        *active = Some((alarm, handle));
        info!(%alarm, "Alarm ringing");
    }

    /// Stop ringing. Returns the alarm that was silenced, if any.
    pub fn stop(&self) -> Option<AlarmId> {
        let taken = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let (alarm, handle) = taken?;
        self.presenter.stop_ringing(handle);
        info!(%alarm, "Alarm silenced");
        Some(alarm)
    }

    /// Stop ringing only if `alarm` is the one ringing.
    pub fn stop_if(&self, alarm: AlarmId) -> bool {
        let taken = {
            let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            let is_ringing = matches!(active.as_ref(), Some((ringing, _)) if *ringing == alarm);
            if is_ringing {
                active.take()
            } else {
                None
            }
        };
        let Some((_, handle)) = taken else {
            return false;
        };
        self.presenter.stop_ringing(handle);
        info!(%alarm, "Alarm silenced");
        true
    }

    /// The alarm currently ringing.
    pub fn ringing(&self) -> Option<AlarmId> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|(alarm, _)| *alarm)
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}

impl<P: RingingPresenter> Silencer for RingingSlot<P> {
    fn silence(&self, alarm: AlarmId) -> bool {
        self.stop_if(alarm)
    }
}
