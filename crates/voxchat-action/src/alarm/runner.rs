//! Background loop that fires due alarms.
//!
//! Sleeps until the earliest scheduled alarm, fires it (Scheduled -> Fired),
//! hands it to the ringing slot (Fired -> Ringing) and goes back to sleep.
//! Registrations through the same registry wake the loop early; alarms added
//! by other processes sharing the registry file are picked up on the next
//! recheck.

use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::alarm::registry::AlarmRegistry;
use crate::alarm::ringing::{RingingPresenter, RingingSlot};
use crate::facility::Clock;
use crate::types::{AlarmId, AlarmStatus};

const DEFAULT_RECHECK: std::time::Duration = std::time::Duration::from_secs(60);

/// Fires registered alarms when their trigger instant passes.
pub struct AlarmRunner<P: RingingPresenter> {
    registry: Arc<AlarmRegistry>,
    ringing: Arc<RingingSlot<P>>,
    clock: Arc<dyn Clock>,
    recheck: std::time::Duration,
    shutdown: Arc<Notify>,
}

impl<P: RingingPresenter> AlarmRunner<P> {
    pub fn new(
        registry: Arc<AlarmRegistry>,
        ringing: Arc<RingingSlot<P>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            ringing,
            clock,
            recheck: DEFAULT_RECHECK,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Longest sleep between looks at the registry.
    pub fn with_recheck(mut self, recheck: std::time::Duration) -> Self {
        self.recheck = recheck;
        self
    }

    /// Run until [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self) {
        let changed = self.registry.changed();
        loop {
            let now = self.clock.now();
            for entry in self.registry.due(now) {
                self.fire(entry.id);
            }

            let delay = match self.registry.next_scheduled() {
                Some(next) => (next.trigger_at - now)
                    .to_std()
                    .unwrap_or(std::time::Duration::ZERO)
                    .min(self.recheck),
                None => self.recheck,
            };
            debug!(delay_ms = delay.as_millis() as u64, "Alarm runner sleeping");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = changed.notified() => {}
                _ = self.shutdown.notified() => {
                    info!("Alarm runner stopped");
                    return;
                }
            }
        }
    }

    /// Signal the runner to shut down gracefully.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Dismiss the ringing alarm from the ringing screen.
    pub fn dismiss(&self) -> Option<AlarmId> {
        let id = self.ringing.stop()?;
        if let Err(e) = self.registry.mark(id, AlarmStatus::Dismissed) {
            warn!(%id, error = %e, "Failed to record alarm dismissal");
        }
        Some(id)
    }

    fn fire(&self, id: AlarmId) {
        if let Err(e) = self.registry.mark(id, AlarmStatus::Fired) {
            warn!(%id, error = %e, "Failed to fire alarm");
            return;
        }
        info!(%id, "Alarm fired");

        // Whatever was ringing before is silenced by the slot; record that.
        if let Some(previous) = self.ringing.ringing() {
            if let Err(e) = self.registry.mark(previous, AlarmStatus::Dismissed) {
                debug!(%previous, error = %e, "Previous alarm already finished");
            }
        }
        self.ringing.start(id);
        if let Err(e) = self.registry.mark(id, AlarmStatus::Ringing) {
            warn!(%id, error = %e, "Failed to record ringing alarm");
        }
    }
}
