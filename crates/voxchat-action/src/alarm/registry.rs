//! In-process alarm facility.
//!
//! Tracks every registration with its lifecycle state. When opened on a file,
//! the file is the source of truth: every operation re-reads it, and every
//! change is written to a copy of the table that only replaces the in-memory
//! one after it reached disk. Several processes can share one file this way
//! (a `watch` loop and one-shot `dispatch` calls), with the last writer of a
//! given moment winning.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use voxchat_core::error::VoxchatError;

use crate::alarm::lifecycle::{cancel_target, validate_transition};
use crate::error::AlarmError;
use crate::facility::AlarmFacility;
use crate::types::{AlarmEntry, AlarmId, AlarmStatus};

type AlarmTable = BTreeMap<AlarmId, AlarmEntry>;

/// Alarm table keyed by id.
pub struct AlarmRegistry {
    entries: Mutex<AlarmTable>,
    path: Option<PathBuf>,
    changed: Arc<Notify>,
}

impl Default for AlarmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmRegistry {
    /// Create an empty, memory-only registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            path: None,
            changed: Arc::new(Notify::new()),
        }
    }

    /// Open a registry backed by `path`, loading it if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> voxchat_core::Result<Self> {
        let path = path.into();
        let entries = read_table(&path)?;
        info!(path = %path.display(), alarms = entries.len(), "Alarm registry opened");
        Ok(Self {
            entries: Mutex::new(entries),
            path: Some(path),
            changed: Arc::new(Notify::new()),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Handle notified whenever this registry adds or withdraws a registration.
    /// Changes made through another handle on the same file are not signalled.
    pub fn changed(&self) -> Arc<Notify> {
        Arc::clone(&self.changed)
    }

    /// Get an alarm by id.
    pub fn get(&self, id: AlarmId) -> Result<AlarmEntry, AlarmError> {
        self.lock_synced()?
            .get(&id)
            .cloned()
            .ok_or(AlarmError::NotFound(id))
    }

    /// All known alarms, earliest trigger first.
    pub fn list(&self) -> Vec<AlarmEntry> {
        let entries = match self.lock_synced() {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "Alarm table unavailable, listing nothing");
                return vec![];
            }
        };
        let mut list: Vec<AlarmEntry> = entries.values().cloned().collect();
        list.sort_by_key(|e| (e.trigger_at, e.id));
        list
    }

    /// The scheduled alarm that fires next.
    pub fn next_scheduled(&self) -> Option<AlarmEntry> {
        self.list()
            .into_iter()
            .find(|e| e.status == AlarmStatus::Scheduled)
    }

    /// Scheduled alarms whose trigger instant is at or before `now`.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<AlarmEntry> {
        self.list()
            .into_iter()
            .filter(|e| e.status == AlarmStatus::Scheduled && e.trigger_at <= now)
            .collect()
    }

    /// Move an alarm to `status`, validating the transition.
    pub fn mark(&self, id: AlarmId, status: AlarmStatus) -> Result<AlarmEntry, AlarmError> {
        let mut entries = self.lock_synced()?;
        let mut next = entries.clone();
        let entry = next.get_mut(&id).ok_or(AlarmError::NotFound(id))?;
        validate_transition(entry.status, status)?;
        entry.status = status;
        let updated = entry.clone();

        self.persist(&next)?;
        *entries = next;
        debug!(%id, %status, "Alarm status updated");
        Ok(updated)
    }

    fn lock(&self) -> voxchat_core::Result<MutexGuard<'_, AlarmTable>> {
        self.entries
            .lock()
            .map_err(|e| VoxchatError::Storage(format!("Lock poisoned: {}", e)))
    }

    /// Lock the table after refreshing it from the backing file.
    ///
    /// An unreadable file keeps the cached table so a half-broken file does
    /// not make every alarm disappear.
    fn lock_synced(&self) -> voxchat_core::Result<MutexGuard<'_, AlarmTable>> {
        let mut entries = self.lock()?;
        if let Some(path) = &self.path {
            match read_table(path) {
                Ok(table) => *entries = table,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Alarm file unreadable, using cached table")
                }
            }
        }
        Ok(entries)
    }

    fn persist(&self, entries: &AlarmTable) -> voxchat_core::Result<()> {
        match &self.path {
            Some(path) => write_table(path, entries),
            None => Ok(()),
        }
    }
}

fn read_table(path: &Path) -> voxchat_core::Result<AlarmTable> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    let list: Vec<AlarmEntry> = serde_json::from_str(&content)?;
    Ok(list.into_iter().map(|e| (e.id, e)).collect())
}

/// Write through a sibling temp file so readers never see a partial table.
fn write_table(path: &Path, entries: &AlarmTable) -> voxchat_core::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let list: Vec<&AlarmEntry> = entries.values().collect();
    let json = serde_json::to_string_pretty(&list)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "alarms".to_string());
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl AlarmFacility for AlarmRegistry {
    fn register_exact_oneshot(
        &self,
        trigger_at: DateTime<Utc>,
        id: AlarmId,
    ) -> voxchat_core::Result<()> {
        let mut entries = self.lock_synced()?;
        let mut next = entries.clone();
        let replaced = next
            .insert(
                id,
                AlarmEntry {
                    id,
                    trigger_at,
                    status: AlarmStatus::Scheduled,
                },
            )
            .is_some();
        self.persist(&next)?;
        *entries = next;
        drop(entries);

        info!(%id, trigger_at = %trigger_at, replaced, "Alarm registered");
        self.changed.notify_one();
        Ok(())
    }

    fn cancel(&self, id: AlarmId) {
        let mut entries = match self.lock_synced() {
            Ok(e) => e,
            Err(e) => {
                warn!(%id, error = %e, "Alarm cancel skipped");
                return;
            }
        };
        let Some(status) = entries.get(&id).map(|e| e.status) else {
            debug!(%id, "Cancel for unknown alarm ignored");
            return;
        };
        let Some(target) = cancel_target(status) else {
            debug!(%id, %status, "Cancel for finished alarm ignored");
            return;
        };

        let mut next = entries.clone();
        if let Some(entry) = next.get_mut(&id) {
            entry.status = target;
        }
        if let Err(e) = self.persist(&next) {
            warn!(%id, error = %e, "Failed to persist alarm cancellation");
            return;
        }
        *entries = next;
        drop(entries);

        info!(%id, status = %target, "Alarm withdrawn");
        self.changed.notify_one();
    }
}
