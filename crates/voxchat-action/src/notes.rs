//! Note storage.
//!
//! Notes are an ordered list of strings. The file-backed store rewrites the
//! whole list as a JSON array on every change; the last writer wins.

use chrono::{DateTime, TimeZone};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use voxchat_core::error::VoxchatError;

use crate::error::NoteError;

/// Where saved notes go.
pub trait NoteStore: Send + Sync {
    /// Append a note. Blank content is rejected.
    fn append(&self, content: &str) -> Result<(), NoteError>;
    /// All notes, oldest first.
    fn list(&self) -> Result<Vec<String>, NoteError>;
    /// Replace the note at `index`.
    fn update(&self, index: usize, content: &str) -> Result<(), NoteError>;
    /// Remove and return the note at `index`.
    fn remove(&self, index: usize) -> Result<String, NoteError>;
}

/// List of notes, optionally persisted to a JSON file.
///
/// A file-backed book re-reads the file before every operation and only
/// adopts a change once it has been written.
pub struct NoteBook {
    notes: Mutex<Vec<String>>,
    path: Option<PathBuf>,
}

impl Default for NoteBook {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteBook {
    /// Create an empty, memory-only note book.
    pub fn new() -> Self {
        Self {
            notes: Mutex::new(Vec::new()),
            path: None,
        }
    }

    /// Open a note book backed by `path`, loading it if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> voxchat_core::Result<Self> {
        let path = path.into();
        let notes = read_notes(&path)?;
        info!(path = %path.display(), notes = notes.len(), "Note book opened");
        Ok(Self {
            notes: Mutex::new(notes),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<String>>, NoteError> {
        let mut notes = self
            .notes
            .lock()
            .map_err(|e| NoteError::from(VoxchatError::Storage(format!("Lock poisoned: {}", e))))?;
        if let Some(path) = &self.path {
            match read_notes(path) {
                Ok(on_disk) => *notes = on_disk,
                Err(e) => warn!(path = %path.display(), error = %e, "Notes file unreadable, using cached notes"),
            }
        }
        Ok(notes)
    }

    /// Apply `change` to a copy of the notes and adopt it once persisted.
    fn commit<T>(
        &self,
        change: impl FnOnce(&mut Vec<String>) -> Result<T, NoteError>,
    ) -> Result<T, NoteError> {
        let mut notes = self.lock()?;
        let mut next = notes.clone();
        let out = change(&mut next)?;
        if let Some(path) = &self.path {
            write_notes(path, &next)?;
        }
        *notes = next;
        Ok(out)
    }
}

fn read_notes(path: &Path) -> voxchat_core::Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

fn write_notes(path: &Path, notes: &[String]) -> voxchat_core::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(notes)?)?;
    Ok(())
}

fn non_blank(content: &str) -> Result<&str, NoteError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Err(NoteError::Empty)
    } else {
        Ok(trimmed)
    }
}

impl NoteStore for NoteBook {
    fn append(&self, content: &str) -> Result<(), NoteError> {
        let content = non_blank(content)?;
        let total = self.commit(|notes| {
            notes.push(content.to_string());
            Ok(notes.len())
        })?;
        info!(text_len = content.len(), total, "Note saved");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, NoteError> {
        Ok(self.lock()?.clone())
    }

    fn update(&self, index: usize, content: &str) -> Result<(), NoteError> {
        let content = non_blank(content)?;
        self.commit(|notes| {
            let len = notes.len();
            let slot = notes
                .get_mut(index)
                .ok_or(NoteError::IndexOutOfRange { index, len })?;
            *slot = content.to_string();
            Ok(())
        })?;
        debug!(index, "Note updated");
        Ok(())
    }

    fn remove(&self, index: usize) -> Result<String, NoteError> {
        let removed = self.commit(|notes| {
            let len = notes.len();
            if index >= len {
                return Err(NoteError::IndexOutOfRange { index, len });
            }
            Ok(notes.remove(index))
        })?;
        debug!(index, "Note removed");
        Ok(removed)
    }
}

/// Render notes as a Markdown bullet list.
pub fn export_markdown(notes: &[String]) -> String {
    notes
        .iter()
        .map(|n| format!("- {}", n))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A note recording one exchange, stamped with the local time.
pub fn conversation_note<Tz: TimeZone>(user: &str, reply: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let stamp = at.format("%d.%m.%Y %H:%M");
    format!("[{stamp}] You: {user}\n[{stamp}] Bot: {reply}")
}
