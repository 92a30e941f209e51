//! Response dispatcher.
//!
//! Classifies each assistant response and routes it: alarms to the
//! scheduler, notes to the note store, everything else straight back to the
//! conversation. Every path ends in an [`Outcome`]; failures become
//! user-facing text and are never retried.

use chrono::{DateTime, TimeZone};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::alarm::scheduler::AlarmScheduler;
use crate::facility::Clock;
use crate::notes::NoteStore;
use crate::router::{classify, Command};
use crate::types::{ChatEntry, ChatRole, Outcome};

pub const ALARM_EMPTY_MESSAGE: &str = "Failed to set alarm";
pub const ALARM_EMPTY_SPEECH: &str = "Sorry, I couldn't set the alarm.";
pub const NOTE_EMPTY_MESSAGE: &str = "Cannot save empty note";
pub const NOTE_EMPTY_SPEECH: &str = "Sorry, I couldn't save an empty note.";
pub const NOTE_SAVED_SPEECH: &str = "Note saved successfully.";
pub const NOTE_FAILED_SPEECH: &str = "Sorry, I couldn't save the note.";

/// Routes classified responses to their side effects.
pub struct Dispatcher<Tz: TimeZone> {
    scheduler: AlarmScheduler,
    notes: Arc<dyn NoteStore>,
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl<Tz> Dispatcher<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    pub fn new(
        scheduler: AlarmScheduler,
        notes: Arc<dyn NoteStore>,
        clock: Arc<dyn Clock>,
        tz: Tz,
    ) -> Self {
        Self {
            scheduler,
            notes,
            clock,
            tz,
        }
    }

    pub fn scheduler(&self) -> &AlarmScheduler {
        &self.scheduler
    }

    /// Current time in the dispatcher's timezone.
    pub fn local_now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.tz)
    }

    /// Classify and execute one raw response.
    pub fn handle(&self, response: &str) -> Outcome {
        self.execute(classify(response))
    }

    /// Execute an already classified command.
    pub fn execute(&self, command: Command) -> Outcome {
        match command {
            Command::SetAlarm(payload) => self.set_alarm(&payload),
            Command::SaveNote(content) => self.save_note(&content),
            Command::Say(text) => Outcome {
                entry: ChatEntry::new(ChatRole::Assistant, text.clone()),
                speech: Some(text),
            },
        }
    }

    fn set_alarm(&self, payload: &str) -> Outcome {
        if payload.is_empty() {
            warn!("Alarm command without payload");
            return error_outcome(ALARM_EMPTY_MESSAGE, ALARM_EMPTY_SPEECH);
        }

        let text = match self
            .scheduler
            .parse_and_schedule(payload, self.clock.now(), &self.tz)
        {
            Ok(confirmation) => confirmation.to_string(),
            Err(e) => {
                warn!(payload = %payload, error = %e, "Alarm not scheduled");
                e.to_string()
            }
        };
        Outcome {
            entry: ChatEntry::new(ChatRole::System, text.clone()),
            speech: Some(text),
        }
    }

    fn save_note(&self, content: &str) -> Outcome {
        if content.is_empty() {
            warn!("Note command without content");
            return error_outcome(NOTE_EMPTY_MESSAGE, NOTE_EMPTY_SPEECH);
        }

        match self.notes.append(content) {
            Ok(()) => {
                info!(text_len = content.len(), "Note command handled");
                Outcome {
                    entry: ChatEntry::new(ChatRole::System, format!("Note saved: {}", content)),
                    speech: Some(NOTE_SAVED_SPEECH.to_string()),
                }
            }
            Err(e) => {
                warn!(error = %e, "Note not saved");
                error_outcome(&e.to_string(), NOTE_FAILED_SPEECH)
            }
        }
    }
}

fn error_outcome(message: &str, speech: &str) -> Outcome {
    Outcome {
        entry: ChatEntry::new(ChatRole::Error, message),
        speech: Some(speech.to_string()),
    }
}
