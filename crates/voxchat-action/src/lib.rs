//! Response dispatch engine for Voxchat.
//!
//! Classifies assistant responses by their command tag, schedules one-shot
//! alarms, saves notes, and drives the alarm lifecycle from scheduling through
//! ringing to dismissal.

pub mod alarm;
pub mod dispatch;
pub mod error;
pub mod facility;
pub mod notes;
pub mod router;
pub mod session;
pub mod types;

pub use alarm::{AlarmRegistry, AlarmRunner, AlarmScheduler, Confirmation};
pub use dispatch::Dispatcher;
pub use error::{AlarmError, NoteError, SchedulingError, TransportError};
pub use facility::{AlarmFacility, Clock, FixedClock, SystemClock};
pub use notes::{NoteBook, NoteStore};
pub use router::{classify, Command};
pub use session::{ChatLog, Session, Transport};
pub use types::{AlarmEntry, AlarmId, AlarmStatus, ChatEntry, ChatRole, Outcome};
