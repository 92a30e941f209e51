//! Alarm scheduling, firing and ringing.

pub mod confirmation;
pub mod lifecycle;
pub mod registry;
pub mod request;
pub mod ringing;
pub mod runner;
pub mod scheduler;

pub use confirmation::Confirmation;
pub use registry::AlarmRegistry;
pub use request::{AlarmRequest, DayName};
pub use ringing::{RingingPresenter, RingingSlot, Silencer};
pub use runner::AlarmRunner;
pub use scheduler::AlarmScheduler;
