//! Cooperative duty scheduling
//!
//! Duties are registered once at start-up and live for the whole run. The
//! table never shrinks; a slot can only be disabled.

pub mod scheduler;
pub mod task;

use core::fmt;

pub use scheduler::{AccountingWindow, Scheduler, Slots, TaskBuilder};
pub use task::{Duty, DutyInfo, SignalFlag, SlotId, Trigger, TriggerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScheduleError {
    /// The duty table is full; nothing was registered
    CapacityExceeded,
    /// A builder was finished without a callable
    MissingCallable,
    /// A builder was finished without a period or a signal
    MissingTrigger,
}

pub type Result<T> = core::result::Result<T, ScheduleError>;

impl ScheduleError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScheduleError::CapacityExceeded => "duty table full",
            ScheduleError::MissingCallable => "duty without callable",
            ScheduleError::MissingTrigger => "duty without trigger",
        }
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ufmt::uDisplay for ScheduleError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}
