//! Duty slots and their triggers

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::os::Duration;

/// A registered duty: any zero-argument callable that runs to completion
pub type Duty<'a> = &'a mut dyn FnMut();

/// Boolean hand-off between an interrupt (producer) and the scheduler
/// (consumer).
///
/// Only plain loads and stores are used, so it works on targets without
/// atomic read-modify-write. A flag raised twice before the scheduler
/// clears it is observed once.
#[derive(Debug, Default)]
pub struct SignalFlag(AtomicBool);

impl SignalFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Mark the flag. Safe to call from interrupt context.
    #[inline]
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Stable index of a slot in the duty table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(pub(crate) u8);

impl SlotId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl ufmt::uDisplay for SlotId {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        ufmt::uwrite!(f, "#{}", self.0)
    }
}

/// What makes a duty due. Fixed at registration.
pub enum Trigger<'a> {
    /// Due once `period` has elapsed since `last_run`
    Time { period: Duration, last_run: u32 },
    /// Due while the flag is raised; cleared after the duty ran
    Signal(&'a SignalFlag),
}

impl Trigger<'_> {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::Time { .. } => TriggerKind::Time,
            Trigger::Signal(_) => TriggerKind::Signal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerKind {
    Time,
    Signal,
}

/// One entry of the duty table
pub struct DutySlot<'a> {
    pub(crate) duty: Duty<'a>,
    pub(crate) trigger: Trigger<'a>,
    pub(crate) enabled: bool,
    /// Run time summed since the last accounting snapshot (us)
    pub(crate) accumulated_run_time: u32,
    /// Run time of the previous accounting window (us)
    pub(crate) last_window_run_time: u32,
    pub(crate) runs: u32,
}

impl<'a> DutySlot<'a> {
    pub(crate) fn new(duty: Duty<'a>, trigger: Trigger<'a>, enabled: bool) -> Self {
        Self {
            duty,
            trigger,
            enabled,
            accumulated_run_time: 0,
            last_window_run_time: 0,
            runs: 0,
        }
    }

    pub(crate) fn record_run(&mut self, elapsed: u32) {
        self.accumulated_run_time = self.accumulated_run_time.wrapping_add(elapsed);
        self.runs = self.runs.wrapping_add(1);
    }

    pub(crate) fn roll_window(&mut self) {
        self.last_window_run_time = self.accumulated_run_time;
        self.accumulated_run_time = 0;
    }

    pub fn info(&self) -> DutyInfo {
        DutyInfo {
            kind: self.trigger.kind(),
            enabled: self.enabled,
            period: match self.trigger {
                Trigger::Time { period, .. } => Some(period),
                Trigger::Signal(_) => None,
            },
            accumulated_run_time: self.accumulated_run_time,
            last_window_run_time: self.last_window_run_time,
            runs: self.runs,
        }
    }
}

/// Read-only snapshot of a slot, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyInfo {
    pub kind: TriggerKind,
    pub enabled: bool,
    pub period: Option<Duration>,
    pub accumulated_run_time: u32,
    pub last_window_run_time: u32,
    pub runs: u32,
}
