//! Cooperative round-robin duty scheduler
//!
//! One pass scans the table in registration order and runs every enabled
//! duty that is due. Duties run to completion; nothing is preempted, so a
//! slow duty delays everything behind it, including the rearming of time
//! triggers.

use core::iter::{Enumerate, Flatten};
use core::slice;

use log::{debug, warn};

use super::task::{Duty, DutyInfo, DutySlot, SignalFlag, SlotId, Trigger};
use super::{Result, ScheduleError};
use crate::config::MAX_DUTIES;
use crate::os::{timeout, Clock, Duration};

pub struct Scheduler<'a, C: Clock, const N: usize = MAX_DUTIES> {
    slots: [Option<DutySlot<'a>>; N],
    len: usize,
    clock: C,
}

impl<'a, C: Clock, const N: usize> Scheduler<'a, C, N> {
    pub fn new(clock: C) -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
            len: 0,
            clock,
        }
    }

    /// Register a duty that runs every `period`.
    ///
    /// The first run happens one full period after registration.
    pub fn register_time_task(
        &mut self,
        duty: Duty<'a>,
        period: Duration,
        enabled: bool,
    ) -> Result<SlotId> {
        let last_run = self.clock.now();
        let id = self.insert(DutySlot::new(duty, Trigger::Time { period, last_run }, enabled))?;
        debug!(
            "duty {} registered: every {} us, enabled={}",
            id,
            period.as_micros(),
            enabled
        );
        Ok(id)
    }

    /// Register a duty that runs whenever `flag` is raised
    pub fn register_signal_task(
        &mut self,
        duty: Duty<'a>,
        flag: &'a SignalFlag,
        enabled: bool,
    ) -> Result<SlotId> {
        let id = self.insert(DutySlot::new(duty, Trigger::Signal(flag), enabled))?;
        debug!("duty {} registered: on signal, enabled={}", id, enabled);
        Ok(id)
    }

    fn insert(&mut self, slot: DutySlot<'a>) -> Result<SlotId> {
        if self.len >= N {
            warn!("duty table full ({} slots), registration rejected", N);
            return Err(ScheduleError::CapacityExceeded);
        }
        let id = u8::try_from(self.len).map_err(|_| ScheduleError::CapacityExceeded)?;
        self.slots[self.len] = Some(slot);
        self.len += 1;
        Ok(SlotId(id))
    }

    /// Toggle a slot without removing it. Returns `false` for an unknown id.
    pub fn set_enabled(&mut self, id: SlotId, enabled: bool) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Scan the table once. Returns how many duties ran.
    pub fn run_pass(&mut self) -> usize {
        let mut ran = 0;

        for slot in self.slots[..self.len].iter_mut().flatten() {
            if !slot.enabled {
                continue;
            }

            let due = match &slot.trigger {
                Trigger::Signal(flag) => flag.is_raised(),
                Trigger::Time { period, last_run } => {
                    timeout(self.clock.now(), *last_run, *period)
                }
            };
            if !due {
                continue;
            }

            let started = self.clock.now();
            (slot.duty)();
            let finished = self.clock.now();
            slot.record_run(finished.wrapping_sub(started));

            match &mut slot.trigger {
                Trigger::Signal(flag) => flag.clear(),
                // sampled after the run: overruns shift the cadence instead
                // of compounding into back-to-back runs
                Trigger::Time { last_run, .. } => *last_run = finished,
            }
            ran += 1;
        }

        ran
    }

    pub fn run_forever(&mut self) -> ! {
        loop {
            self.run_pass();
        }
    }

    /// Like [`run_forever`](Self::run_forever), rolling the run-time
    /// accounting over every `window` and handing the table to `report`.
    pub fn run_forever_with_accounting<F>(&mut self, window: Duration, mut report: F) -> !
    where
        F: FnMut(&Self),
    {
        let mut accounting = AccountingWindow::new(window, self.clock.now());
        loop {
            self.run_pass();
            accounting.service(self, &mut report);
        }
    }

    /// Copy each slot's accumulated run time into its last-window counter
    /// and restart accumulation.
    pub fn snapshot_and_reset_accounting(&mut self) {
        for slot in self.slots[..self.len].iter_mut().flatten() {
            slot.roll_window();
        }
    }

    pub fn slot_info(&self, id: SlotId) -> Option<DutyInfo> {
        self.slot(id).map(DutySlot::info)
    }

    /// Snapshots of every registered slot, in registration order
    pub fn slots(&self) -> Slots<'_, 'a> {
        Slots {
            inner: self.slots[..self.len].iter().flatten().enumerate(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn now(&self) -> u32 {
        self.clock.now()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn slot(&self, id: SlotId) -> Option<&DutySlot<'a>> {
        self.slots[..self.len].get(id.index())?.as_ref()
    }

    fn slot_mut(&mut self, id: SlotId) -> Option<&mut DutySlot<'a>> {
        self.slots[..self.len].get_mut(id.index())?.as_mut()
    }
}

/// Periodic rollover of the run-time accounting
pub struct AccountingWindow {
    period: Duration,
    started: u32,
}

impl AccountingWindow {
    pub fn new(period: Duration, now: u32) -> Self {
        Self {
            period,
            started: now,
        }
    }

    /// Roll the accounting over if the window elapsed. Returns `true` when
    /// it did and `report` was called.
    pub fn service<'a, C, F, const N: usize>(
        &mut self,
        scheduler: &mut Scheduler<'a, C, N>,
        report: &mut F,
    ) -> bool
    where
        C: Clock,
        F: FnMut(&Scheduler<'a, C, N>),
    {
        let now = scheduler.now();
        if !timeout(now, self.started, self.period) {
            return false;
        }
        scheduler.snapshot_and_reset_accounting();
        report(scheduler);
        self.started = now;
        true
    }
}

/// Iterator returned by [`Scheduler::slots`]
pub struct Slots<'s, 'a> {
    inner: Enumerate<Flatten<slice::Iter<'s, Option<DutySlot<'a>>>>>,
}

impl Iterator for Slots<'_, '_> {
    type Item = (SlotId, DutyInfo);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(i, slot)| (SlotId(i as u8), slot.info()))
    }
}

/// Fluent registration
pub struct TaskBuilder<'a> {
    function: Option<Duty<'a>>,
    trigger: Option<BuilderTrigger<'a>>,
    enabled: bool,
}

enum BuilderTrigger<'a> {
    Period(Duration),
    Signal(&'a SignalFlag),
}

impl<'a> TaskBuilder<'a> {
    pub fn new() -> Self {
        Self {
            function: None,
            trigger: None,
            enabled: true,
        }
    }

    pub fn function(mut self, function: Duty<'a>) -> Self {
        self.function = Some(function);
        self
    }

    pub fn period(mut self, period: Duration) -> Self {
        self.trigger = Some(BuilderTrigger::Period(period));
        self
    }

    pub fn signal(mut self, flag: &'a SignalFlag) -> Self {
        self.trigger = Some(BuilderTrigger::Signal(flag));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn build<C: Clock, const N: usize>(
        self,
        scheduler: &mut Scheduler<'a, C, N>,
    ) -> Result<SlotId> {
        let function = self.function.ok_or(ScheduleError::MissingCallable)?;
        match self.trigger.ok_or(ScheduleError::MissingTrigger)? {
            BuilderTrigger::Period(period) => {
                scheduler.register_time_task(function, period, self.enabled)
            }
            BuilderTrigger::Signal(flag) => {
                scheduler.register_signal_task(function, flag, self.enabled)
            }
        }
    }
}

impl Default for TaskBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
