//! System time tracking
//!
//! The tick interrupt is the only writer of the microsecond counter; the
//! main loop only reads it. The MCU has no 32-bit atomics, so the counter
//! sits behind a critical section instead of an `AtomicU32`.

use core::cell::Cell;
use critical_section::Mutex;

/// Anything that can report the current tick in microseconds.
///
/// The counter is expected to wrap at `u32::MAX`; comparisons must go
/// through [`timeout`].
pub trait Clock {
    fn now(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> u32 {
        (**self).now()
    }
}

/// Span of time in microseconds of the tick counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Duration(u32);

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub const fn from_micros(us: u32) -> Self {
        Self(us)
    }

    pub const fn from_millis(ms: u32) -> Self {
        Self(ms.saturating_mul(1_000))
    }

    pub const fn from_secs(secs: u32) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    pub const fn as_micros(self) -> u32 {
        self.0
    }

    pub const fn as_millis(self) -> u32 {
        self.0 / 1_000
    }
}

/// True once at least `duration` has elapsed between `start` and `now`.
///
/// Unsigned wrapping subtraction keeps the result correct when the
/// counter rolls over between the two samples.
#[inline]
pub const fn timeout(now: u32, start: u32, duration: Duration) -> bool {
    now.wrapping_sub(start) >= duration.0
}

/// Microsecond counter advanced from the tick interrupt
pub struct TickCounter {
    micros: Mutex<Cell<u32>>,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Counter seeded with an arbitrary value, e.g. just below the wrap point
    pub const fn starting_at(micros: u32) -> Self {
        Self {
            micros: Mutex::new(Cell::new(micros)),
        }
    }

    /// Advance by `delta` microseconds. Called from the tick interrupt.
    #[inline]
    pub fn advance(&self, delta: u32) {
        critical_section::with(|cs| {
            let micros = self.micros.borrow(cs);
            micros.set(micros.get().wrapping_add(delta));
        });
    }

    #[inline]
    pub fn set(&self, micros: u32) {
        critical_section::with(|cs| self.micros.borrow(cs).set(micros));
    }

    /// Current tick in microseconds
    #[inline]
    pub fn now(&self) -> u32 {
        critical_section::with(|cs| self.micros.borrow(cs).get())
    }
}

impl Clock for TickCounter {
    #[inline]
    fn now(&self) -> u32 {
        TickCounter::now(self)
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Global system tick counter
pub static SYSTEM_TICKS: TickCounter = TickCounter::new();

/// Tick source advanced by hand, for simulation and host tests
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: Cell<u32>,
}

impl ManualClock {
    pub const fn new(micros: u32) -> Self {
        Self {
            micros: Cell::new(micros),
        }
    }

    pub fn set(&self, micros: u32) {
        self.micros.set(micros);
    }

    pub fn advance(&self, duration: Duration) {
        self.micros.set(self.micros.get().wrapping_add(duration.as_micros()));
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> u32 {
        self.micros.get()
    }
}

/// Busy-wait until `duration` has elapsed on `clock`
pub fn delay<C: Clock>(clock: &C, duration: Duration) {
    let start = clock.now();
    while !timeout(clock.now(), start, duration) {}
}
