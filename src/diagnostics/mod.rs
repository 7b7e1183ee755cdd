//! Console rendering of scheduler and radio state

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

use crate::drivers::serial_console::Hex;
use crate::os::Clock;
use crate::protocol::TxStats;
use crate::rtos::Scheduler;

/// Right-align `value` in `width` columns using `fill`
fn padded<W: uWrite + ?Sized>(
    f: &mut Formatter<'_, W>,
    value: u32,
    width: usize,
    fill: char,
) -> Result<(), W::Error> {
    let mut digits = 1;
    let mut rest = value / 10;
    while rest > 0 {
        digits += 1;
        rest /= 10;
    }
    for _ in digits..width {
        f.write_char(fill)?;
    }
    uwrite!(f, "{}", value)
}

/// Per-duty run time of the last accounting window.
///
/// ```text
/// PID   uS
/// [ 0]: 0000120
/// [ 1]: 0001873
/// ```
pub struct TaskReport<'r, 'a, C: Clock, const N: usize>(pub &'r Scheduler<'a, C, N>);

impl<C: Clock, const N: usize> uDisplay for TaskReport<'_, '_, C, N> {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str("PID   uS\r\n")?;
        for (id, info) in self.0.slots() {
            f.write_str("[")?;
            padded(f, id.index() as u32, 2, ' ')?;
            f.write_str("]: ")?;
            padded(f, info.last_window_run_time, 7, '0')?;
            if !info.enabled {
                f.write_str(" off")?;
            }
            f.write_str("\r\n")?;
        }
        Ok(())
    }
}

/// One-line summary of send outcomes
pub struct LinkReport<'s>(pub &'s TxStats);

impl uDisplay for LinkReport<'_> {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let stats = self.0;
        uwrite!(
            f,
            "tx ok {} timeout {} maxrt {} err {}",
            stats.success,
            stats.timeout,
            stats.max_retransmit,
            stats.error
        )?;
        if let Some(outcome) = stats.last_outcome {
            uwrite!(f, " last {} ({} polls)", outcome, stats.last_polls)?;
        }
        f.write_str("\r\n")
    }
}

/// Space separated hex bytes followed by a line break
pub fn hex_dump<W: uWrite + ?Sized>(out: &mut W, bytes: &[u8]) -> Result<(), W::Error> {
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.write_char(' ')?;
        }
        uwrite!(out, "{}", Hex(*b))?;
    }
    out.write_str("\r\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::os::{Duration, ManualClock};
    use crate::protocol::TxOutcome;
    use core::convert::Infallible;

    /// In-memory console
    #[derive(Debug, Default)]
    pub struct Sink(String);

    impl Sink {
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl uWrite for Sink {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
            self.0.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn task_report_pads_columns() {
        let clock = ManualClock::new(0);
        let mut slow = || clock.advance(Duration::from_micros(120));
        let mut idle = || {};
        let mut sched: Scheduler<'_, _, 4> = Scheduler::new(&clock);
        sched
            .register_time_task(&mut slow, Duration::from_millis(1), true)
            .unwrap();
        sched
            .register_time_task(&mut idle, Duration::from_millis(1), false)
            .unwrap();

        clock.advance(Duration::from_millis(1));
        sched.run_pass();
        sched.snapshot_and_reset_accounting();

        let mut out = Sink::default();
        uwrite!(out, "{}", TaskReport(&sched)).unwrap();
        assert_eq!(out.as_str(), "PID   uS\r\n[ 0]: 0000120\r\n[ 1]: 0000000 off\r\n");
    }

    #[test]
    fn link_report_names_last_outcome() {
        let mut stats = TxStats::default();
        stats.record(TxOutcome::Timeout, 40);
        let mut out = Sink::default();
        uwrite!(out, "{}", LinkReport(&stats)).unwrap();
        assert_eq!(
            out.as_str(),
            "tx ok 0 timeout 1 maxrt 0 err 0 last TIMEOUT (40 polls)\r\n"
        );
    }

    #[test]
    fn hex_dump_separates_bytes() {
        let mut out = Sink::default();
        hex_dump(&mut out, &[0x00, 0x7F, 0xE3]).unwrap();
        assert_eq!(out.as_str(), "00 7F E3\r\n");
    }
}
