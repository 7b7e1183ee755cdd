//! System tick and busy-wait delays

use avr_device::atmega128a::TC0;
use embedded_hal::blocking::delay::DelayUs;

use crate::config::{CPU_FREQ_HZ, TICK_PERIOD_US};
use crate::os::SYSTEM_TICKS;

// Timer0 on the ATmega128 has its own CS0 table: 4 selects clk/64
const TCCR0_CTC_DIV64: u8 = (1 << 3) | 4;
const OCIE0: u8 = 1 << 1;
const TIMER0_PRESCALER: u32 = 64;

/// Timer0 in CTC mode, interrupting once per tick period
pub struct SystemTimer {
    _private: (),
}

impl SystemTimer {
    pub fn start() -> Self {
        let compare = CPU_FREQ_HZ / TIMER0_PRESCALER / (1_000_000 / TICK_PERIOD_US) - 1;
        unsafe {
            let p = TC0::ptr();
            (*p).tccr0.write(|w| w.bits(0));
            (*p).tcnt0.write(|w| w.bits(0));
            (*p).ocr0.write(|w| w.bits(compare as u8));
            (*p).timsk.modify(|r, w| w.bits(r.bits() | OCIE0));
            (*p).tccr0.write(|w| w.bits(TCCR0_CTC_DIV64));
        }
        Self { _private: () }
    }
}

#[avr_device::interrupt(atmega128a)]
fn TIMER0_COMP() {
    SYSTEM_TICKS.advance(TICK_PERIOD_US);
}

/// Cycle-counting delay, used for the radio CE hold time
#[derive(Debug, Default, Clone, Copy)]
pub struct BusyDelay;

// roughly four cycles per nop iteration
const LOOPS_PER_US: u32 = CPU_FREQ_HZ / 1_000_000 / 4;

impl DelayUs<u16> for BusyDelay {
    fn delay_us(&mut self, us: u16) {
        for _ in 0..(us as u32 * LOOPS_PER_US) {
            avr_device::asm::nop();
        }
    }
}
