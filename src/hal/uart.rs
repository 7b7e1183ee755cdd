use avr_device::atmega128a::USART0;
use avr_device::interrupt::Mutex;
use core::cell::RefCell;
use core::convert::Infallible;
use core::marker::PhantomData;

use crate::config::{CPU_FREQ_HZ, UART_BAUD};
use crate::rtos::SignalFlag;

// Buffer size must be power of 2 for efficient masking
const BUFFER_SIZE: usize = 32;
const BUFFER_MASK: usize = BUFFER_SIZE - 1;

const UBRR: u16 = (CPU_FREQ_HZ / (16 * UART_BAUD) - 1) as u16;

// UCSR0A / UCSR0B bits
const UDRE0: u8 = 1 << 5;
const RXCIE0: u8 = 1 << 7;
const RXEN0: u8 = 1 << 4;
const TXEN0: u8 = 1 << 3;
// 8N1
const UCSZ_8BIT: u8 = 0b11 << 1;

pub struct Buffer {
    data: [u8; BUFFER_SIZE],
    write_idx: usize,
    read_idx: usize,
}

impl Buffer {
    const fn new() -> Self {
        Self {
            data: [0; BUFFER_SIZE],
            write_idx: 0,
            read_idx: 0,
        }
    }

    fn write(&mut self, byte: u8) -> bool {
        let next_write = (self.write_idx + 1) & BUFFER_MASK;
        if next_write != self.read_idx {
            self.data[self.write_idx] = byte;
            self.write_idx = next_write;
            true
        } else {
            false
        }
    }

    fn read(&mut self) -> Option<u8> {
        if self.read_idx != self.write_idx {
            let byte = self.data[self.read_idx];
            self.read_idx = (self.read_idx + 1) & BUFFER_MASK;
            Some(byte)
        } else {
            None
        }
    }
}

static RX_BUFFER: Mutex<RefCell<Buffer>> = Mutex::new(RefCell::new(Buffer::new()));

/// Raised by the receive interrupt whenever a byte arrives
pub static CONSOLE_RX: SignalFlag = SignalFlag::new();

/// USART0 console: blocking transmit, interrupt-driven receive
pub struct Uart {
    _usart: PhantomData<USART0>,
}

impl Uart {
    pub fn new() -> Self {
        unsafe {
            let p = USART0::ptr();
            (*p).ubrr0h.write(|w| w.bits((UBRR >> 8) as u8));
            (*p).ubrr0l.write(|w| w.bits(UBRR as u8));
            (*p).ucsr0c.write(|w| w.bits(UCSZ_8BIT));
            (*p).ucsr0b.write(|w| w.bits(RXEN0 | TXEN0 | RXCIE0));
        }
        Self {
            _usart: PhantomData,
        }
    }

    /// Second handle on the same peripheral, for the logger
    pub(crate) const fn shared() -> Self {
        Self {
            _usart: PhantomData,
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        unsafe {
            let p = USART0::ptr();
            while (*p).ucsr0a.read().bits() & UDRE0 == 0 {}
            (*p).udr0.write(|w| w.bits(byte));
        }
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        avr_device::interrupt::free(|cs| RX_BUFFER.borrow(cs).borrow_mut().read())
    }
}

impl Default for Uart {
    fn default() -> Self {
        Self::new()
    }
}

impl ufmt::uWrite for Uart {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}

impl core::fmt::Write for Uart {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}

/// `log` backend writing straight to USART0
pub struct UartLogger;

impl log::Log for UartLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut out = Uart::shared();
        // dropped silently if formatting fails
        let _ = core::fmt::write(
            &mut out,
            format_args!("[{}] {}\r\n", record.level(), record.args()),
        );
    }

    fn flush(&self) {}
}

#[avr_device::interrupt(atmega128a)]
fn USART0_RX() {
    unsafe {
        let byte = (*USART0::ptr()).udr0.read().bits();
        avr_device::interrupt::free(|cs| {
            RX_BUFFER.borrow(cs).borrow_mut().write(byte);
        });
    }
    CONSOLE_RX.raise();
}
