//! ATmega128 board support for the telemetry node

pub mod gpio;
pub mod spi;
pub mod timer;
pub mod uart;

// Re-export commonly used types
pub use gpio::board;
pub use gpio::{Input, Output, Pin};
pub use spi::{Spi, SpiPrescaler};
pub use timer::{BusyDelay, SystemTimer};
pub use uart::{Uart, UartLogger, CONSOLE_RX};
