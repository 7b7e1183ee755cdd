pub mod nrf24;
pub mod serial_console;

pub use nrf24::Nrf24;
pub use serial_console::{Hex, SerialConsole};
