//! Configuration constants for the telemetry node firmware

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// UART baud rate
pub const UART_BAUD: u32 = 9600;

/// Tick interrupt period in microseconds (Timer0 compare, 1 kHz)
pub const TICK_PERIOD_US: u32 = 1_000;

/// Capacity of the duty table
pub const MAX_DUTIES: usize = 32;

/// Largest payload the transceiver FIFO accepts
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// Widest address the transceiver supports
pub const MAX_ADDRESS_WIDTH: usize = 5;

/// Highest RF channel offset (2400 MHz + 125)
pub const MAX_CHANNEL: u8 = 125;

/// Minimum time CE must stay high to start a transmission is 10 us
pub const CE_HOLD_US: u16 = 15;

/// Status polls before a send is declared timed out
pub const TX_POLL_BUDGET: u32 = 0x000F_FFFF;

/// Lower bound for one STATUS poll: a single-byte frame at SPI clock / 16
/// plus chip-select framing
pub const STATUS_POLL_COST_US: u32 = 10;

// Default link parameters of the deployed collector/heater pair
pub const RADIO_CHANNEL: u8 = 115;
pub const RADIO_PAYLOAD_SIZE: u8 = 5;
pub const RADIO_ADDRESS: [u8; 3] = [0xE7, 0x1C, 0xE3];
/// ARD field: (4 + 1) * 250 us
pub const RADIO_RETRY_DELAY: u8 = 4;
pub const RADIO_RETRY_COUNT: u8 = 15;

/// Reading transmitted while no temperature sensor is fitted
pub const PLACEHOLDER_READING: i16 = 0;

/// Address pattern written and read back by the radio self-test
pub const SELF_TEST_ADDRESS: [u8; MAX_ADDRESS_WIDTH] = *b"nRF24";

// Application duty periods in milliseconds
pub const MEASURE_PERIOD_MS: u32 = 500;
pub const RADIO_RX_PERIOD_MS: u32 = 1;
pub const RADIO_TX_PERIOD_MS: u32 = 5_000;
pub const TASK_REPORT_PERIOD_MS: u32 = 1_000;
