//! Link parameters applied by [`Nrf24::configure`](super::Nrf24::configure)

use core::fmt;

use super::registers::{CrcMode, DataRate, TxPower};
use crate::config::{
    MAX_ADDRESS_WIDTH, MAX_CHANNEL, MAX_PAYLOAD_SIZE, RADIO_ADDRESS, RADIO_CHANNEL,
    RADIO_PAYLOAD_SIZE, RADIO_RETRY_COUNT, RADIO_RETRY_DELAY, STATUS_POLL_COST_US,
    TX_POLL_BUDGET,
};

pub const MIN_ADDRESS_WIDTH: usize = 2;

/// Highest value of the 4-bit retry delay and retry count fields
pub const MAX_RETRY_FIELD: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Address shorter than 2 or longer than 5 bytes
    AddressWidth,
    /// TX and RX addresses differ in width; the chip has one width setting
    AddressWidthMismatch,
    /// Pipes 0 and 1 would listen on the same address
    AddressCollision,
    /// Static payload size outside 1..=32
    PayloadSize,
    /// RF channel above 125
    Channel,
    RetryDelay,
    RetryCount,
    /// Poll budget ends before the last retransmission could
    PollBudget,
}

impl ConfigError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::AddressWidth => "address width out of range",
            ConfigError::AddressWidthMismatch => "tx/rx address widths differ",
            ConfigError::AddressCollision => "tx and rx addresses collide",
            ConfigError::PayloadSize => "payload size out of range",
            ConfigError::Channel => "channel out of range",
            ConfigError::RetryDelay => "retry delay out of range",
            ConfigError::RetryCount => "retry count out of range",
            ConfigError::PollBudget => "poll budget too small",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ufmt::uDisplay for ConfigError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

/// Pipe address, 2 to 5 bytes, least significant byte first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address {
    bytes: [u8; MAX_ADDRESS_WIDTH],
    width: u8,
}

impl Address {
    pub fn new(bytes: &[u8]) -> Result<Self, ConfigError> {
        if !(MIN_ADDRESS_WIDTH..=MAX_ADDRESS_WIDTH).contains(&bytes.len()) {
            return Err(ConfigError::AddressWidth);
        }
        let mut buf = [0u8; MAX_ADDRESS_WIDTH];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            bytes: buf,
            width: bytes.len() as u8,
        })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.width as usize]
    }

    #[inline]
    pub fn width(&self) -> u8 {
        self.width
    }
}

impl Default for Address {
    fn default() -> Self {
        let mut bytes = [0u8; MAX_ADDRESS_WIDTH];
        bytes[..RADIO_ADDRESS.len()].copy_from_slice(&RADIO_ADDRESS);
        Self {
            bytes,
            width: RADIO_ADDRESS.len() as u8,
        }
    }
}

/// Automatic retransmission settings (SETUP_RETR)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    /// ARD field: wait `(delay + 1) * 250` us between attempts
    pub delay: u8,
    /// ARC field: retransmissions before MAX_RT, 0 disables them
    pub count: u8,
}

impl RetryPolicy {
    pub const fn new(delay: u8, count: u8) -> Self {
        Self { delay, count }
    }

    #[inline]
    pub const fn delay_micros(&self) -> u32 {
        (self.delay as u32 + 1) * 250
    }

    /// Upper bound for one transmission: the first attempt plus every
    /// retransmission, each followed by a full retry delay.
    pub const fn worst_case_micros(&self) -> u32 {
        (self.count as u32 + 1) * self.delay_micros()
    }

    /// Status polls needed to outlast [`worst_case_micros`](Self::worst_case_micros)
    /// when one poll costs `poll_cost_us`.
    pub const fn min_poll_budget(&self, poll_cost_us: u32) -> u32 {
        let cost = if poll_cost_us == 0 { 1 } else { poll_cost_us };
        self.worst_case_micros().div_ceil(cost)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delay > MAX_RETRY_FIELD {
            return Err(ConfigError::RetryDelay);
        }
        if self.count > MAX_RETRY_FIELD {
            return Err(ConfigError::RetryCount);
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RADIO_RETRY_DELAY, RADIO_RETRY_COUNT)
    }
}

/// Everything `configure` writes to the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfig {
    pub channel: u8,
    pub data_rate: DataRate,
    pub crc: CrcMode,
    pub tx_power: TxPower,
    /// Destination address; also programmed on pipe 0, which is only
    /// enabled with `auto_ack` to catch the ACKs
    pub tx_address: Address,
    /// Own address, listened on pipe 1
    pub rx_address: Address,
    /// Static payload width in bytes, ignored with dynamic payloads
    pub payload_size: u8,
    pub auto_ack: bool,
    pub retry: RetryPolicy,
    pub dynamic_payload: bool,
    /// Status polls before a transmission is declared timed out. Must
    /// cover `retry` at [`STATUS_POLL_COST_US`] per poll.
    pub tx_poll_budget: u32,
}

impl RadioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tx_address.width() != self.rx_address.width() {
            return Err(ConfigError::AddressWidthMismatch);
        }
        if self.auto_ack && self.tx_address == self.rx_address {
            return Err(ConfigError::AddressCollision);
        }
        if self.payload_size == 0 || self.payload_size as usize > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::PayloadSize);
        }
        if self.channel > MAX_CHANNEL {
            return Err(ConfigError::Channel);
        }
        self.retry.validate()?;
        if self.tx_poll_budget < self.retry.min_poll_budget(STATUS_POLL_COST_US) {
            return Err(ConfigError::PollBudget);
        }
        Ok(())
    }

    #[inline]
    pub fn address_width(&self) -> u8 {
        self.tx_address.width()
    }

    /// EN_RXADDR mask: pipe 1 always, pipe 0 only for auto-ack replies
    #[inline]
    pub fn rx_pipes(&self) -> u8 {
        0b10 | self.auto_ack as u8
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel: RADIO_CHANNEL,
            data_rate: DataRate::Kbps250,
            crc: CrcMode::TwoBytes,
            tx_power: TxPower::ZerodBm,
            tx_address: Address::default(),
            rx_address: Address::default(),
            payload_size: RADIO_PAYLOAD_SIZE,
            auto_ack: false,
            retry: RetryPolicy::default(),
            dynamic_payload: false,
            tx_poll_budget: TX_POLL_BUDGET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RadioConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.address_width(), 3);
        assert_eq!(config.tx_address.as_bytes(), &[0xE7, 0x1C, 0xE3]);
        assert_eq!(config.rx_pipes(), 0b10);
    }

    #[test]
    fn auto_ack_needs_distinct_addresses() {
        let shared = RadioConfig {
            auto_ack: true,
            ..RadioConfig::default()
        };
        assert_eq!(shared.validate(), Err(ConfigError::AddressCollision));

        let distinct = RadioConfig {
            rx_address: Address::new(&[0xC2, 0xC2, 0xC2]).unwrap(),
            ..shared
        };
        assert_eq!(distinct.validate(), Ok(()));
        assert_eq!(distinct.rx_pipes(), 0b11);
    }

    #[test]
    fn poll_budget_must_outlast_every_retransmission() {
        let floor = RetryPolicy::default().min_poll_budget(STATUS_POLL_COST_US);
        assert_eq!(floor, 2_000);

        let short = RadioConfig {
            tx_poll_budget: floor - 1,
            ..RadioConfig::default()
        };
        assert_eq!(short.validate(), Err(ConfigError::PollBudget));

        let exact = RadioConfig {
            tx_poll_budget: floor,
            ..RadioConfig::default()
        };
        assert_eq!(exact.validate(), Ok(()));
    }

    #[test]
    fn address_width_is_bounded() {
        assert_eq!(Address::new(&[1]), Err(ConfigError::AddressWidth));
        assert_eq!(Address::new(&[1, 2, 3, 4, 5, 6]), Err(ConfigError::AddressWidth));
        assert_eq!(Address::new(&[1, 2]).map(|a| a.width()), Ok(2));
    }

    #[test]
    fn mismatched_address_widths_are_rejected() {
        let config = RadioConfig {
            rx_address: Address::new(&[1, 2, 3, 4, 5]).unwrap(),
            ..RadioConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::AddressWidthMismatch));
    }

    #[test]
    fn payload_and_channel_limits() {
        let oversize = RadioConfig {
            payload_size: 33,
            ..RadioConfig::default()
        };
        assert_eq!(oversize.validate(), Err(ConfigError::PayloadSize));

        let channel = RadioConfig {
            channel: 126,
            ..RadioConfig::default()
        };
        assert_eq!(channel.validate(), Err(ConfigError::Channel));

        let budget = RadioConfig {
            tx_poll_budget: 0,
            ..RadioConfig::default()
        };
        assert_eq!(budget.validate(), Err(ConfigError::PollBudget));
    }

    #[test]
    fn retry_policy_timing() {
        let policy = RetryPolicy::new(4, 15);
        assert_eq!(policy.delay_micros(), 1_250);
        assert_eq!(policy.worst_case_micros(), 20_000);
        assert_eq!(policy.min_poll_budget(30), 667);
        assert_eq!(RetryPolicy::new(16, 0).validate(), Err(ConfigError::RetryDelay));
    }
}
