//! Session state and payload framing

use super::{ConfigError, RadioConfig};
use crate::config::MAX_PAYLOAD_SIZE;

/// Link configuration plus the session's own payload buffers
#[derive(Debug, Clone)]
pub struct Session {
    config: RadioConfig,
    tx_buffer: [u8; MAX_PAYLOAD_SIZE],
    rx_buffer: [u8; MAX_PAYLOAD_SIZE],
}

impl Session {
    pub fn new(config: RadioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            tx_buffer: [0; MAX_PAYLOAD_SIZE],
            rx_buffer: [0; MAX_PAYLOAD_SIZE],
        })
    }

    #[inline]
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    #[inline]
    pub fn payload_size(&self) -> usize {
        self.config.payload_size as usize
    }

    /// Copy `payload` into the TX buffer, zero-padding or truncating it to
    /// the configured payload size.
    pub fn load_tx(&mut self, payload: &[u8]) {
        let size = self.payload_size();
        let len = payload.len().min(size);
        self.tx_buffer[..len].copy_from_slice(&payload[..len]);
        self.tx_buffer[len..size].fill(0);
    }

    /// The payload the next send transmits
    #[inline]
    pub fn tx_payload(&self) -> &[u8] {
        &self.tx_buffer[..self.payload_size()]
    }

    /// Fill the outgoing payload in place
    #[inline]
    pub fn tx_payload_mut(&mut self) -> &mut [u8] {
        let size = self.payload_size();
        &mut self.tx_buffer[..size]
    }

    pub(crate) fn rx_buffer_mut(&mut self, len: usize) -> &mut [u8] {
        &mut self.rx_buffer[..len.min(MAX_PAYLOAD_SIZE)]
    }

    pub(crate) fn rx_buffer(&self, len: usize) -> &[u8] {
        &self.rx_buffer[..len.min(MAX_PAYLOAD_SIZE)]
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            config: RadioConfig::default(),
            tx_buffer: [0; MAX_PAYLOAD_SIZE],
            rx_buffer: [0; MAX_PAYLOAD_SIZE],
        }
    }
}

/// Payload handed out by the receive path, borrowed from the session's RX
/// buffer until the next receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxPacket<'a> {
    /// Receive pipe, 0 to 5
    pub pipe: u8,
    pub payload: &'a [u8],
}

impl RxPacket<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
