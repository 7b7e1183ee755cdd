//! Packet radio transport
//!
//! Fixed-width raw payloads, no header; the payload length is implied by
//! the session configuration. One send per call, polled to completion with
//! a bounded number of status reads.

pub mod packet;
pub mod transport;

use core::fmt;

pub use crate::drivers::nrf24::{Address, ConfigError, RadioConfig, RetryPolicy};
pub use packet::{RxPacket, Session};
pub use transport::Radio;

/// Auto-acknowledgment counters read from OBSERVE_TX
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxCounters {
    /// Retransmissions of the packet that failed
    pub retransmits: u8,
    /// Packets lost since the channel was last written (saturates at 15)
    pub lost: u8,
}

/// Result of one send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxOutcome {
    Success,
    /// Poll budget ran out with neither completion flag set
    Timeout,
    /// Retransmit limit hit; the payload is still in the TX FIFO.
    /// Counters are only read while auto-acknowledgment is on.
    MaxRetransmit { counters: Option<TxCounters> },
    /// Status made no sense; the TX FIFO was flushed
    Error,
}

impl TxOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TxOutcome::Success => "OK",
            TxOutcome::Timeout => "TIMEOUT",
            TxOutcome::MaxRetransmit { .. } => "MAX RETRANSMIT",
            TxOutcome::Error => "ERROR",
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, TxOutcome::Success)
    }
}

impl fmt::Display for TxOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ufmt::uDisplay for TxOutcome {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

/// Per-outcome send counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxStats {
    pub success: u32,
    pub timeout: u32,
    pub max_retransmit: u32,
    pub error: u32,
    /// Status polls spent by the most recent send
    pub last_polls: u32,
    pub last_outcome: Option<TxOutcome>,
}

impl TxStats {
    pub fn record(&mut self, outcome: TxOutcome, polls: u32) {
        let counter = match outcome {
            TxOutcome::Success => &mut self.success,
            TxOutcome::Timeout => &mut self.timeout,
            TxOutcome::MaxRetransmit { .. } => &mut self.max_retransmit,
            TxOutcome::Error => &mut self.error,
        };
        *counter = counter.wrapping_add(1);
        self.last_polls = polls;
        self.last_outcome = Some(outcome);
    }

    pub fn attempts(&self) -> u32 {
        self.success
            .wrapping_add(self.timeout)
            .wrapping_add(self.max_retransmit)
            .wrapping_add(self.error)
    }
}
