//! Application duties built on the radio transport
//!
//! Payload layout is an application convention: bytes 0/1 carry a signed
//! 16-bit temperature reading, little-endian. The transport does not
//! enforce it.

use core::fmt;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use log::{info, warn};

use crate::config::PLACEHOLDER_READING;
use crate::drivers::nrf24;
use crate::protocol::{Radio, TxOutcome};

/// Temperature in the sensor's native fixed-point unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub i16);

impl Temperature {
    pub const ENCODED_LEN: usize = 2;

    /// Write bytes 0/1 of `payload`. Returns `false` if it is too short.
    pub fn encode_into(self, payload: &mut [u8]) -> bool {
        match payload.get_mut(..Self::ENCODED_LEN) {
            Some(dst) => {
                dst.copy_from_slice(&self.0.to_le_bytes());
                true
            }
            None => false,
        }
    }

    pub fn decode(payload: &[u8]) -> Option<Self> {
        match payload {
            [lo, hi, ..] => Some(Self(i16::from_le_bytes([*lo, *hi]))),
            _ => None,
        }
    }
}

impl ufmt::uDisplay for Temperature {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        ufmt::uDisplay::fmt(&self.0, f)
    }
}

/// Where the measure duty gets the local reading from
pub trait TemperatureSource {
    fn sample(&mut self) -> Temperature;
}

/// Constant reading for boards without a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedReading(pub Temperature);

impl FixedReading {
    pub const PLACEHOLDER: Self = Self(Temperature(PLACEHOLDER_READING));
}

impl TemperatureSource for FixedReading {
    fn sample(&mut self) -> Temperature {
        self.0
    }
}

/// The radio failed its address round trip at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelfTestFailure;

impl fmt::Display for SelfTestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("radio self-test failed")
    }
}

impl ufmt::uDisplay for SelfTestFailure {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str("radio self-test failed")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringUpError<SpiE, PinE> {
    SelfTest(SelfTestFailure),
    Radio(nrf24::Error<SpiE, PinE>),
}

impl<SpiE, PinE> fmt::Display for BringUpError<SpiE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BringUpError::SelfTest(e) => fmt::Display::fmt(e, f),
            BringUpError::Radio(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl<SpiE, PinE> From<nrf24::Error<SpiE, PinE>> for BringUpError<SpiE, PinE> {
    fn from(e: nrf24::Error<SpiE, PinE>) -> Self {
        BringUpError::Radio(e)
    }
}

/// Self-test, then configure and start listening
pub fn bring_up<SPI, CE, CSN, D, SpiE, PinE>(
    radio: &mut Radio<SPI, CE, CSN, D>,
) -> Result<(), BringUpError<SpiE, PinE>>
where
    SPI: Transfer<u8, Error = SpiE>,
    CE: OutputPin<Error = PinE>,
    CSN: OutputPin<Error = PinE>,
    D: DelayUs<u16>,
{
    if !radio.self_test()? {
        warn!("radio: self-test failed");
        return Err(BringUpError::SelfTest(SelfTestFailure));
    }
    radio.configure()?;
    radio.start_listening()?;
    info!("radio: up on channel {}", radio.session().config().channel);
    Ok(())
}

/// RX consumer keeping the latest reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkMonitor {
    pub latest: Option<Temperature>,
    pub last_pipe: Option<u8>,
    pub packets: u32,
    /// Payloads too short to carry a reading
    pub malformed: u32,
}

impl LinkMonitor {
    pub const fn new() -> Self {
        Self {
            latest: None,
            last_pipe: None,
            packets: 0,
            malformed: 0,
        }
    }

    pub fn consume(&mut self, pipe: u8, payload: &[u8]) {
        self.packets = self.packets.wrapping_add(1);
        self.last_pipe = Some(pipe);
        match Temperature::decode(payload) {
            Some(t) => self.latest = Some(t),
            None => self.malformed = self.malformed.wrapping_add(1),
        }
    }

    /// Receive duty body: drain at most one payload
    pub fn poll<SPI, CE, CSN, D, SpiE, PinE>(
        &mut self,
        radio: &mut Radio<SPI, CE, CSN, D>,
    ) -> nrf24::Result<bool, SpiE, PinE>
    where
        SPI: Transfer<u8, Error = SpiE>,
        CE: OutputPin<Error = PinE>,
        CSN: OutputPin<Error = PinE>,
        D: DelayUs<u16>,
    {
        radio.receive(|pipe, payload| self.consume(pipe, payload))
    }
}

/// Send duty body: one reading per call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetrySender {
    pub last_outcome: Option<TxOutcome>,
}

impl TelemetrySender {
    pub const fn new() -> Self {
        Self { last_outcome: None }
    }

    pub fn send<SPI, CE, CSN, D, SpiE, PinE>(
        &mut self,
        radio: &mut Radio<SPI, CE, CSN, D>,
        reading: Temperature,
    ) -> nrf24::Result<TxOutcome, SpiE, PinE>
    where
        SPI: Transfer<u8, Error = SpiE>,
        CE: OutputPin<Error = PinE>,
        CSN: OutputPin<Error = PinE>,
        D: DelayUs<u16>,
    {
        let payload = radio.session_mut().tx_payload_mut();
        payload.fill(0);
        reading.encode_into(payload);

        let outcome = radio.send()?;
        if let TxOutcome::MaxRetransmit { .. } = outcome {
            radio.flush_tx()?;
        }
        self.last_outcome = Some(outcome);
        Ok(outcome)
    }
}
