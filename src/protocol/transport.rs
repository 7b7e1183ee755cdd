//! TX and RX sequencing on top of the control-plane driver

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use log::{debug, error, trace, warn};

use super::packet::{RxPacket, Session};
use super::{TxCounters, TxOutcome, TxStats};
use crate::config::{CE_HOLD_US, MAX_PAYLOAD_SIZE};
use crate::drivers::nrf24::{Error, Mode, Nrf24, Result, Status};

/// STATUS bit 7 reads as 0 on a live chip; a floating MISO returns 0xFF
const STATUS_RESERVED: u8 = 0x80;

/// One radio link: the driver, its session and send statistics
pub struct Radio<SPI, CE, CSN, D> {
    driver: Nrf24<SPI, CE, CSN, D>,
    session: Session,
    stats: TxStats,
    listening: bool,
}

impl<SPI, CE, CSN, D, SpiE, PinE> Radio<SPI, CE, CSN, D>
where
    SPI: Transfer<u8, Error = SpiE>,
    CE: OutputPin<Error = PinE>,
    CSN: OutputPin<Error = PinE>,
    D: DelayUs<u16>,
{
    pub fn new(driver: Nrf24<SPI, CE, CSN, D>, session: Session) -> Self {
        Self {
            driver,
            session,
            stats: TxStats::default(),
            listening: false,
        }
    }

    /// Program the session's configuration; the radio ends in RX standby
    pub fn configure(&mut self) -> Result<(), SpiE, PinE> {
        self.driver.configure(self.session.config())?;
        self.listening = false;
        Ok(())
    }

    pub fn self_test(&mut self) -> Result<bool, SpiE, PinE> {
        self.driver.self_test()
    }

    /// Load `payload` (padded or truncated to the payload size) and send it
    pub fn transmit(&mut self, payload: &[u8]) -> Result<TxOutcome, SpiE, PinE> {
        self.session.load_tx(payload);
        self.send()
    }

    /// Send the session's TX buffer as is.
    ///
    /// Blocks for the CE hold time and at most `tx_poll_budget` status
    /// reads. Pending status flags are cleared whatever the outcome; on
    /// `MaxRetransmit` the payload stays in the TX FIFO until
    /// [`flush_tx`](Self::flush_tx). A bus error while polling still
    /// drops CE, then returns with listening stopped.
    pub fn send(&mut self) -> Result<TxOutcome, SpiE, PinE> {
        let resume_listening = self.listening;

        // arm
        self.driver.set_ce(false)?;
        self.listening = false;
        self.driver.set_mode(Mode::Tx)?;
        self.driver.write_payload(self.session.tx_payload())?;

        // trigger
        self.driver.set_ce(true)?;
        self.driver.delay_us(CE_HOLD_US);

        // poll
        let budget = self.session.config().tx_poll_budget;
        let mut polls = 0;
        let mut status = Status::from_bits(0);
        let mut fault = None;
        while polls < budget {
            match self.driver.status() {
                Ok(read) => status = read,
                Err(e) => {
                    fault = Some(e);
                    break;
                }
            }
            polls += 1;
            if status.bits() & STATUS_RESERVED != 0 || status.tx_ds() || status.max_rt() {
                break;
            }
        }

        // settle, even when the bus failed mid-poll
        self.driver.set_ce(false)?;
        if let Some(e) = fault {
            error!("tx: bus fault after {} polls", polls);
            return Err(e);
        }

        let outcome = self.classify(status)?;
        self.driver.clear_irq_flags()?;
        self.stats.record(outcome, polls);

        match outcome {
            TxOutcome::Success => trace!("tx: ok after {} polls", polls),
            TxOutcome::Timeout => warn!("tx: no completion after {} polls", polls),
            TxOutcome::MaxRetransmit { .. } => warn!("tx: retransmit limit reached"),
            TxOutcome::Error => error!("tx: unexpected status {}", status.bits()),
        }

        if resume_listening {
            self.start_listening()?;
        }
        Ok(outcome)
    }

    fn classify(&mut self, status: Status) -> Result<TxOutcome, SpiE, PinE> {
        let garbage = status.bits() & STATUS_RESERVED != 0;
        if !garbage && status.max_rt() {
            let counters = if self.session.config().auto_ack {
                let observe = self.driver.observe_tx()?;
                Some(TxCounters {
                    retransmits: observe.arc_cnt(),
                    lost: observe.plos_cnt(),
                })
            } else {
                None
            };
            return Ok(TxOutcome::MaxRetransmit { counters });
        }
        if !garbage && status.tx_ds() {
            return Ok(TxOutcome::Success);
        }
        if !garbage {
            return Ok(TxOutcome::Timeout);
        }
        self.driver.flush_tx()?;
        Ok(TxOutcome::Error)
    }

    /// Drop whatever is latched in the TX FIFO
    pub fn flush_tx(&mut self) -> Result<(), SpiE, PinE> {
        self.driver.flush_tx()?;
        Ok(())
    }

    /// Primary receiver with CE asserted
    pub fn start_listening(&mut self) -> Result<(), SpiE, PinE> {
        self.driver.set_mode(Mode::Rx)?;
        self.driver.set_ce(true)?;
        self.listening = true;
        Ok(())
    }

    /// Back to standby
    pub fn stop_listening(&mut self) -> Result<(), SpiE, PinE> {
        self.driver.set_ce(false)?;
        self.listening = false;
        Ok(())
    }

    #[inline]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Take one payload off the RX FIFO.
    ///
    /// `WouldBlock` means the FIFO is empty; nothing else is touched in
    /// that case.
    pub fn poll_receive(&mut self) -> nb::Result<RxPacket<'_>, Error<SpiE, PinE>> {
        let fifo = self.driver.fifo_status()?;
        if fifo.rx_empty() {
            return Err(nb::Error::WouldBlock);
        }

        let len = if self.session.config().dynamic_payload {
            let width = self.driver.rx_payload_width()?;
            if width as usize > MAX_PAYLOAD_SIZE {
                warn!("rx: corrupt payload width {}, flushing", width);
                self.driver.flush_rx()?;
                self.driver.clear_irq_flags()?;
                return Err(nb::Error::WouldBlock);
            }
            width as usize
        } else {
            self.session.payload_size()
        };

        let read = self.driver.read_payload(self.session.rx_buffer_mut(len))?;
        self.driver.clear_irq_flags()?;

        match read.status.pipe() {
            Some(pipe) => {
                trace!("rx: {} bytes on pipe {}", read.len, pipe);
                Ok(RxPacket {
                    pipe,
                    payload: self.session.rx_buffer(read.len),
                })
            }
            None => {
                debug!("rx: payload without pipe, status {}", read.status.bits());
                Err(nb::Error::WouldBlock)
            }
        }
    }

    /// Hand the next payload to `consumer`. Returns `true` when one was
    /// delivered.
    pub fn receive<F>(&mut self, mut consumer: F) -> Result<bool, SpiE, PinE>
    where
        F: FnMut(u8, &[u8]),
    {
        match self.poll_receive() {
            Ok(packet) => {
                consumer(packet.pipe, packet.payload);
                Ok(true)
            }
            Err(nb::Error::WouldBlock) => Ok(false),
            Err(nb::Error::Other(e)) => Err(e),
        }
    }

    #[inline]
    pub fn stats(&self) -> &TxStats {
        &self.stats
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    #[inline]
    pub fn driver(&mut self) -> &mut Nrf24<SPI, CE, CSN, D> {
        &mut self.driver
    }

    pub fn release(self) -> (Nrf24<SPI, CE, CSN, D>, Session) {
        (self.driver, self.session)
    }
}
