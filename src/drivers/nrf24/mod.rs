//! nRF24L01+ control-plane driver
//!
//! A thin command encoder over an SPI bus and the CE/CSN lines. Every
//! command is one SPI transfer framed by CSN; the first byte clocked back
//! is always the STATUS register. The driver reports bus and pin failures
//! only and never interprets status bits: classifying what the radio did
//! is the transport's job.

pub mod config;
pub mod dump;
pub mod registers;

use core::fmt;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use log::{debug, trace};

use crate::config::{MAX_ADDRESS_WIDTH, MAX_PAYLOAD_SIZE, SELF_TEST_ADDRESS};

pub use config::{Address, ConfigError, RadioConfig, RetryPolicy};
pub use dump::RegisterDump;
pub use registers::{
    Config, CrcMode, DataRate, FifoStatus, Mode, ObserveTx, RfSetup, Status, TxPower,
    PIPE_COUNT,
};

use registers::{cmd, reg, Feature, SetupAw, SetupRetr};

/// CONFIG value after power-on reset (EN_CRC set)
const CONFIG_RESET: u8 = 0b0000_1000;

/// Power down to standby transition (Tpd2stby with external clock margin)
pub const POWER_UP_DELAY_US: u16 = 1_500;

/// Bus or line failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<SpiE, PinE> {
    Spi(SpiE),
    Pin(PinE),
}

pub type Result<T, SpiE, PinE> = core::result::Result<T, Error<SpiE, PinE>>;

impl<SpiE, PinE> fmt::Display for Error<SpiE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spi(_) => f.write_str("spi transfer failed"),
            Error::Pin(_) => f.write_str("radio control line failed"),
        }
    }
}

impl<SpiE, PinE> ufmt::uDisplay for Error<SpiE, PinE> {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        match self {
            Error::Spi(_) => f.write_str("spi transfer failed"),
            Error::Pin(_) => f.write_str("radio control line failed"),
        }
    }
}

/// Payload taken from the RX FIFO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PayloadRead {
    /// STATUS clocked out with the read command; RX_P_NO names the pipe
    pub status: Status,
    /// Bytes copied into the caller's buffer
    pub len: usize,
}

/// Driver for one nRF24L01+
pub struct Nrf24<SPI, CE, CSN, D> {
    spi: SPI,
    ce: CE,
    csn: CSN,
    delay: D,
    config: Config,
    ce_enabled: bool,
}

impl<SPI, CE, CSN, D> fmt::Debug for Nrf24<SPI, CE, CSN, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nrf24")
            .field("config", &self.config)
            .field("ce_enabled", &self.ce_enabled)
            .finish()
    }
}

impl<SPI, CE, CSN, D, SpiE, PinE> Nrf24<SPI, CE, CSN, D>
where
    SPI: Transfer<u8, Error = SpiE>,
    CE: OutputPin<Error = PinE>,
    CSN: OutputPin<Error = PinE>,
    D: DelayUs<u16>,
{
    /// Take the bus and lines. CE is driven low and CSN high; the chip is
    /// not touched until the first command.
    pub fn new(spi: SPI, mut ce: CE, mut csn: CSN, delay: D) -> Result<Self, SpiE, PinE> {
        ce.set_low().map_err(Error::Pin)?;
        csn.set_high().map_err(Error::Pin)?;
        Ok(Self {
            spi,
            ce,
            csn,
            delay,
            config: Config::from_bits(CONFIG_RESET),
            ce_enabled: false,
        })
    }

    pub fn release(self) -> (SPI, CE, CSN, D) {
        (self.spi, self.ce, self.csn, self.delay)
    }

    /// One CSN-framed transfer. `frame` is overwritten with the reply.
    fn command(&mut self, frame: &mut [u8]) -> Result<Status, SpiE, PinE> {
        self.csn.set_low().map_err(Error::Pin)?;
        let transfer = self.spi.transfer(frame).map(|_| ()).map_err(Error::Spi);
        // CSN goes high even after a failed transfer
        self.csn.set_high().map_err(Error::Pin)?;
        transfer?;
        Ok(Status::from_bits(frame[0]))
    }

    fn simple_command(&mut self, command: u8) -> Result<Status, SpiE, PinE> {
        let mut frame = [command];
        self.command(&mut frame)
    }

    pub fn read_register(&mut self, register: u8) -> Result<u8, SpiE, PinE> {
        let mut frame = [cmd::R_REGISTER | (register & cmd::REGISTER_MASK), cmd::NOP];
        self.command(&mut frame)?;
        Ok(frame[1])
    }

    pub fn write_register(&mut self, register: u8, value: u8) -> Result<Status, SpiE, PinE> {
        trace!("nrf24: w {} <- {}", register, value);
        let mut frame = [cmd::W_REGISTER | (register & cmd::REGISTER_MASK), value];
        self.command(&mut frame)
    }

    /// Read a multi-byte register (addresses) into `out`
    pub fn read_register_multi(&mut self, register: u8, out: &mut [u8]) -> Result<Status, SpiE, PinE> {
        let len = out.len().min(MAX_ADDRESS_WIDTH);
        let mut frame = [cmd::NOP; 1 + MAX_ADDRESS_WIDTH];
        frame[0] = cmd::R_REGISTER | (register & cmd::REGISTER_MASK);
        let status = self.command(&mut frame[..=len])?;
        out[..len].copy_from_slice(&frame[1..=len]);
        Ok(status)
    }

    pub fn write_register_multi(&mut self, register: u8, data: &[u8]) -> Result<Status, SpiE, PinE> {
        let len = data.len().min(MAX_ADDRESS_WIDTH);
        let mut frame = [0u8; 1 + MAX_ADDRESS_WIDTH];
        frame[0] = cmd::W_REGISTER | (register & cmd::REGISTER_MASK);
        frame[1..=len].copy_from_slice(&data[..len]);
        self.command(&mut frame[..=len])
    }

    /// STATUS via a NOP transfer
    pub fn status(&mut self) -> Result<Status, SpiE, PinE> {
        self.simple_command(cmd::NOP)
    }

    pub fn fifo_status(&mut self) -> Result<FifoStatus, SpiE, PinE> {
        self.read_register(reg::FIFO_STATUS).map(FifoStatus::from_bits)
    }

    /// Lost packet and retransmit counters
    pub fn observe_tx(&mut self) -> Result<ObserveTx, SpiE, PinE> {
        self.read_register(reg::OBSERVE_TX).map(ObserveTx::from_bits)
    }

    pub fn flush_tx(&mut self) -> Result<Status, SpiE, PinE> {
        self.simple_command(cmd::FLUSH_TX)
    }

    pub fn flush_rx(&mut self) -> Result<Status, SpiE, PinE> {
        self.simple_command(cmd::FLUSH_RX)
    }

    /// Write 1s to RX_DR, TX_DS and MAX_RT
    pub fn clear_irq_flags(&mut self) -> Result<Status, SpiE, PinE> {
        self.write_register(reg::STATUS, Status::CLEAR_IRQ.bits())
    }

    /// Load the TX FIFO. Anything past 32 bytes is dropped.
    pub fn write_payload(&mut self, payload: &[u8]) -> Result<Status, SpiE, PinE> {
        let len = payload.len().min(MAX_PAYLOAD_SIZE);
        let mut frame = [0u8; 1 + MAX_PAYLOAD_SIZE];
        frame[0] = cmd::W_TX_PAYLOAD;
        frame[1..=len].copy_from_slice(&payload[..len]);
        self.command(&mut frame[..=len])
    }

    /// Pop the payload at the RX FIFO head into `out`, reading
    /// `out.len()` bytes (at most 32).
    pub fn read_payload(&mut self, out: &mut [u8]) -> Result<PayloadRead, SpiE, PinE> {
        let len = out.len().min(MAX_PAYLOAD_SIZE);
        let mut frame = [cmd::NOP; 1 + MAX_PAYLOAD_SIZE];
        frame[0] = cmd::R_RX_PAYLOAD;
        let status = self.command(&mut frame[..=len])?;
        out[..len].copy_from_slice(&frame[1..=len]);
        Ok(PayloadRead { status, len })
    }

    /// Width of the payload at the RX FIFO head (dynamic payloads)
    pub fn rx_payload_width(&mut self) -> Result<u8, SpiE, PinE> {
        let mut frame = [cmd::R_RX_PL_WID, cmd::NOP];
        self.command(&mut frame)?;
        Ok(frame[1])
    }

    pub fn set_channel(&mut self, channel: u8) -> Result<(), SpiE, PinE> {
        self.write_register(reg::RF_CH, channel & 0x7F)?;
        Ok(())
    }

    pub fn set_data_rate(&mut self, rate: DataRate) -> Result<(), SpiE, PinE> {
        self.update_rf_setup(|rf| rate.apply(rf))
    }

    pub fn set_tx_power(&mut self, power: TxPower) -> Result<(), SpiE, PinE> {
        self.update_rf_setup(|rf| rf.set_rf_pwr(power as u8))
    }

    fn update_rf_setup<F: FnOnce(&mut RfSetup)>(&mut self, f: F) -> Result<(), SpiE, PinE> {
        let mut rf = RfSetup::from_bits(self.read_register(reg::RF_SETUP)?);
        f(&mut rf);
        self.write_register(reg::RF_SETUP, rf.bits())?;
        Ok(())
    }

    pub fn set_crc(&mut self, mode: CrcMode) -> Result<(), SpiE, PinE> {
        self.update_config(|config| mode.apply(config))
    }

    pub fn set_retries(&mut self, policy: RetryPolicy) -> Result<(), SpiE, PinE> {
        let mut retr = SetupRetr::from_bits(0);
        retr.set_ard(policy.delay);
        retr.set_arc(policy.count);
        self.write_register(reg::SETUP_RETR, retr.bits())?;
        Ok(())
    }

    /// Global address width in bytes, 2 to 5
    pub fn set_address_width(&mut self, width: u8) -> Result<(), SpiE, PinE> {
        let mut aw = SetupAw::from_bits(0);
        aw.set_aw(width.saturating_sub(2));
        self.write_register(reg::SETUP_AW, aw.bits())?;
        Ok(())
    }

    /// Program the receive address of `pipe`. Pipes 2 to 5 share bytes 1..
    /// with pipe 1, so only their least significant byte is written.
    pub fn set_address(&mut self, pipe: u8, address: &[u8]) -> Result<(), SpiE, PinE> {
        if pipe >= PIPE_COUNT || address.is_empty() {
            return Ok(());
        }
        self.with_ce_low(|radio| {
            let register = reg::RX_ADDR_P0 + pipe;
            if pipe < 2 {
                radio.write_register_multi(register, address)?;
            } else {
                radio.write_register(register, address[0])?;
            }
            Ok(())
        })
    }

    pub fn set_tx_address(&mut self, address: &[u8]) -> Result<(), SpiE, PinE> {
        self.with_ce_low(|radio| {
            radio.write_register_multi(reg::TX_ADDR, address)?;
            Ok(())
        })
    }

    /// Enable `pipe` with a static payload width (0 for dynamic payloads)
    pub fn set_rx_pipe(&mut self, pipe: u8, auto_ack: bool, payload_len: u8) -> Result<(), SpiE, PinE> {
        if pipe >= PIPE_COUNT {
            return Ok(());
        }
        let bit = 1 << pipe;
        self.with_ce_low(|radio| {
            let rx = radio.read_register(reg::EN_RXADDR)?;
            radio.write_register(reg::EN_RXADDR, rx | bit)?;
            let aa = radio.read_register(reg::EN_AA)?;
            let aa = if auto_ack { aa | bit } else { aa & !bit };
            radio.write_register(reg::EN_AA, aa)?;
            radio.write_register(reg::RX_PW_P0 + pipe, payload_len.min(MAX_PAYLOAD_SIZE as u8))?;
            Ok(())
        })
    }

    pub fn close_rx_pipe(&mut self, pipe: u8) -> Result<(), SpiE, PinE> {
        if pipe >= PIPE_COUNT {
            return Ok(());
        }
        let bit = 1 << pipe;
        self.with_ce_low(|radio| {
            let rx = radio.read_register(reg::EN_RXADDR)?;
            radio.write_register(reg::EN_RXADDR, rx & !bit)?;
            let aa = radio.read_register(reg::EN_AA)?;
            radio.write_register(reg::EN_AA, aa & !bit)?;
            Ok(())
        })
    }

    /// Toggle FEATURE.EN_DPL and DYNPD for the pipes in `pipes`
    pub fn set_dynamic_payload(&mut self, enabled: bool, pipes: u8) -> Result<(), SpiE, PinE> {
        self.with_ce_low(|radio| {
            let mut feature = Feature::from_bits(radio.read_register(reg::FEATURE)?);
            feature.set_en_dpl(enabled);
            radio.write_register(reg::FEATURE, feature.bits())?;
            radio.write_register(reg::DYNPD, if enabled { pipes & 0x3F } else { 0 })?;
            Ok(())
        })
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<(), SpiE, PinE> {
        self.with_ce_low(|radio| radio.update_config(|config| config.set_prim_rx(mode == Mode::Rx)))
    }

    pub fn mode(&self) -> Mode {
        if self.config.prim_rx() {
            Mode::Rx
        } else {
            Mode::Tx
        }
    }

    /// Power up to standby and wait for the oscillator to settle
    pub fn power_up(&mut self) -> Result<(), SpiE, PinE> {
        if self.config.pwr_up() {
            return Ok(());
        }
        self.with_ce_low(|radio| radio.update_config(|config| config.set_pwr_up(true)))?;
        self.delay.delay_us(POWER_UP_DELAY_US);
        Ok(())
    }

    pub fn power_down(&mut self) -> Result<(), SpiE, PinE> {
        self.with_ce_low(|radio| radio.update_config(|config| config.set_pwr_up(false)))
    }

    pub fn is_powered_up(&self) -> bool {
        self.config.pwr_up()
    }

    pub fn set_ce(&mut self, enabled: bool) -> Result<(), SpiE, PinE> {
        if enabled {
            self.ce.set_high().map_err(Error::Pin)?;
        } else {
            self.ce.set_low().map_err(Error::Pin)?;
        }
        self.ce_enabled = enabled;
        Ok(())
    }

    pub fn is_ce_enabled(&self) -> bool {
        self.ce_enabled
    }

    pub fn delay_us(&mut self, us: u16) {
        self.delay.delay_us(us);
    }

    /// Run `f` with CE deasserted, then put CE back where it was
    fn with_ce_low<F, R>(&mut self, f: F) -> Result<R, SpiE, PinE>
    where
        F: FnOnce(&mut Self) -> Result<R, SpiE, PinE>,
    {
        let was_enabled = self.ce_enabled;
        if was_enabled {
            self.set_ce(false)?;
        }
        let result = f(self);
        if was_enabled {
            self.set_ce(true)?;
        }
        result
    }

    fn update_config<F: FnOnce(&mut Config)>(&mut self, f: F) -> Result<(), SpiE, PinE> {
        let old = self.config;
        f(&mut self.config);
        if self.config != old {
            self.write_register(reg::CONFIG, self.config.bits())?;
        }
        Ok(())
    }

    fn write_config(&mut self, config: Config) -> Result<(), SpiE, PinE> {
        self.config = config;
        self.write_register(reg::CONFIG, config.bits())?;
        Ok(())
    }

    /// Write a known pattern to TX_ADDR and read it back. The previous
    /// TX address is restored afterwards.
    pub fn self_test(&mut self) -> Result<bool, SpiE, PinE> {
        self.with_ce_low(|radio| {
            let mut saved = [0u8; MAX_ADDRESS_WIDTH];
            radio.read_register_multi(reg::TX_ADDR, &mut saved)?;

            radio.write_register_multi(reg::TX_ADDR, &SELF_TEST_ADDRESS)?;
            let mut echo = [0u8; MAX_ADDRESS_WIDTH];
            radio.read_register_multi(reg::TX_ADDR, &mut echo)?;

            radio.write_register_multi(reg::TX_ADDR, &saved)?;
            let ok = echo == SELF_TEST_ADDRESS;
            debug!("nrf24: self-test {}", if ok { "passed" } else { "failed" });
            Ok(ok)
        })
    }

    /// Program the whole link and power up in RX standby.
    ///
    /// Pipe 0 listens on the TX address so acknowledgments reach us, pipe 1
    /// on our own address. Both FIFOs are flushed and pending flags
    /// cleared. CE is left as it was, so a freshly created driver ends in
    /// standby.
    pub fn configure(&mut self, link: &RadioConfig) -> Result<(), SpiE, PinE> {
        self.with_ce_low(|radio| {
            let mut config = Config::from_bits(0);
            link.crc.apply(&mut config);
            radio.write_config(config)?;

            radio.set_channel(link.channel)?;

            let mut rf = RfSetup::from_bits(0);
            link.data_rate.apply(&mut rf);
            rf.set_rf_pwr(link.tx_power as u8);
            radio.write_register(reg::RF_SETUP, rf.bits())?;

            radio.set_address_width(link.address_width())?;
            radio.write_register_multi(reg::TX_ADDR, link.tx_address.as_bytes())?;
            radio.write_register_multi(reg::RX_ADDR_P0, link.tx_address.as_bytes())?;
            radio.write_register_multi(reg::RX_ADDR_P1, link.rx_address.as_bytes())?;

            let pipes = link.rx_pipes();
            radio.write_register(reg::EN_AA, if link.auto_ack { pipes } else { 0 })?;
            radio.write_register(reg::EN_RXADDR, pipes)?;

            let width = if link.dynamic_payload { 0 } else { link.payload_size };
            for pipe in 0..PIPE_COUNT {
                let width = if pipes & (1 << pipe) != 0 { width } else { 0 };
                radio.write_register(reg::RX_PW_P0 + pipe, width)?;
            }

            radio.set_retries(link.retry)?;

            let mut feature = Feature::from_bits(0);
            feature.set_en_dpl(link.dynamic_payload);
            radio.write_register(reg::FEATURE, feature.bits())?;
            radio.write_register(reg::DYNPD, if link.dynamic_payload { pipes } else { 0 })?;

            radio.flush_rx()?;
            radio.flush_tx()?;
            radio.clear_irq_flags()?;

            config.set_pwr_up(true);
            config.set_prim_rx(true);
            radio.write_config(config)?;
            radio.delay.delay_us(POWER_UP_DELAY_US);
            Ok(())
        })?;

        debug!(
            "nrf24: configured channel {}, {} byte payload, auto-ack {}",
            link.channel, link.payload_size, link.auto_ack
        );
        Ok(())
    }

    /// Snapshot of every configuration register
    pub fn read_dump(&mut self) -> Result<RegisterDump, SpiE, PinE> {
        let mut dump = RegisterDump {
            config: self.read_register(reg::CONFIG)?,
            en_aa: self.read_register(reg::EN_AA)?,
            en_rxaddr: self.read_register(reg::EN_RXADDR)?,
            setup_aw: self.read_register(reg::SETUP_AW)?,
            setup_retr: self.read_register(reg::SETUP_RETR)?,
            rf_ch: self.read_register(reg::RF_CH)?,
            rf_setup: self.read_register(reg::RF_SETUP)?,
            status: self.read_register(reg::STATUS)?,
            observe_tx: self.read_register(reg::OBSERVE_TX)?,
            rpd: self.read_register(reg::RPD)?,
            fifo_status: self.read_register(reg::FIFO_STATUS)?,
            dynpd: self.read_register(reg::DYNPD)?,
            feature: self.read_register(reg::FEATURE)?,
            ..RegisterDump::default()
        };
        self.read_register_multi(reg::RX_ADDR_P0, &mut dump.rx_addr_p0)?;
        self.read_register_multi(reg::RX_ADDR_P1, &mut dump.rx_addr_p1)?;
        for (i, lsb) in dump.rx_addr_p2_p5.iter_mut().enumerate() {
            *lsb = self.read_register(reg::RX_ADDR_P2 + i as u8)?;
        }
        self.read_register_multi(reg::TX_ADDR, &mut dump.tx_addr)?;
        for (i, width) in dump.rx_pw.iter_mut().enumerate() {
            *width = self.read_register(reg::RX_PW_P0 + i as u8)?;
        }
        Ok(dump)
    }

    /// Render all configuration registers to `out`. Writer errors are
    /// ignored; bus errors are returned.
    pub fn dump_config<W>(&mut self, out: &mut W) -> Result<(), SpiE, PinE>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let dump = self.read_dump()?;
        ufmt::uwrite!(out, "{}", dump).ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction as PinTransaction};
    use embedded_hal_mock::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    type Radio = Nrf24<SpiMock, PinMock, PinMock, MockNoop>;

    /// CSN toggles low/high once per command
    fn csn_frames(commands: usize) -> PinMock {
        let mut expectations = vec![PinTransaction::set(State::High)];
        for _ in 0..commands {
            expectations.push(PinTransaction::set(State::Low));
            expectations.push(PinTransaction::set(State::High));
        }
        PinMock::new(&expectations)
    }

    fn setup(spi: Vec<SpiTransaction>, ce: &[PinTransaction]) -> (Radio, SpiMock, PinMock, PinMock) {
        let csn = csn_frames(spi.len());
        let spi = SpiMock::new(&spi);
        let mut ce_expect = vec![PinTransaction::set(State::Low)];
        ce_expect.extend_from_slice(ce);
        let ce = PinMock::new(&ce_expect);
        let radio = Nrf24::new(spi.clone(), ce.clone(), csn.clone(), MockNoop::new()).unwrap();
        (radio, spi, ce, csn)
    }

    fn done(mut spi: SpiMock, mut ce: PinMock, mut csn: PinMock) {
        spi.done();
        ce.done();
        csn.done();
    }

    #[test]
    fn status_is_a_single_nop() {
        let spi = vec![SpiTransaction::transfer(vec![0xFF], vec![0x2E])];
        let (mut radio, spi, ce, csn) = setup(spi, &[]);
        let status = radio.status().unwrap();
        assert!(status.tx_ds());
        assert_eq!(status.pipe(), None);
        done(spi, ce, csn);
    }

    #[test]
    fn register_read_and_write_framing() {
        let spi = vec![
            SpiTransaction::transfer(vec![0x05, 0xFF], vec![0x0E, 0x73]),
            SpiTransaction::transfer(vec![0x25, 0x28], vec![0x0E, 0x00]),
            SpiTransaction::transfer(vec![0x17, 0xFF], vec![0x0E, 0x11]),
        ];
        let (mut radio, spi, ce, csn) = setup(spi, &[]);
        assert_eq!(radio.read_register(reg::RF_CH).unwrap(), 0x73);
        radio.set_channel(40).unwrap();
        let fifo = radio.fifo_status().unwrap();
        assert!(fifo.tx_empty());
        assert!(fifo.rx_empty());
        done(spi, ce, csn);
    }

    #[test]
    fn payload_write_is_one_frame() {
        let spi = vec![SpiTransaction::transfer(
            vec![0xA0, 1, 2, 3],
            vec![0x0E, 0, 0, 0],
        )];
        let (mut radio, spi, ce, csn) = setup(spi, &[]);
        radio.write_payload(&[1, 2, 3]).unwrap();
        done(spi, ce, csn);
    }

    #[test]
    fn payload_read_reports_pipe_from_status() {
        let spi = vec![SpiTransaction::transfer(
            vec![0x61, 0xFF, 0xFF],
            vec![0x42, 0x19, 0x00],
        )];
        let (mut radio, spi, ce, csn) = setup(spi, &[]);
        let mut out = [0u8; 2];
        let read = radio.read_payload(&mut out).unwrap();
        assert_eq!(read.len, 2);
        assert_eq!(read.status.pipe(), Some(1));
        assert_eq!(out, [0x19, 0x00]);
        done(spi, ce, csn);
    }

    #[test]
    fn addressing_restores_chip_enable() {
        let spi = vec![SpiTransaction::transfer(
            vec![0x2B, 0xE7, 0x1C, 0xE3],
            vec![0x0E, 0, 0, 0],
        )];
        let (mut radio, spi, ce, csn) = setup(
            spi,
            &[
                PinTransaction::set(State::High),
                PinTransaction::set(State::Low),
                PinTransaction::set(State::High),
            ],
        );
        radio.set_ce(true).unwrap();
        radio.set_address(1, &[0xE7, 0x1C, 0xE3]).unwrap();
        assert!(radio.is_ce_enabled());
        done(spi, ce, csn);
    }

    #[test]
    fn self_test_compares_full_width() {
        let saved = vec![0x0E, 0xE7, 0xE7, 0xE7, 0xE7, 0xE7];
        let spi = vec![
            SpiTransaction::transfer(vec![0x10, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF], saved),
            SpiTransaction::transfer(
                vec![0x30, b'n', b'R', b'F', b'2', b'4'],
                vec![0x0E, 0, 0, 0, 0, 0],
            ),
            SpiTransaction::transfer(
                vec![0x10, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
                vec![0x0E, b'n', b'R', b'F', b'2', b'5'],
            ),
            SpiTransaction::transfer(
                vec![0x30, 0xE7, 0xE7, 0xE7, 0xE7, 0xE7],
                vec![0x0E, 0, 0, 0, 0, 0],
            ),
        ];
        let (mut radio, spi, ce, csn) = setup(spi, &[]);
        assert!(!radio.self_test().unwrap());
        done(spi, ce, csn);
    }

    #[test]
    fn power_up_writes_config_once() {
        let spi = vec![SpiTransaction::transfer(vec![0x20, 0x0A], vec![0x0E, 0])];
        let (mut radio, spi, ce, csn) = setup(spi, &[]);
        radio.power_up().unwrap();
        radio.power_up().unwrap();
        assert!(radio.is_powered_up());
        done(spi, ce, csn);
    }
}
