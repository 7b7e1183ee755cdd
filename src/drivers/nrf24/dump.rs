//! Register snapshot for the console

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

use super::registers::{Config, CrcMode, DataRate, RfSetup, SetupAw, SetupRetr};
use crate::config::MAX_ADDRESS_WIDTH;
use crate::drivers::serial_console::Hex;

/// Raw values of the configuration registers, as read in one sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterDump {
    pub config: u8,
    pub en_aa: u8,
    pub en_rxaddr: u8,
    pub setup_aw: u8,
    pub setup_retr: u8,
    pub rf_ch: u8,
    pub rf_setup: u8,
    pub status: u8,
    pub observe_tx: u8,
    pub rpd: u8,
    pub rx_addr_p0: [u8; MAX_ADDRESS_WIDTH],
    pub rx_addr_p1: [u8; MAX_ADDRESS_WIDTH],
    /// Least significant address byte of pipes 2 to 5
    pub rx_addr_p2_p5: [u8; 4],
    pub tx_addr: [u8; MAX_ADDRESS_WIDTH],
    pub rx_pw: [u8; 6],
    pub fifo_status: u8,
    pub dynpd: u8,
    pub feature: u8,
}

impl RegisterDump {
    /// Address width in bytes as encoded in SETUP_AW
    pub fn address_width(&self) -> usize {
        (SetupAw::from_bits(self.setup_aw).aw() as usize + 2).min(MAX_ADDRESS_WIDTH)
    }

    pub fn data_rate(&self) -> DataRate {
        DataRate::from_rf_setup(RfSetup::from_bits(self.rf_setup))
    }

    pub fn crc(&self) -> CrcMode {
        CrcMode::from_config(Config::from_bits(self.config))
    }
}

fn line<W: uWrite + ?Sized>(
    f: &mut Formatter<'_, W>,
    name: &str,
    value: u8,
) -> Result<(), W::Error> {
    f.write_str(name)?;
    uwrite!(f, "0x{}\r\n", Hex(value))
}

fn address<W: uWrite + ?Sized>(
    f: &mut Formatter<'_, W>,
    name: &str,
    bytes: &[u8],
) -> Result<(), W::Error> {
    f.write_str(name)?;
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_str(":")?;
        }
        uwrite!(f, "{}", Hex(*b))?;
    }
    f.write_str("\r\n")
}

impl uDisplay for RegisterDump {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let width = self.address_width();
        line(f, "CONFIG      ", self.config)?;
        line(f, "EN_AA       ", self.en_aa)?;
        line(f, "EN_RXADDR   ", self.en_rxaddr)?;
        line(f, "SETUP_AW    ", self.setup_aw)?;
        line(f, "SETUP_RETR  ", self.setup_retr)?;
        let retr = SetupRetr::from_bits(self.setup_retr);
        uwrite!(
            f,
            "  retry {}us x {}\r\n",
            (retr.ard() as u32 + 1) * 250,
            retr.arc()
        )?;
        line(f, "RF_CH       ", self.rf_ch)?;
        uwrite!(f, "  {} MHz\r\n", 2400 + self.rf_ch as u16)?;
        line(f, "RF_SETUP    ", self.rf_setup)?;
        let rate = match self.data_rate() {
            DataRate::Kbps250 => "250kbps",
            DataRate::Mbps1 => "1Mbps",
            DataRate::Mbps2 => "2Mbps",
        };
        let crc = match self.crc() {
            CrcMode::Disabled => "off",
            CrcMode::OneByte => "1 byte",
            CrcMode::TwoBytes => "2 bytes",
        };
        uwrite!(f, "  {}, crc {}\r\n", rate, crc)?;
        line(f, "STATUS      ", self.status)?;
        line(f, "OBSERVE_TX  ", self.observe_tx)?;
        line(f, "RPD         ", self.rpd)?;
        address(f, "RX_ADDR_P0  ", &self.rx_addr_p0[..width])?;
        address(f, "RX_ADDR_P1  ", &self.rx_addr_p1[..width])?;
        address(f, "RX_ADDR_P2-5 ", &self.rx_addr_p2_p5)?;
        address(f, "TX_ADDR     ", &self.tx_addr[..width])?;
        address(f, "RX_PW_P0-5  ", &self.rx_pw)?;
        line(f, "FIFO_STATUS ", self.fifo_status)?;
        line(f, "DYNPD       ", self.dynpd)?;
        line(f, "FEATURE     ", self.feature)
    }
}
