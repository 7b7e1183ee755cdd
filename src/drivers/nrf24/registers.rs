//! nRF24L01+ register map, command set and bit layouts
//!
//! Multi-field registers are modelled as bitfield structs so every field
//! names the bits it occupies. Values are always written back as whole
//! bytes.

use bitfield::bitfield;

/// Register addresses
pub mod reg {
    pub const CONFIG: u8 = 0x00;
    pub const EN_AA: u8 = 0x01;
    pub const EN_RXADDR: u8 = 0x02;
    pub const SETUP_AW: u8 = 0x03;
    pub const SETUP_RETR: u8 = 0x04;
    pub const RF_CH: u8 = 0x05;
    pub const RF_SETUP: u8 = 0x06;
    pub const STATUS: u8 = 0x07;
    pub const OBSERVE_TX: u8 = 0x08;
    pub const RPD: u8 = 0x09;
    pub const RX_ADDR_P0: u8 = 0x0A;
    pub const RX_ADDR_P1: u8 = 0x0B;
    pub const RX_ADDR_P2: u8 = 0x0C;
    pub const RX_ADDR_P3: u8 = 0x0D;
    pub const RX_ADDR_P4: u8 = 0x0E;
    pub const RX_ADDR_P5: u8 = 0x0F;
    pub const TX_ADDR: u8 = 0x10;
    pub const RX_PW_P0: u8 = 0x11;
    pub const RX_PW_P1: u8 = 0x12;
    pub const RX_PW_P2: u8 = 0x13;
    pub const RX_PW_P3: u8 = 0x14;
    pub const RX_PW_P4: u8 = 0x15;
    pub const RX_PW_P5: u8 = 0x16;
    pub const FIFO_STATUS: u8 = 0x17;
    pub const DYNPD: u8 = 0x1C;
    pub const FEATURE: u8 = 0x1D;
}

/// SPI command bytes
pub mod cmd {
    pub const R_REGISTER: u8 = 0x00;
    pub const W_REGISTER: u8 = 0x20;
    pub const REGISTER_MASK: u8 = 0x1F;
    pub const R_RX_PL_WID: u8 = 0x60;
    pub const R_RX_PAYLOAD: u8 = 0x61;
    pub const W_TX_PAYLOAD: u8 = 0xA0;
    pub const FLUSH_TX: u8 = 0xE1;
    pub const FLUSH_RX: u8 = 0xE2;
    pub const REUSE_TX_PL: u8 = 0xE3;
    pub const NOP: u8 = 0xFF;
}

/// Number of receive pipes
pub const PIPE_COUNT: u8 = 6;

/// RX_P_NO value reported while the RX FIFO is empty
pub const RX_P_NO_EMPTY: u8 = 0b111;

bitfield! {
    /// CONFIG (0x00)
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Config(u8);
    impl Debug;
    // bit 6: keep RX_DR off the IRQ line
    pub mask_rx_dr, set_mask_rx_dr: 6;
    // bit 5: keep TX_DS off the IRQ line
    pub mask_tx_ds, set_mask_tx_ds: 5;
    // bit 4: keep MAX_RT off the IRQ line
    pub mask_max_rt, set_mask_max_rt: 4;
    // bit 3: CRC enable (forced high while any EN_AA bit is set)
    pub en_crc, set_en_crc: 3;
    // bit 2: CRC length, 0 = 1 byte, 1 = 2 bytes
    pub crco, set_crco: 2;
    // bit 1: power up
    pub pwr_up, set_pwr_up: 1;
    // bit 0: 1 = PRX, 0 = PTX
    pub prim_rx, set_prim_rx: 0;
}

bitfield! {
    /// SETUP_AW (0x03)
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct SetupAw(u8);
    impl Debug;
    // bits 1:0: address width minus two
    pub u8, aw, set_aw: 1, 0;
}

bitfield! {
    /// SETUP_RETR (0x04)
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct SetupRetr(u8);
    impl Debug;
    // bits 7:4: auto retransmit delay, (ARD + 1) * 250 us
    pub u8, ard, set_ard: 7, 4;
    // bits 3:0: auto retransmit count, 0 disables retransmission
    pub u8, arc, set_arc: 3, 0;
}

bitfield! {
    /// RF_SETUP (0x06)
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct RfSetup(u8);
    impl Debug;
    // bit 7: continuous carrier transmit
    pub cont_wave, set_cont_wave: 7;
    // bit 5: 250 kbps, overrides RF_DR_HIGH
    pub rf_dr_low, set_rf_dr_low: 5;
    // bit 4: force PLL lock (test only)
    pub pll_lock, set_pll_lock: 4;
    // bit 3: 2 Mbps when RF_DR_LOW is clear
    pub rf_dr_high, set_rf_dr_high: 3;
    // bits 2:1: output power, 0 = -18 dBm .. 3 = 0 dBm
    pub u8, rf_pwr, set_rf_pwr: 2, 1;
}

bitfield! {
    /// STATUS (0x07), also clocked out as the first byte of every command
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Status(u8);
    impl Debug;
    // bit 6: data ready in RX FIFO, write 1 to clear
    pub rx_dr, set_rx_dr: 6;
    // bit 5: packet sent (acknowledged when auto-ack is on), write 1 to clear
    pub tx_ds, set_tx_ds: 5;
    // bit 4: maximum retransmits reached, write 1 to clear
    pub max_rt, set_max_rt: 4;
    // bits 3:1: pipe of the payload at the RX FIFO head, 7 = empty
    pub u8, rx_p_no, _: 3, 1;
    // bit 0: TX FIFO full
    pub tx_full, _: 0;
}

bitfield! {
    /// OBSERVE_TX (0x08)
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct ObserveTx(u8);
    impl Debug;
    // bits 7:4: lost packets, saturates at 15, reset by writing RF_CH
    pub u8, plos_cnt, _: 7, 4;
    // bits 3:0: retransmits of the current packet
    pub u8, arc_cnt, _: 3, 0;
}

bitfield! {
    /// FIFO_STATUS (0x17)
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct FifoStatus(u8);
    impl Debug;
    // bit 6: reuse last transmitted payload
    pub tx_reuse, _: 6;
    // bit 5: TX FIFO full
    pub tx_full, _: 5;
    // bit 4: TX FIFO empty
    pub tx_empty, _: 4;
    // bit 1: RX FIFO full
    pub rx_full, _: 1;
    // bit 0: RX FIFO empty
    pub rx_empty, _: 0;
}

bitfield! {
    /// FEATURE (0x1D)
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Feature(u8);
    impl Debug;
    // bit 2: dynamic payload length
    pub en_dpl, set_en_dpl: 2;
    // bit 1: payload with ACK
    pub en_ack_pay, set_en_ack_pay: 1;
    // bit 0: W_TX_PAYLOAD_NOACK command
    pub en_dyn_ack, set_en_dyn_ack: 0;
}

macro_rules! impl_raw_bits {
    ($($reg:ident),*) => {
        $(
            impl $reg {
                #[inline]
                pub const fn from_bits(bits: u8) -> Self {
                    Self(bits)
                }

                #[inline]
                pub const fn bits(&self) -> u8 {
                    self.0
                }
            }

            #[cfg(feature = "defmt")]
            impl defmt::Format for $reg {
                fn format(&self, f: defmt::Formatter) {
                    defmt::write!(f, "{}({=u8:#x})", stringify!($reg), self.0)
                }
            }
        )*
    };
}

impl_raw_bits!(Config, SetupAw, SetupRetr, RfSetup, Status, ObserveTx, FifoStatus, Feature);

impl Status {
    /// Value written to STATUS to clear RX_DR, TX_DS and MAX_RT
    pub const CLEAR_IRQ: Status = Status(0b0111_0000);

    /// Pipe that produced the payload at the RX FIFO head
    pub fn pipe(&self) -> Option<u8> {
        let pipe = self.rx_p_no();
        if pipe < PIPE_COUNT {
            Some(pipe)
        } else {
            None
        }
    }
}

/// Air data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    /// Slowest and most robust
    Kbps250,
    Mbps1,
    Mbps2,
}

impl DataRate {
    pub fn apply(self, rf: &mut RfSetup) {
        let (low, high) = match self {
            DataRate::Kbps250 => (true, false),
            DataRate::Mbps1 => (false, false),
            DataRate::Mbps2 => (false, true),
        };
        rf.set_rf_dr_low(low);
        rf.set_rf_dr_high(high);
    }

    pub fn from_rf_setup(rf: RfSetup) -> Self {
        match (rf.rf_dr_low(), rf.rf_dr_high()) {
            (true, _) => DataRate::Kbps250,
            (false, true) => DataRate::Mbps2,
            (false, false) => DataRate::Mbps1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrcMode {
    Disabled,
    OneByte,
    TwoBytes,
}

impl CrcMode {
    pub fn apply(self, config: &mut Config) {
        let (enabled, two_bytes) = match self {
            CrcMode::Disabled => (false, false),
            CrcMode::OneByte => (true, false),
            CrcMode::TwoBytes => (true, true),
        };
        config.set_en_crc(enabled);
        config.set_crco(two_bytes);
    }

    pub fn from_config(config: Config) -> Self {
        match (config.en_crc(), config.crco()) {
            (false, _) => CrcMode::Disabled,
            (true, false) => CrcMode::OneByte,
            (true, true) => CrcMode::TwoBytes,
        }
    }
}

/// Output power, discriminant is the RF_PWR field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TxPower {
    Minus18dBm = 0,
    Minus12dBm = 1,
    Minus6dBm = 2,
    ZerodBm = 3,
}

impl TxPower {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => TxPower::Minus18dBm,
            1 => TxPower::Minus12dBm,
            2 => TxPower::Minus6dBm,
            _ => TxPower::ZerodBm,
        }
    }
}

/// Primary role selected by CONFIG.PRIM_RX
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Tx,
    Rx,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_fields_follow_datasheet_layout() {
        let status = Status::from_bits(0b0010_0011);
        assert!(status.tx_ds());
        assert!(!status.max_rt());
        assert_eq!(status.rx_p_no(), 1);
        assert_eq!(status.pipe(), Some(1));
        assert!(status.tx_full());

        assert_eq!(Status::from_bits(0x0E).pipe(), None);
    }

    #[test]
    fn retry_register_packs_delay_and_count() {
        let mut retr = SetupRetr::from_bits(0);
        retr.set_ard(4);
        retr.set_arc(15);
        assert_eq!(retr.bits(), 0x4F);
    }

    #[test]
    fn rf_setup_encodes_rate_and_power() {
        let mut rf = RfSetup::from_bits(0);
        DataRate::Kbps250.apply(&mut rf);
        rf.set_rf_pwr(TxPower::ZerodBm as u8);
        assert_eq!(rf.bits(), 0x26);
        assert_eq!(DataRate::from_rf_setup(rf), DataRate::Kbps250);

        DataRate::Mbps2.apply(&mut rf);
        assert_eq!(rf.bits(), 0x0E);
    }

    #[test]
    fn crc_mode_sets_config_bits() {
        let mut config = Config::from_bits(0);
        CrcMode::TwoBytes.apply(&mut config);
        assert_eq!(config.bits(), 0x0C);
        CrcMode::OneByte.apply(&mut config);
        assert_eq!(config.bits(), 0x08);
        assert_eq!(CrcMode::from_config(config), CrcMode::OneByte);
    }
}
