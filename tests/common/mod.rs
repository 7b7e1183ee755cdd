//! Simulated nRF24L01+ for host tests.
//!
//! The chip decodes every SPI frame the driver sends, keeps a register
//! file and both FIFOs, and completes a transmission after a scripted
//! number of STATUS polls while CE is high in PTX mode.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

use telemetry_node::drivers::nrf24::registers::{cmd, reg};
use telemetry_node::drivers::Nrf24;
use telemetry_node::protocol::{Address, Radio, RadioConfig, RetryPolicy, Session};

const RX_DR: u8 = 1 << 6;
const TX_DS: u8 = 1 << 5;
const MAX_RT: u8 = 1 << 4;

/// How the pending transmission ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Never,
    Sent { after_polls: u32 },
    MaxRetransmit { after_polls: u32 },
}

#[derive(Debug)]
pub struct Chip {
    pub regs: [u8; 0x20],
    pub tx_addr: [u8; 5],
    pub rx_addr_p0: [u8; 5],
    pub rx_addr_p1: [u8; 5],
    pub irq: u8,
    pub tx_fifo: Vec<Vec<u8>>,
    pub rx_fifo: VecDeque<(u8, Vec<u8>)>,
    pub completion: Completion,
    /// Polls seen since the last payload was loaded
    pub polls: u32,
    /// Every NOP ever clocked in
    pub nops: u32,
    /// Forced first byte of every reply, e.g. 0xFF for a floating MISO
    pub garbage: Option<u8>,
    /// Forced R_RX_PL_WID reply
    pub width_override: Option<u8>,
    pub tx_flushes: u32,
    pub rx_flushes: u32,
    pub ce: bool,
    pub ce_history: Vec<bool>,
    pub frames: Vec<Vec<u8>>,
    pub delayed_us: u32,
    /// TX_ADDR ignores writes, as on a dead chip
    pub stuck_tx_addr: bool,
    /// The n-th NOP (counting from 1) fails on the bus
    pub fail_on_nop: Option<u32>,
}

impl Chip {
    fn new() -> Self {
        let mut regs = [0u8; 0x20];
        regs[reg::CONFIG as usize] = 0x08;
        regs[reg::SETUP_AW as usize] = 0x03;
        regs[reg::RF_CH as usize] = 0x02;
        Self {
            regs,
            tx_addr: [0xE7; 5],
            rx_addr_p0: [0xE7; 5],
            rx_addr_p1: [0xC2; 5],
            irq: 0,
            tx_fifo: Vec::new(),
            rx_fifo: VecDeque::new(),
            completion: Completion::Never,
            polls: 0,
            nops: 0,
            garbage: None,
            width_override: None,
            tx_flushes: 0,
            rx_flushes: 0,
            ce: false,
            ce_history: Vec::new(),
            frames: Vec::new(),
            delayed_us: 0,
            stuck_tx_addr: false,
            fail_on_nop: None,
        }
    }

    pub fn reg(&self, register: u8) -> u8 {
        self.regs[register as usize]
    }

    /// Queue an incoming payload and raise RX_DR
    pub fn deliver(&mut self, pipe: u8, payload: &[u8]) {
        self.rx_fifo.push_back((pipe, payload.to_vec()));
        self.irq |= RX_DR;
    }

    pub fn status(&self) -> u8 {
        let pipe = self.rx_fifo.front().map_or(0b111, |(pipe, _)| *pipe);
        let tx_full = u8::from(self.tx_fifo.len() >= 3);
        self.irq | (pipe << 1) | tx_full
    }

    fn fifo_status(&self) -> u8 {
        let mut bits = 0;
        if self.rx_fifo.is_empty() {
            bits |= 1 << 0;
        }
        if self.rx_fifo.len() >= 3 {
            bits |= 1 << 1;
        }
        if self.tx_fifo.is_empty() {
            bits |= 1 << 4;
        }
        if self.tx_fifo.len() >= 3 {
            bits |= 1 << 5;
        }
        bits
    }

    fn transmitting(&self) -> bool {
        let prim_rx = self.regs[reg::CONFIG as usize] & 1 != 0;
        self.ce && !prim_rx && !self.tx_fifo.is_empty()
    }

    fn poll(&mut self) {
        self.nops += 1;
        if !self.transmitting() || self.irq & (TX_DS | MAX_RT) != 0 {
            return;
        }
        self.polls += 1;
        match self.completion {
            Completion::Sent { after_polls } if self.polls >= after_polls => {
                self.tx_fifo.remove(0);
                self.irq |= TX_DS;
            }
            Completion::MaxRetransmit { after_polls } if self.polls >= after_polls => {
                self.irq |= MAX_RT;
            }
            _ => {}
        }
    }

    fn address_mut(&mut self, register: u8) -> Option<&mut [u8; 5]> {
        match register {
            reg::TX_ADDR => Some(&mut self.tx_addr),
            reg::RX_ADDR_P0 => Some(&mut self.rx_addr_p0),
            reg::RX_ADDR_P1 => Some(&mut self.rx_addr_p1),
            _ => None,
        }
    }

    fn execute(&mut self, words: &mut [u8]) {
        self.frames.push(words.to_vec());
        let command = words[0];

        if command == cmd::NOP {
            self.poll();
        }
        let status = self.status();

        match command {
            c if c < cmd::W_REGISTER => {
                let register = c & cmd::REGISTER_MASK;
                if let Some(addr) = self.address_mut(register) {
                    let addr = *addr;
                    for (dst, src) in words[1..].iter_mut().zip(addr.iter()) {
                        *dst = *src;
                    }
                } else if let Some(out) = words.get_mut(1) {
                    *out = match register {
                        reg::STATUS => status,
                        reg::FIFO_STATUS => self.fifo_status(),
                        r => self.regs[r as usize],
                    };
                }
            }
            c if c & !cmd::REGISTER_MASK == cmd::W_REGISTER => {
                let register = c & cmd::REGISTER_MASK;
                let stuck = register == reg::TX_ADDR && self.stuck_tx_addr;
                if register == reg::STATUS {
                    self.irq &= !(words[1] & (RX_DR | TX_DS | MAX_RT));
                } else if stuck {
                    // writes ignored
                } else if let Some(addr) = self.address_mut(register) {
                    for (dst, src) in addr.iter_mut().zip(words[1..].iter()) {
                        *dst = *src;
                    }
                } else {
                    self.regs[register as usize] = words[1];
                }
            }
            cmd::R_RX_PL_WID => {
                words[1] = self
                    .width_override
                    .or_else(|| self.rx_fifo.front().map(|(_, p)| p.len() as u8))
                    .unwrap_or(0);
            }
            cmd::R_RX_PAYLOAD => {
                if let Some((_, payload)) = self.rx_fifo.pop_front() {
                    for (i, dst) in words[1..].iter_mut().enumerate() {
                        *dst = payload.get(i).copied().unwrap_or(0);
                    }
                }
            }
            cmd::W_TX_PAYLOAD => {
                self.tx_fifo.push(words[1..].to_vec());
                self.polls = 0;
            }
            cmd::FLUSH_TX => {
                self.tx_fifo.clear();
                self.tx_flushes += 1;
            }
            cmd::FLUSH_RX => {
                self.rx_fifo.clear();
                self.rx_flushes += 1;
            }
            _ => {}
        }

        words[0] = self.garbage.unwrap_or(status);
    }
}

pub type SharedChip = Rc<RefCell<Chip>>;

/// SPI transfer that never reached the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

pub struct FakeSpi(SharedChip);

impl Transfer<u8> for FakeSpi {
    type Error = BusFault;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], BusFault> {
        let mut chip = self.0.borrow_mut();
        if words[0] == cmd::NOP && chip.fail_on_nop == Some(chip.nops + 1) {
            chip.nops += 1;
            return Err(BusFault);
        }
        chip.execute(words);
        Ok(words)
    }
}

/// Chip enable line, mirrored into the chip
pub struct CePin(SharedChip);

impl OutputPin for CePin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut chip = self.0.borrow_mut();
        chip.ce = false;
        chip.ce_history.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut chip = self.0.borrow_mut();
        chip.ce = true;
        chip.ce_history.push(true);
        Ok(())
    }
}

/// Chip select; framing is implied by each transfer
pub struct CsnPin;

impl OutputPin for CsnPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

pub struct FakeDelay(SharedChip);

impl DelayUs<u16> for FakeDelay {
    fn delay_us(&mut self, us: u16) {
        self.0.borrow_mut().delayed_us += u32::from(us);
    }
}

pub type FakeDriver = Nrf24<FakeSpi, CePin, CsnPin, FakeDelay>;
pub type FakeRadio = Radio<FakeSpi, CePin, CsnPin, FakeDelay>;

pub fn driver() -> (FakeDriver, SharedChip) {
    let chip = Rc::new(RefCell::new(Chip::new()));
    let driver = Nrf24::new(
        FakeSpi(chip.clone()),
        CePin(chip.clone()),
        CsnPin,
        FakeDelay(chip.clone()),
    )
    .unwrap();
    (driver, chip)
}

/// A configured radio in RX standby, listening
pub fn radio(config: RadioConfig) -> (FakeRadio, SharedChip) {
    let (driver, chip) = driver();
    let session = Session::new(config).unwrap();
    let mut radio = Radio::new(driver, session);
    radio.configure().unwrap();
    radio.start_listening().unwrap();
    {
        let mut chip = chip.borrow_mut();
        chip.frames.clear();
        chip.ce_history.clear();
        chip.nops = 0;
        chip.delayed_us = 0;
        chip.tx_flushes = 0;
        chip.rx_flushes = 0;
    }
    (radio, chip)
}

/// Retransmission disabled, so a budget of 25 polls or more validates
pub fn small_budget(budget: u32) -> RadioConfig {
    RadioConfig {
        retry: RetryPolicy::new(0, 0),
        tx_poll_budget: budget,
        ..RadioConfig::default()
    }
}

/// Auto-ack link with pipe 0 enabled
pub fn acked(budget: u32) -> RadioConfig {
    RadioConfig {
        auto_ack: true,
        rx_address: Address::new(&[0xC2, 0xC2, 0xC2]).unwrap(),
        ..small_budget(budget)
    }
}
