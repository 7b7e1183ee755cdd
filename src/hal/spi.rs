//! SPI master on the hardware peripheral

use avr_device::atmega128a::SPI;
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::blocking::spi::Transfer;

use super::gpio::board::{MISO, MOSI, SCK, SS};

/// SPI clock prescaler options
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum SpiPrescaler {
    Div4 = 0,
    Div16 = 1,
    Div64 = 2,
    Div128 = 3,
}

/// SPI peripheral driver, mode 0, MSB first
pub struct Spi {
    _spi: PhantomData<SPI>,
    _pins: (SS, SCK, MOSI, MISO),
}

impl Spi {
    /// Enable the peripheral as master. SS is kept as an output so a low
    /// level on it cannot drop the peripheral into slave mode.
    pub fn new(pins: (SS, SCK, MOSI, MISO), prescaler: SpiPrescaler) -> Self {
        unsafe {
            let p = SPI::ptr();
            // SPE | MSTR, CPOL = CPHA = 0
            (*p).spcr.write(|w| w.bits(0x50 | prescaler as u8));
        }
        Self {
            _spi: PhantomData,
            _pins: pins,
        }
    }

    /// Transfer a single byte
    pub fn transfer_byte(&mut self, byte: u8) -> u8 {
        unsafe {
            let p = SPI::ptr();

            // Start transmission
            (*p).spdr.write(|w| w.bits(byte));

            // Wait for SPIF
            while (*p).spsr.read().bits() & 0x80 == 0 {}

            (*p).spdr.read().bits()
        }
    }
}

impl Transfer<u8> for Spi {
    type Error = Infallible;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Infallible> {
        for word in words.iter_mut() {
            *word = self.transfer_byte(*word);
        }
        Ok(words)
    }
}
