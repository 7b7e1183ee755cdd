use avr_device::atmega128a::PORTB;
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::v2::OutputPin;

pub trait PinMode {}
pub struct Input;
pub struct Output;
impl PinMode for Input {}
impl PinMode for Output {}

/// One line of port B
#[derive(Debug)]
pub struct Pin<const PIN: u8, MODE> {
    _mode: PhantomData<MODE>,
}

impl<const P: u8, MODE: PinMode> Pin<P, MODE> {
    /// Claim the line. The caller must not hand out the same pin twice.
    pub const unsafe fn steal() -> Self {
        Pin { _mode: PhantomData }
    }

    pub fn into_output(self) -> Pin<P, Output> {
        // Set DDRB bit
        unsafe {
            (*PORTB::ptr()).ddrb.modify(|r, w| w.bits(r.bits() | (1 << P)));
        }
        Pin { _mode: PhantomData }
    }

    pub fn into_input(self) -> Pin<P, Input> {
        // Clear DDRB bit and disable pull-up
        unsafe {
            (*PORTB::ptr()).ddrb.modify(|r, w| w.bits(r.bits() & !(1 << P)));
            (*PORTB::ptr()).portb.modify(|r, w| w.bits(r.bits() & !(1 << P)));
        }
        Pin { _mode: PhantomData }
    }
}

impl<const P: u8> OutputPin for Pin<P, Output> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Infallible> {
        unsafe {
            (*PORTB::ptr()).portb.modify(|r, w| w.bits(r.bits() | (1 << P)));
        }
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Infallible> {
        unsafe {
            (*PORTB::ptr()).portb.modify(|r, w| w.bits(r.bits() & !(1 << P)));
        }
        Ok(())
    }
}

impl<const P: u8> Pin<P, Input> {
    #[inline]
    pub fn is_high(&self) -> bool {
        unsafe { ((*PORTB::ptr()).pinb.read().bits() & (1 << P)) != 0 }
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        !self.is_high()
    }
}

// Radio board wiring on port B
pub mod board {
    use super::*;

    /// Hardware SS; must stay an output for the SPI to remain master
    pub type SS = Pin<0, Output>;
    pub type SCK = Pin<1, Output>;
    pub type MOSI = Pin<2, Output>;
    pub type MISO = Pin<3, Input>;
    pub type RADIO_CE = Pin<4, Output>;
    pub type RADIO_CSN = Pin<5, Output>;
}
