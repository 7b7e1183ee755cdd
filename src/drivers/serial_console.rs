//! Line-oriented console over any `ufmt` sink

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";

/// Byte rendered as two upper-case hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hex(pub u8);

impl uDisplay for Hex {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_char(HEX_CHARS[(self.0 >> 4) as usize] as char)?;
        f.write_char(HEX_CHARS[(self.0 & 0xF) as usize] as char)
    }
}

pub struct SerialConsole<W> {
    out: W,
}

impl<W: uWrite> SerialConsole<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), W::Error> {
        self.out.write_str(s)
    }

    pub fn write_line(&mut self, s: &str) -> Result<(), W::Error> {
        self.write_str(s)?;
        self.write_str("\r\n")
    }

    pub fn write_hex(&mut self, val: u8) -> Result<(), W::Error> {
        uwrite!(self.out, "{}", Hex(val))
    }

    // Print formatted debug info
    pub fn debug(&mut self, msg: &str, val: u8) -> Result<(), W::Error> {
        uwrite!(self.out, "[DBG] {}: 0x{}\r\n", msg, Hex(val))
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn release(self) -> W {
        self.out
    }
}

impl<W: uWrite> uWrite for SerialConsole<W> {
    type Error = W::Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.out.write_str(s)
    }

    fn write_char(&mut self, c: char) -> Result<(), Self::Error> {
        self.out.write_char(c)
    }
}
