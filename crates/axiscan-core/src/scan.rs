//! Flash scan loop
//!
//! Walks the flash word by word and prints every word as one text line over
//! the UART:
//!
//! ```text
//! 0x00000000: 0xdeadbeef\r\n
//! ```
//!
//! The driver exposes a single-iteration [`ScanDriver::step`] so one line
//! can be exercised in isolation, and [`ScanDriver::run`] for the
//! scan-forever behavior of the original firmware, bounded only by an
//! external cancellation flag.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::bus::RegisterBus;
use crate::error::Result;
use crate::spi::SpiFlashReader;
use crate::uart::UartTransmitter;

/// Map a nibble to its lowercase ASCII hex digit.
fn hex_digit(nibble: u32) -> u8 {
    debug_assert!(nibble < 16);
    if nibble < 10 {
        b'0' + nibble as u8
    } else {
        b'a' + (nibble - 10) as u8
    }
}

/// Drives the scan: read a word, print a line, advance, repeat.
///
/// Owns both peripheral drivers and the address cursor. The cursor moves
/// exactly once per step, read failure or not, so a stretch of bad flash
/// never stalls the scan.
pub struct ScanDriver<S, U> {
    spi: SpiFlashReader<S>,
    uart: UartTransmitter<U>,
    cursor: u32,
}

impl<S: RegisterBus, U: RegisterBus> ScanDriver<S, U> {
    /// Create a driver scanning from address 0.
    pub fn new(spi: SpiFlashReader<S>, uart: UartTransmitter<U>) -> Self {
        Self {
            spi,
            uart,
            cursor: 0,
        }
    }

    /// Create a driver scanning from `start`, which must be word aligned.
    pub fn with_start(spi: SpiFlashReader<S>, uart: UartTransmitter<U>, start: u32) -> Result<Self> {
        if start % 4 != 0 {
            return Err(crate::Error::UnalignedAddress { addr: start });
        }
        let mut driver = Self::new(spi, uart);
        driver.cursor = start;
        Ok(driver)
    }

    /// Address the next step will read.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// The UART side, for diagnostics counters.
    pub fn uart(&self) -> &UartTransmitter<U> {
        &self.uart
    }

    /// Emit the startup preamble (two blank lines), as the firmware does
    /// to detach from whatever the terminal showed before reset.
    pub fn announce(&mut self) -> Result<()> {
        self.uart.put_str("\r\n\r\n")
    }

    /// Scan one word: print `0x<addr>: 0x<value>` and advance the cursor.
    ///
    /// A failed flash read is logged, reported in-band as a `read error`
    /// line, and does not surface here; the returned error covers only the
    /// UART transmit path, where a timeout aborts the rest of the line.
    pub fn step(&mut self) -> Result<()> {
        let addr = self.cursor;
        self.advance();

        self.put_hex_u32(addr)?;
        self.uart.put_str(": ")?;
        match self.spi.read_word(addr) {
            Ok(word) => {
                self.uart.put_str("0x")?;
                for byte in word {
                    self.uart.put_byte(hex_digit(u32::from(byte) >> 4))?;
                    self.uart.put_byte(hex_digit(u32::from(byte) & 0xf))?;
                }
            }
            Err(err) => {
                log::warn!("flash read at {:#010x} failed: {}", addr, err);
                self.uart.put_str("read error")?;
            }
        }
        self.uart.put_str("\r\n")
    }

    /// Scan until `cancel` is set, checked once per iteration.
    ///
    /// Per-step errors are logged and the loop keeps going; with the flag
    /// never set this runs forever, like the firmware it replaces.
    pub fn run(&mut self, cancel: &AtomicBool) {
        while !cancel.load(Ordering::Relaxed) {
            if let Err(err) = self.step() {
                log::error!(
                    "scan step at {:#010x} failed: {}",
                    self.cursor.wrapping_sub(4),
                    err
                );
            }
        }
    }

    /// `0x` followed by 8 hex digits, most significant nibble first.
    fn put_hex_u32(&mut self, value: u32) -> Result<()> {
        self.uart.put_str("0x")?;
        for shift in (0..8).rev() {
            self.uart.put_byte(hex_digit((value >> (shift * 4)) & 0xf))?;
        }
        Ok(())
    }

    fn advance(&mut self) {
        let (next, wrapped) = self.cursor.overflowing_add(4);
        if wrapped {
            log::warn!("address cursor wrapped past the 32-bit boundary, restarting at 0");
        }
        self.cursor = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_digits_cover_both_ranges() {
        assert_eq!(hex_digit(0), b'0');
        assert_eq!(hex_digit(9), b'9');
        assert_eq!(hex_digit(10), b'a');
        assert_eq!(hex_digit(15), b'f');
    }

    #[test]
    fn hex_encoding_round_trips() {
        let mut digits = std::vec::Vec::new();
        let value: u32 = 0x0460_9f31;
        for shift in (0..8).rev() {
            digits.push(hex_digit((value >> (shift * 4)) & 0xf));
        }
        let text = core::str::from_utf8(&digits).unwrap();
        assert_eq!(u32::from_str_radix(text, 16).unwrap(), value);
    }
}
