//! UART transmit path
//!
//! The UART controller buffers outgoing bytes in a hardware TX FIFO and
//! raises a status bit while that FIFO is full. Transmission is strictly
//! flow controlled: a byte is only written once the full flag has cleared,
//! so nothing is ever dropped or reordered. Receive-side error bits
//! (overrun, framing) are counted and logged as diagnostics but never stop
//! the transmit path.

use crate::bus::{self, RegisterBus};
use crate::error::{Error, Result};
use crate::regs::uart::{self as regs, Status};

/// Clock divisor producing 115200 baud against the SoC reference clock.
pub const BAUD_115200_DIVISOR: u16 = 0x0364;

/// Tunables for the UART transmit path.
#[derive(Debug, Clone, Copy)]
pub struct UartConfig {
    /// Retry budget for the TX-FIFO-full poll.
    pub poll_budget: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            poll_budget: 100_000,
        }
    }
}

/// Transmits bytes through the UART's FIFO with back-pressure handling.
pub struct UartTransmitter<B> {
    bus: B,
    config: UartConfig,
    overruns: u32,
    frame_errors: u32,
}

impl<B: RegisterBus> UartTransmitter<B> {
    /// Create a transmitter with default tunables.
    pub fn new(bus: B) -> Self {
        Self::with_config(bus, UartConfig::default())
    }

    /// Create a transmitter with explicit tunables.
    pub fn with_config(bus: B, config: UartConfig) -> Self {
        Self {
            bus,
            config,
            overruns: 0,
            frame_errors: 0,
        }
    }

    /// Program the 16-bit baud clock divisor, split across the two divider
    /// registers low byte first.
    pub fn configure_baud(&mut self, divisor: u16) {
        self.bus
            .write32(regs::CLOCK_DIV_LSB, u32::from(divisor) & 0xff);
        self.bus.write32(regs::CLOCK_DIV_MSB, u32::from(divisor) >> 8);
    }

    /// Flush both hardware FIFOs.
    pub fn reset_fifos(&mut self) {
        self.bus.write32(
            regs::CONTROL,
            regs::control_bits::TX_FIFO_RESET | regs::control_bits::RX_FIFO_RESET,
        );
        self.bus.write32(regs::CONTROL, 0);
    }

    /// Transmit one byte, waiting out TX FIFO back-pressure.
    ///
    /// Fails with [`Error::TransmitTimeout`] if the full flag never clears
    /// within the poll budget; the byte is not written in that case.
    pub fn put_byte(&mut self, byte: u8) -> Result<()> {
        self.note_line_errors();
        let ready = bus::wait_until(
            &mut self.bus,
            regs::STATUS,
            |raw| !Status::from_bits_truncate(raw).contains(Status::TX_FULL),
            self.config.poll_budget,
        );
        if !ready {
            return Err(Error::TransmitTimeout);
        }
        self.bus.write32(regs::TX_FIFO, u32::from(byte));
        Ok(())
    }

    /// Transmit every byte of `text` in order.
    pub fn put_str(&mut self, text: &str) -> Result<()> {
        for byte in text.bytes() {
            self.put_byte(byte)?;
        }
        Ok(())
    }

    /// Receiver overruns observed so far.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Receive framing errors observed so far.
    pub fn frame_errors(&self) -> u32 {
        self.frame_errors
    }

    /// Sample the status register and count receive-side error conditions.
    /// The hardware clears the sticky bits on read.
    fn note_line_errors(&mut self) {
        let status = Status::from_bits_truncate(self.bus.read32(regs::STATUS));
        if status.contains(Status::OVERRUN) {
            self.overruns += 1;
            log::warn!("UART receiver overrun ({} total)", self.overruns);
        }
        if status.contains(Status::FRAME_ERROR) {
            self.frame_errors += 1;
            log::warn!("UART framing error ({} total)", self.frame_errors);
        }
    }
}
