//! SPI flash read transactions
//!
//! The SPI master exposes a byte-wide TX/RX FIFO pair. A flash read is one
//! fixed 8-byte transaction: the JEDEC Read Data opcode, three address
//! bytes MSB first, then four dummy bytes whose only job is to keep the
//! clock running while the flash shifts the requested word back. The
//! command is loaded with shifting inhibited so the chip select does not
//! drop between bytes, then released in one burst.

use crate::bus::{self, RegisterBus};
use crate::error::{Error, Result};
use crate::regs::spi as regs;

/// JEDEC Read Data opcode (3-byte address, up to ~33 MHz)
pub const READ: u8 = 0x03;

/// Number of echo bytes clocked into the RX FIFO before the data word.
///
/// The flash shifts one byte in for every byte out, so the opcode and
/// address phase leaves 4 bytes of garbage ahead of the payload.
const ECHO_BYTES: usize = 4;

/// Phase of the current flash read transaction.
///
/// Transitions are strictly sequential; a timed-out transfer drops back to
/// `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No transaction in flight
    Idle,
    /// TX inhibit held while the command bytes are loaded
    Asserting,
    /// Inhibit released, bytes shifting out on the wire
    Shifting,
    /// Transfer done, draining the RX FIFO
    Draining,
    /// Data word captured
    Complete,
}

/// Tunables for the SPI read path.
#[derive(Debug, Clone, Copy)]
pub struct SpiConfig {
    /// Retry budget for the transfer-complete poll.
    pub poll_budget: u32,
    /// Post-transfer settle delay in spin ticks, covering the controller's
    /// pipeline latency between FIFO-empty and the last RX byte landing.
    pub settle_ticks: u32,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            poll_budget: 100_000,
            // Spin count used by the original firmware.
            settle_ticks: 233,
        }
    }
}

/// Sequences read-command transactions against the SPI master's registers.
pub struct SpiFlashReader<B> {
    bus: B,
    config: SpiConfig,
    phase: Phase,
}

impl<B: RegisterBus> SpiFlashReader<B> {
    /// Create a reader with default tunables.
    pub fn new(bus: B) -> Self {
        Self::with_config(bus, SpiConfig::default())
    }

    /// Create a reader with explicit tunables.
    pub fn with_config(bus: B, config: SpiConfig) -> Self {
        Self {
            bus,
            config,
            phase: Phase::Idle,
        }
    }

    /// Phase of the most recent transaction.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Read one 32-bit word from flash, most significant byte first.
    ///
    /// `address` must be word aligned; only its low 24 bits reach the chip
    /// (the Read Data command carries a 3-byte address). A transfer that
    /// times out is retried once before the error surfaces.
    pub fn read_word(&mut self, address: u32) -> Result<[u8; 4]> {
        if address % 4 != 0 {
            return Err(Error::UnalignedAddress { addr: address });
        }
        match self.transfer(address) {
            Err(Error::TransferTimeout) => {
                log::debug!("transfer at {:#010x} timed out, retrying once", address);
                self.transfer(address)
            }
            result => result,
        }
    }

    fn transfer(&mut self, address: u32) -> Result<[u8; 4]> {
        // Hold shifting while the command is loaded so it goes out as one
        // uninterrupted 8-byte frame.
        self.phase = Phase::Asserting;
        let inhibit = bus::set_field(
            0,
            regs::control_bits::TX_INHIBIT,
            regs::control_bits::TX_INHIBIT_SHIFT,
            1,
        );
        self.bus.write32(regs::CONTROL, inhibit);

        self.bus.write32(regs::TX_FIFO, u32::from(READ));
        self.bus.write32(regs::TX_FIFO, (address >> 16) & 0xff);
        self.bus.write32(regs::TX_FIFO, (address >> 8) & 0xff);
        self.bus.write32(regs::TX_FIFO, address & 0xff);
        // Dummy bytes clock the data word back in.
        for _ in 0..4 {
            self.bus.write32(regs::TX_FIFO, 0);
        }

        self.phase = Phase::Shifting;
        self.bus.write32(regs::CONTROL, 0);

        let drained = bus::wait_until(
            &mut self.bus,
            regs::STATUS,
            |status| {
                bus::get_field(
                    status,
                    regs::status_bits::TX_FIFO_EMPTY,
                    regs::status_bits::TX_FIFO_EMPTY_SHIFT,
                ) != 0
            },
            self.config.poll_budget,
        );
        if !drained {
            self.phase = Phase::Idle;
            return Err(Error::TransferTimeout);
        }

        // FIFO-empty fires when the last byte leaves the TX side; give the
        // shift pipeline time to land the last RX byte.
        for _ in 0..self.config.settle_ticks {
            core::hint::spin_loop();
        }

        self.phase = Phase::Draining;
        for _ in 0..ECHO_BYTES {
            let _ = self.bus.read32(regs::RX_FIFO);
        }

        let mut word = [0u8; 4];
        for byte in word.iter_mut() {
            *byte = self.bus.read32(regs::RX_FIFO) as u8;
        }
        self.phase = Phase::Complete;
        Ok(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeBus;
    use std::vec::Vec;

    fn spi_bus() -> FakeBus {
        let mut bus = FakeBus::new(regs::STATUS);
        bus.script_status(&[regs::status_bits::TX_FIFO_EMPTY]);
        bus
    }

    #[test]
    fn issues_exact_command_sequence() {
        let mut bus = spi_bus();
        bus.script_rx(regs::RX_FIFO, &[0, 0, 0, 0, 1, 2, 3, 4]);
        let mut reader = SpiFlashReader::new(&mut bus);

        let word = reader.read_word(0x0013_2a04).unwrap();
        assert_eq!(word, [1, 2, 3, 4]);

        assert_eq!(
            bus.writes_to(regs::TX_FIFO),
            Vec::from([0x03, 0x13, 0x2a, 0x04, 0, 0, 0, 0])
        );
        // Inhibit asserted before the bytes, cleared after.
        assert_eq!(
            bus.writes_to(regs::CONTROL),
            Vec::from([regs::control_bits::TX_INHIBIT, 0])
        );
        assert_eq!(bus.writes.first(), Some(&(regs::CONTROL, 1 << 2)));
        assert_eq!(bus.writes.last(), Some(&(regs::CONTROL, 0)));
    }

    #[test]
    fn only_low_24_address_bits_are_sent() {
        let mut bus = spi_bus();
        let mut reader = SpiFlashReader::new(&mut bus);
        reader.read_word(0xff00_0008).unwrap();
        assert_eq!(bus.writes_to(regs::TX_FIFO)[..4], [0x03, 0x00, 0x00, 0x08]);
    }

    #[test]
    fn rejects_unaligned_address() {
        let mut bus = spi_bus();
        let mut reader = SpiFlashReader::new(&mut bus);
        assert_eq!(
            reader.read_word(6),
            Err(Error::UnalignedAddress { addr: 6 })
        );
        // Rejected before any register traffic.
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn echo_bytes_are_discarded() {
        let mut bus = spi_bus();
        bus.script_rx(regs::RX_FIFO, &[0xee, 0xee, 0xee, 0xee, 0xde, 0xad, 0xbe, 0xef]);
        let mut reader = SpiFlashReader::new(&mut bus);
        assert_eq!(reader.read_word(0).unwrap(), [0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(reader.phase(), Phase::Complete);
    }

    #[test]
    fn stuck_fifo_times_out_after_one_retry() {
        let mut bus = FakeBus::new(regs::STATUS);
        bus.script_status(&[0]);
        let mut reader = SpiFlashReader::with_config(
            &mut bus,
            SpiConfig {
                poll_budget: 8,
                settle_ticks: 0,
            },
        );
        assert_eq!(reader.read_word(0), Err(Error::TransferTimeout));
        assert_eq!(reader.phase(), Phase::Idle);
        // Two full attempts worth of status polls.
        assert_eq!(bus.status_reads, 16);
    }
}
