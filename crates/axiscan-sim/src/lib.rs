//! axiscan-sim - In-memory peripheral models for testing
//!
//! This crate provides register-level simulations of the two peripherals
//! the scanner drives: the SPI master (backed by a flash image in memory)
//! and the UART (backed by a transcript buffer). Both implement
//! [`RegisterBus`], so the protocol code in axiscan-core runs against them
//! unchanged. Useful for tests and for running the scanner without
//! hardware.

use std::collections::VecDeque;
use std::io::Write;

use axiscan_core::bus::RegisterBus;
use axiscan_core::regs::{spi, uart};

/// Simulated SPI master with an attached flash image.
///
/// Bytes written to the TX FIFO are queued; clearing the TX-inhibit bit in
/// the control register shifts the whole frame at once. A frame starting
/// with the Read Data opcode is answered from the flash image, with one RX
/// byte produced per TX byte exactly as the wire would: 4 bytes of echo
/// for the command phase, then data. Reads past the end of the image
/// return 0xFF, like erased flash.
pub struct SimSpiMaster {
    flash: Vec<u8>,
    tx: VecDeque<u8>,
    rx: VecDeque<u8>,
    inhibited: bool,
    stuck: bool,
}

impl SimSpiMaster {
    /// Create a master over an erased (all-0xFF) flash image of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self::with_data(vec![0xff; size])
    }

    /// Create a master over the given flash image.
    pub fn with_data(flash: Vec<u8>) -> Self {
        Self {
            flash,
            tx: VecDeque::new(),
            rx: VecDeque::new(),
            inhibited: false,
            stuck: false,
        }
    }

    /// When stuck, the TX FIFO never drains and the status register never
    /// reports empty. For exercising timeout paths.
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    /// The flash image.
    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    /// Mutable access to the flash image.
    pub fn flash_mut(&mut self) -> &mut [u8] {
        &mut self.flash
    }

    fn shift(&mut self) {
        if self.stuck {
            return;
        }
        let frame: Vec<u8> = self.tx.drain(..).collect();
        if frame.len() >= 4 && frame[0] == axiscan_core::spi::READ {
            let addr = (u32::from(frame[1]) << 16)
                | (u32::from(frame[2]) << 8)
                | u32::from(frame[3]);
            log::trace!("sim spi: read command at {:#08x}, {} dummies", addr, frame.len() - 4);
            // Command and address phase echoes garbage.
            for _ in 0..4 {
                self.rx.push_back(0);
            }
            for i in 0..frame.len() - 4 {
                let offset = addr as usize + i;
                self.rx
                    .push_back(self.flash.get(offset).copied().unwrap_or(0xff));
            }
        } else {
            log::trace!("sim spi: unrecognized {}-byte frame", frame.len());
            for _ in 0..frame.len() {
                self.rx.push_back(0xff);
            }
        }
    }
}

impl RegisterBus for SimSpiMaster {
    fn read32(&mut self, offset: usize) -> u32 {
        match offset {
            spi::STATUS => {
                if self.tx.is_empty() && !self.stuck {
                    spi::status_bits::TX_FIFO_EMPTY
                } else {
                    0
                }
            }
            spi::RX_FIFO => u32::from(self.rx.pop_front().unwrap_or(0xff)),
            spi::CONTROL => {
                if self.inhibited {
                    spi::control_bits::TX_INHIBIT
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        match offset {
            spi::CONTROL => {
                let inhibit = value & spi::control_bits::TX_INHIBIT != 0;
                let released = self.inhibited && !inhibit;
                self.inhibited = inhibit;
                if released {
                    self.shift();
                }
            }
            spi::TX_FIFO => {
                self.tx.push_back(value as u8);
                if !self.inhibited {
                    // No inhibit held: the byte shifts out immediately.
                    self.shift();
                }
            }
            _ => {}
        }
    }
}

/// Simulated UART capturing everything transmitted.
///
/// The TX FIFO drains instantly unless a test arms back-pressure with
/// [`SimUart::set_tx_full_for`]. Sticky error bits injected with
/// [`SimUart::inject_overrun`] / [`SimUart::inject_frame_error`] clear on
/// the next status read, like the hardware's read-to-clear behavior.
pub struct SimUart {
    transcript: Vec<u8>,
    full_reads_left: u32,
    overrun_pending: bool,
    frame_error_pending: bool,
    divisor_lsb: u32,
    divisor_msb: u32,
    echo: bool,
}

impl SimUart {
    /// Create a UART with an empty transcript.
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            full_reads_left: 0,
            overrun_pending: false,
            frame_error_pending: false,
            divisor_lsb: 0,
            divisor_msb: 0,
            echo: false,
        }
    }

    /// Mirror transmitted bytes to stdout, for hardware-free interactive runs.
    pub fn echo_to_stdout(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// Report TX-FIFO-full for the next `reads` status reads.
    pub fn set_tx_full_for(&mut self, reads: u32) {
        self.full_reads_left = reads;
    }

    /// Latch the overrun error bit until the next status read.
    pub fn inject_overrun(&mut self) {
        self.overrun_pending = true;
    }

    /// Latch the framing error bit until the next status read.
    pub fn inject_frame_error(&mut self) {
        self.frame_error_pending = true;
    }

    /// Everything transmitted so far.
    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    /// Drain and return the transcript.
    pub fn take_transcript(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.transcript)
    }

    /// The programmed 16-bit baud divisor.
    pub fn divisor(&self) -> u16 {
        ((self.divisor_msb as u16) << 8) | (self.divisor_lsb as u16 & 0xff)
    }
}

impl Default for SimUart {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for SimUart {
    fn read32(&mut self, offset: usize) -> u32 {
        match offset {
            uart::STATUS => {
                let mut status = uart::Status::empty();
                if self.full_reads_left > 0 {
                    self.full_reads_left -= 1;
                    status |= uart::Status::TX_FULL;
                } else {
                    status |= uart::Status::TX_EMPTY;
                }
                if self.overrun_pending {
                    self.overrun_pending = false;
                    status |= uart::Status::OVERRUN;
                }
                if self.frame_error_pending {
                    self.frame_error_pending = false;
                    status |= uart::Status::FRAME_ERROR;
                }
                status.bits()
            }
            uart::CLOCK_DIV_LSB => self.divisor_lsb,
            uart::CLOCK_DIV_MSB => self.divisor_msb,
            _ => 0,
        }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        match offset {
            uart::TX_FIFO => {
                assert!(
                    self.full_reads_left == 0,
                    "byte {:#04x} written while TX FIFO reports full",
                    value
                );
                let byte = value as u8;
                self.transcript.push(byte);
                if self.echo {
                    let _ = std::io::stdout().write_all(&[byte]);
                    if byte == b'\n' {
                        let _ = std::io::stdout().flush();
                    }
                }
            }
            uart::CLOCK_DIV_LSB => self.divisor_lsb = value & 0xff,
            uart::CLOCK_DIV_MSB => self.divisor_msb = value & 0xff,
            uart::CONTROL => {
                // FIFO resets are a no-op here: the model's FIFO drains
                // instantly and the transcript is a test observable.
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiscan_core::scan::ScanDriver;
    use axiscan_core::spi::{SpiConfig, SpiFlashReader};
    use axiscan_core::uart::{UartTransmitter, BAUD_115200_DIVISOR};
    use axiscan_core::Error;
    use std::sync::atomic::AtomicBool;

    fn fast_spi() -> SpiConfig {
        SpiConfig {
            poll_budget: 64,
            settle_ticks: 0,
        }
    }

    #[test]
    fn scan_line_matches_firmware_format() {
        let mut flash = SimSpiMaster::with_data(vec![0xde, 0xad, 0xbe, 0xef]);
        let mut uart = SimUart::new();
        let mut driver = ScanDriver::new(
            SpiFlashReader::new(&mut flash),
            UartTransmitter::new(&mut uart),
        );
        driver.step().unwrap();
        assert_eq!(driver.cursor(), 4);
        drop(driver);
        assert_eq!(uart.transcript(), b"0x00000000: 0xdeadbeef\r\n");
    }

    #[test]
    fn erased_flash_reads_all_ff() {
        let mut flash = SimSpiMaster::new(16);
        let mut uart = SimUart::new();
        let mut driver = ScanDriver::with_start(
            SpiFlashReader::new(&mut flash),
            UartTransmitter::new(&mut uart),
            0x8,
        )
        .unwrap();
        driver.step().unwrap();
        drop(driver);
        assert_eq!(uart.transcript(), b"0x00000008: 0xffffffff\r\n");
    }

    #[test]
    fn read_word_is_idempotent() {
        let mut image = vec![0u8; 64];
        image[32..36].copy_from_slice(&[0x11, 0x22, 0x33, 0x44]);
        let mut flash = SimSpiMaster::with_data(image);
        let mut reader = SpiFlashReader::new(&mut flash);
        let first = reader.read_word(32).unwrap();
        let second = reader.read_word(32).unwrap();
        assert_eq!(first, [0x11, 0x22, 0x33, 0x44]);
        assert_eq!(first, second);
    }

    #[test]
    fn stuck_spi_reports_timeout_and_scan_advances() {
        let mut flash = SimSpiMaster::new(16);
        flash.set_stuck(true);
        let mut uart = SimUart::new();
        let mut driver = ScanDriver::new(
            SpiFlashReader::with_config(&mut flash, fast_spi()),
            UartTransmitter::new(&mut uart),
        );
        driver.step().unwrap();
        assert_eq!(driver.cursor(), 4);
        drop(driver);
        assert_eq!(uart.transcript(), b"0x00000000: read error\r\n");
    }

    #[test]
    fn stuck_spi_read_word_error() {
        let mut flash = SimSpiMaster::new(16);
        flash.set_stuck(true);
        let mut reader = SpiFlashReader::with_config(&mut flash, fast_spi());
        assert_eq!(reader.read_word(0), Err(Error::TransferTimeout));
    }

    #[test]
    fn back_pressure_delays_but_never_drops() {
        let mut uart = SimUart::new();
        uart.set_tx_full_for(5);
        let mut tx = UartTransmitter::new(&mut uart);
        tx.put_byte(b'!').unwrap();
        drop(tx);
        assert_eq!(uart.transcript(), b"!");
    }

    #[test]
    fn divisor_lands_in_both_halves() {
        let mut uart = SimUart::new();
        let mut tx = UartTransmitter::new(&mut uart);
        tx.configure_baud(BAUD_115200_DIVISOR);
        drop(tx);
        assert_eq!(uart.divisor(), 0x0364);
    }

    #[test]
    fn injected_line_errors_surface_as_counters() {
        let mut uart = SimUart::new();
        uart.inject_overrun();
        uart.inject_frame_error();
        let mut tx = UartTransmitter::new(&mut uart);
        tx.put_byte(b'a').unwrap();
        tx.put_byte(b'b').unwrap();
        assert_eq!(tx.overruns(), 1);
        assert_eq!(tx.frame_errors(), 1);
    }

    #[test]
    fn cancellation_stops_the_loop() {
        let mut flash = SimSpiMaster::new(16);
        let mut uart = SimUart::new();
        let mut driver = ScanDriver::new(
            SpiFlashReader::new(&mut flash),
            UartTransmitter::new(&mut uart),
        );
        let cancel = AtomicBool::new(true);
        driver.run(&cancel);
        // Flag checked before the first step: nothing scanned.
        assert_eq!(driver.cursor(), 0);
        drop(driver);
        assert!(uart.transcript().is_empty());
    }

    #[test]
    fn cursor_wraps_to_zero() {
        let mut flash = SimSpiMaster::new(16);
        let mut uart = SimUart::new();
        let mut driver = ScanDriver::with_start(
            SpiFlashReader::new(&mut flash),
            UartTransmitter::new(&mut uart),
            0xffff_fffc,
        )
        .unwrap();
        driver.step().unwrap();
        assert_eq!(driver.cursor(), 0);
    }

    #[test]
    fn multiple_lines_walk_the_image() {
        let image = vec![0x01, 0x02, 0x03, 0x04, 0xaa, 0xbb, 0xcc, 0xdd];
        let mut flash = SimSpiMaster::with_data(image);
        let mut uart = SimUart::new();
        let mut driver = ScanDriver::new(
            SpiFlashReader::new(&mut flash),
            UartTransmitter::new(&mut uart),
        );
        driver.announce().unwrap();
        driver.step().unwrap();
        driver.step().unwrap();
        drop(driver);
        assert_eq!(
            uart.transcript(),
            b"\r\n\r\n0x00000000: 0x01020304\r\n0x00000004: 0xaabbccdd\r\n".as_slice()
        );
    }
}
