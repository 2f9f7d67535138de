//! axiscan-core - Protocol logic for the axiscan flash scanner
//!
//! This crate implements the register-level protocol for reading 32-bit
//! words out of an SPI-attached flash chip and streaming them as hex text
//! through a FIFO-flow-controlled UART. It talks to hardware exclusively
//! through the [`bus::RegisterBus`] trait, so the same code runs against a
//! physical memory mapping or an in-memory simulation.
//!
//! The crate is `no_std` compatible: it performs no allocation and only
//! needs `core`. Enable the `std` feature to get `std::error::Error` on the
//! error type.
//!
//! # Example
//!
//! ```ignore
//! use axiscan_core::scan::ScanDriver;
//! use axiscan_core::spi::SpiFlashReader;
//! use axiscan_core::uart::UartTransmitter;
//!
//! fn scan<S, U>(spi_bus: S, uart_bus: U)
//! where
//!     S: axiscan_core::bus::RegisterBus,
//!     U: axiscan_core::bus::RegisterBus,
//! {
//!     let mut uart = UartTransmitter::new(uart_bus);
//!     uart.configure_baud(axiscan_core::uart::BAUD_115200_DIVISOR);
//!     let mut driver = ScanDriver::new(SpiFlashReader::new(spi_bus), uart);
//!     loop {
//!         if let Err(e) = driver.step() {
//!             log::error!("scan step failed: {}", e);
//!         }
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod bus;
pub mod error;
pub mod regs;
pub mod scan;
pub mod spi;
pub mod uart;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) mod testutil;
