//! Error types for axiscan-core
//!
//! The original firmware assumed infallible hardware and would spin forever
//! on a stuck peripheral. Every polling site here is bounded instead, and
//! the conditions that can arise are captured in a small `Copy` error type
//! that works without an allocator.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Flash read address is not 32-bit word aligned
    UnalignedAddress {
        /// The rejected address
        addr: u32,
    },
    /// SPI transfer-complete poll exhausted its retry budget
    TransferTimeout,
    /// UART TX-FIFO-full poll exhausted its retry budget
    TransmitTimeout,
    /// UART receiver overrun (diagnostic, non-fatal to the scan)
    Overrun,
    /// UART receive framing error (diagnostic, non-fatal to the scan)
    FrameError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnalignedAddress { addr } => {
                write!(f, "address {:#010x} is not word aligned", addr)
            }
            Self::TransferTimeout => write!(f, "SPI transfer did not complete in time"),
            Self::TransmitTimeout => write!(f, "UART TX FIFO stayed full past the poll budget"),
            Self::Overrun => write!(f, "UART receiver overrun"),
            Self::FrameError => write!(f, "UART receive framing error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core error
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn display_includes_rejected_address() {
        let msg = Error::UnalignedAddress { addr: 0x13 }.to_string();
        assert!(msg.contains("0x00000013"), "{}", msg);
    }
}
