//! Register layout of the two peripherals
//!
//! Byte offsets from each peripheral's base address, matching the SoC's
//! AXI-lite register maps. The default base addresses are where the chip's
//! interconnect places the peripherals; the mmio backend accepts overrides.

/// Default physical base address of the UART controller.
pub const UART_BASE_ADDR: u64 = 0x0001_0100;

/// Default physical base address of the SPI master.
pub const SPI_MASTER_BASE_ADDR: u64 = 0x0001_0200;

/// Size of each peripheral's register window in bytes.
pub const REG_WINDOW_SIZE: usize = 0x100;

/// UART controller registers
pub mod uart {
    use bitflags::bitflags;

    /// RX FIFO data (read received byte)
    pub const RX_FIFO: usize = 0x00;

    /// TX FIFO data (write byte to transmit)
    pub const TX_FIFO: usize = 0x04;

    /// Status register, see [`Status`]
    pub const STATUS: usize = 0x08;

    /// Control register, see [`control_bits`]
    pub const CONTROL: usize = 0x0c;

    /// Low byte of the 16-bit baud clock divisor
    pub const CLOCK_DIV_LSB: usize = 0x10;

    /// High byte of the 16-bit baud clock divisor
    pub const CLOCK_DIV_MSB: usize = 0x14;

    bitflags! {
        /// UART status register fields
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct Status: u32 {
            /// RX FIFO holds at least one byte
            const RX_NOT_EMPTY = 1 << 0;
            /// RX FIFO is full
            const RX_FULL = 1 << 1;
            /// TX FIFO is empty
            const TX_EMPTY = 1 << 2;
            /// TX FIFO is full; writes to TX_FIFO would be lost
            const TX_FULL = 1 << 3;
            /// A received byte was lost because the RX FIFO was full
            const OVERRUN = 1 << 5;
            /// Stop bit sampling failed on a received frame
            const FRAME_ERROR = 1 << 6;
        }
    }

    /// Control register fields
    pub mod control_bits {
        /// Flush the TX FIFO (bit 0)
        pub const TX_FIFO_RESET: u32 = 1 << 0;
        /// Flush the RX FIFO (bit 1)
        pub const RX_FIFO_RESET: u32 = 1 << 1;
    }
}

/// SPI master registers
pub mod spi {
    /// Control register, see [`control_bits`]
    pub const CONTROL: usize = 0x00;

    /// Status register, see [`status_bits`]
    pub const STATUS: usize = 0x04;

    /// TX FIFO data (write byte to shift out)
    pub const TX_FIFO: usize = 0x08;

    /// RX FIFO data (read byte shifted in)
    pub const RX_FIFO: usize = 0x0c;

    /// Control register fields
    pub mod control_bits {
        /// Suspend shifting while the TX FIFO is loaded (bit 2)
        pub const TX_INHIBIT: u32 = 1 << 2;
        /// Shift of [`TX_INHIBIT`]
        pub const TX_INHIBIT_SHIFT: u32 = 2;
    }

    /// Status register fields
    pub mod status_bits {
        /// TX FIFO has fully drained; the transfer is complete (bit 2)
        pub const TX_FIFO_EMPTY: u32 = 1 << 2;
        /// Shift of [`TX_FIFO_EMPTY`]
        pub const TX_FIFO_EMPTY_SHIFT: u32 = 2;
    }
}
