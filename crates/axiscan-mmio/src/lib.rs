//! axiscan-mmio - Physical register access over /dev/mem
//!
//! The production [`RegisterBus`] backend: maps one peripheral's register
//! window out of physical address space and performs volatile 32-bit
//! accesses against it. Linux only, and requires root (or equivalent
//! capability) to open `/dev/mem`.
//!
//! # Safety
//!
//! Mapping physical memory is inherently unsafe. The caller must point the
//! mapping at MMIO registers that nothing else in the system is driving;
//! the wrapper only enforces alignment and window bounds.

mod physmap;

pub use physmap::PhysMap;

use axiscan_core::bus::RegisterBus;
use axiscan_core::regs::REG_WINDOW_SIZE;

/// Error type for physical register access
#[derive(Debug, thiserror::Error)]
pub enum MmioError {
    /// Mapping the register window out of /dev/mem failed
    #[error("failed to map {size} bytes of physical memory at {address:#x}")]
    Map {
        /// Physical base address of the attempted mapping
        address: u64,
        /// Requested window size in bytes
        size: usize,
    },
    /// The platform has no /dev/mem style physical access
    #[error("physical register access is not supported on this platform")]
    Unsupported,
}

/// One peripheral's register window, mapped from physical memory.
pub struct MmioBus {
    map: PhysMap,
}

impl MmioBus {
    /// Map the register window of the peripheral based at `base`.
    pub fn map(base: u64) -> Result<Self, MmioError> {
        let map = PhysMap::new(base, REG_WINDOW_SIZE)?;
        log::debug!("mapped register window at {:#x}", base);
        Ok(Self { map })
    }
}

impl RegisterBus for MmioBus {
    fn read32(&mut self, offset: usize) -> u32 {
        self.map.read32(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        self.map.write32(offset, value);
    }
}
