//! Register bus abstraction
//!
//! The firmware this crate reimplements reached its peripherals through
//! volatile pointer dereferences at fixed physical addresses. Here that
//! becomes a trait: one implementation maps the real registers
//! (axiscan-mmio), another backs them with an in-memory model
//! (axiscan-sim), and the protocol code above is identical against both.
//!
//! # Access discipline
//!
//! Implementations must perform exactly one backing access per call, in
//! program order. The methods take `&mut self` so the borrow checker
//! serializes callers; interleaving two half-finished FIFO transactions on
//! one peripheral would corrupt the protocol phase ordering.

/// Word-granular access to one peripheral's register window.
///
/// Offsets are byte offsets from the peripheral's base address, as in the
/// hardware register map.
pub trait RegisterBus {
    /// Read the 32-bit register at `offset`.
    fn read32(&mut self, offset: usize) -> u32;

    /// Write the 32-bit register at `offset`.
    fn write32(&mut self, offset: usize, value: u32);
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read32(&mut self, offset: usize) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) {
        (**self).write32(offset, value);
    }
}

/// Extract a bit field from a register value.
#[inline]
pub fn get_field(value: u32, mask: u32, shift: u32) -> u32 {
    (value & mask) >> shift
}

/// Return `value` with the bit field replaced by `field`.
#[inline]
pub fn set_field(value: u32, mask: u32, shift: u32, field: u32) -> u32 {
    (value & !mask) | ((field << shift) & mask)
}

/// Poll a status register until `ready` accepts its value.
///
/// Reads the register at most `budget` times. Returns `false` when the
/// budget runs out without the predicate passing; the caller maps that to
/// its own timeout error. Both the SPI and the UART polling sites go
/// through here so neither can spin forever on stuck hardware.
pub fn wait_until<B, P>(bus: &mut B, offset: usize, mut ready: P, budget: u32) -> bool
where
    B: RegisterBus + ?Sized,
    P: FnMut(u32) -> bool,
{
    for _ in 0..budget {
        if ready(bus.read32(offset)) {
            return true;
        }
        core::hint::spin_loop();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeBus;

    #[test]
    fn field_roundtrip() {
        // UART status bit3 (TX full)
        let v = set_field(0, 0x08, 3, 1);
        assert_eq!(v, 0x08);
        assert_eq!(get_field(v, 0x08, 3), 1);
        assert_eq!(get_field(v, 0x04, 2), 0);
    }

    #[test]
    fn set_field_preserves_other_bits() {
        let v = set_field(0xa1, 0x0c, 2, 0b10);
        assert_eq!(v, 0xa1 & !0x0c | 0x08);
    }

    #[test]
    fn set_field_truncates_oversized_value() {
        // Writing 0xff into a 2-bit field must not spill outside the mask.
        let v = set_field(0, 0x0c, 2, 0xff);
        assert_eq!(v, 0x0c);
    }

    #[test]
    fn wait_until_stops_at_budget() {
        let mut bus = FakeBus::new(0x04);
        bus.script_status(&[0, 0, 0, 0]);
        assert!(!wait_until(&mut bus, 0x04, |v| v != 0, 3));
        assert_eq!(bus.status_reads, 3);
    }

    #[test]
    fn wait_until_returns_on_first_ready_value() {
        let mut bus = FakeBus::new(0x04);
        bus.script_status(&[0, 0, 1]);
        assert!(wait_until(&mut bus, 0x04, |v| v != 0, 100));
        assert_eq!(bus.status_reads, 3);
    }
}
