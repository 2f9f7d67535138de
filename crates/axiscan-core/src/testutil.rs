//! Scripted register bus for unit tests
//!
//! Replays a fixed sequence of status values and RX bytes while recording
//! every write, so tests can assert on the exact register traffic a
//! component generates.

use std::vec::Vec;

use crate::bus::RegisterBus;

/// A scripted [`RegisterBus`] for one peripheral.
pub struct FakeBus {
    status_offset: usize,
    status_script: Vec<u32>,
    rx_offset: Option<usize>,
    rx_script: Vec<u32>,
    rx_cursor: usize,
    /// Number of reads issued against the status register.
    pub status_reads: u32,
    /// Every write, in order, as `(offset, value)`.
    pub writes: Vec<(usize, u32)>,
}

impl FakeBus {
    pub fn new(status_offset: usize) -> Self {
        Self {
            status_offset,
            status_script: Vec::new(),
            rx_offset: None,
            rx_script: Vec::new(),
            rx_cursor: 0,
            status_reads: 0,
            writes: Vec::new(),
        }
    }

    /// Values returned by successive status reads; the last one repeats.
    pub fn script_status(&mut self, values: &[u32]) {
        self.status_script = values.to_vec();
    }

    /// Values returned by successive reads of the RX data register.
    pub fn script_rx(&mut self, offset: usize, values: &[u32]) {
        self.rx_offset = Some(offset);
        self.rx_script = values.to_vec();
        self.rx_cursor = 0;
    }

    /// Writes issued against one register, in order.
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.writes
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl RegisterBus for FakeBus {
    fn read32(&mut self, offset: usize) -> u32 {
        if offset == self.status_offset {
            let idx = (self.status_reads as usize).min(self.status_script.len().saturating_sub(1));
            self.status_reads += 1;
            return self.status_script.get(idx).copied().unwrap_or(0);
        }
        if Some(offset) == self.rx_offset {
            let value = self.rx_script.get(self.rx_cursor).copied().unwrap_or(0);
            self.rx_cursor += 1;
            return value;
        }
        0
    }

    fn write32(&mut self, offset: usize, value: u32) {
        self.writes.push((offset, value));
    }
}
