//! Physical memory mapping for MMIO access
//!
//! Maps a register window through `/dev/mem` with `O_SYNC` so every access
//! goes to the device uncached, and performs all reads and writes as
//! volatile 32-bit operations. Each call reaches the hardware exactly once,
//! in program order; the compiler cannot elide or coalesce them.

use crate::MmioError;

/// A mapped window of physical memory
#[cfg(target_os = "linux")]
pub struct PhysMap {
    /// Pointer to the start of the window (offset-adjusted)
    ptr: *mut u8,
    /// Size of the underlying mapping
    size: usize,
    /// Physical base address (for Drop's pointer arithmetic)
    phys_addr: u64,
}

#[cfg(target_os = "linux")]
impl PhysMap {
    /// Map `size` bytes of physical memory starting at `phys_addr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure the range is valid MMIO register space and
    /// that no other code is driving the same peripheral.
    pub fn new(phys_addr: u64, size: usize) -> Result<Self, MmioError> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        // O_SYNC gives an uncached mapping, required for MMIO.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open("/dev/mem")
            .map_err(|_| MmioError::Map {
                address: phys_addr,
                size,
            })?;

        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let page_mask = page_size - 1;
        let offset = (phys_addr as usize) & page_mask;
        let aligned_addr = phys_addr & !(page_mask as u64);
        let map_size = (size + offset + page_mask) & !page_mask;

        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_addr as libc::off_t,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(MmioError::Map {
                address: phys_addr,
                size,
            });
        }

        let adjusted_ptr = unsafe { (ptr as *mut u8).add(offset) };

        Ok(Self {
            ptr: adjusted_ptr,
            size: map_size,
            phys_addr,
        })
    }

    /// Volatile 32-bit read at `offset` into the window.
    #[inline]
    pub fn read32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.size);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit read");
        unsafe { core::ptr::read_volatile(self.ptr.add(offset) as *const u32) }
    }

    /// Volatile 32-bit write at `offset` into the window.
    #[inline]
    pub fn write32(&self, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= self.size);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit write");
        unsafe {
            core::ptr::write_volatile(self.ptr.add(offset) as *mut u32, value);
        }
    }
}

#[cfg(target_os = "linux")]
impl Drop for PhysMap {
    fn drop(&mut self) {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let page_mask = page_size - 1;
        let offset = (self.phys_addr as usize) & page_mask;
        let original_ptr = unsafe { self.ptr.sub(offset) };

        unsafe {
            libc::munmap(original_ptr as *mut libc::c_void, self.size);
        }
    }
}

/// Stub for platforms without /dev/mem.
#[cfg(not(target_os = "linux"))]
pub struct PhysMap;

#[cfg(not(target_os = "linux"))]
impl PhysMap {
    /// Physical mapping is unavailable off Linux.
    pub fn new(_phys_addr: u64, _size: usize) -> Result<Self, MmioError> {
        Err(MmioError::Unsupported)
    }

    /// Unreachable: construction always fails on this platform.
    pub fn read32(&self, _offset: usize) -> u32 {
        unreachable!("PhysMap cannot be constructed on this platform")
    }

    /// Unreachable: construction always fails on this platform.
    pub fn write32(&self, _offset: usize, _value: u32) {
        unreachable!("PhysMap cannot be constructed on this platform")
    }
}
