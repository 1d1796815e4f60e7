//! Byte-order-correcting views over host-owned scratch memory and DRAM.
//!
//! Every byte access goes through an index transform `offset ^ swizzle` so
//! the host may store memory either as logical big-endian bytes or as
//! native 32-bit words. Multi-byte accesses are composed from single bytes,
//! each wrapping independently inside its window.

use super::map::{DATA_ADDRESS_MASK, FETCH_ADDRESS_MASK, IMEM_START, SCRATCH_BYTES};

/// Host storage layout of byte-addressed memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryLayout {
    /// Byte `n` of the address space lives at index `n`.
    #[default]
    Logical,
    /// Memory is held as native-endian 32-bit words.
    HostWords,
}

impl MemoryLayout {
    /// XOR applied to every byte index for this layout on the current host.
    #[must_use]
    pub const fn swizzle(self) -> usize {
        match self {
            Self::Logical => 0,
            Self::HostWords => {
                if cfg!(target_endian = "little") {
                    3
                } else {
                    0
                }
            }
        }
    }
}

/// Mutable view of the 8 KiB DMEM + IMEM window.
#[derive(Debug)]
pub struct ScratchView<'a> {
    bytes: &'a mut [u8],
    swizzle: usize,
}

impl<'a> ScratchView<'a> {
    /// Wraps a scratch slice. Offsets past the end of a short slice read as
    /// zero and drop writes; [`crate::MemoryMap::new`] rejects such slices.
    #[must_use]
    pub fn new(bytes: &'a mut [u8], layout: MemoryLayout) -> Self {
        Self {
            bytes,
            swizzle: layout.swizzle(),
        }
    }

    const fn index(&self, offset: u32) -> usize {
        (offset as usize % SCRATCH_BYTES) ^ self.swizzle
    }

    /// Reads one byte at a window offset (wraps modulo 8 KiB).
    #[must_use]
    pub fn read_u8(&self, offset: u32) -> u8 {
        self.bytes.get(self.index(offset)).copied().unwrap_or(0)
    }

    /// Writes one byte at a window offset (wraps modulo 8 KiB).
    pub fn write_u8(&mut self, offset: u32, value: u8) {
        let index = self.index(offset);
        if let Some(byte) = self.bytes.get_mut(index) {
            *byte = value;
        }
    }

    /// Reads a DMEM byte; the address wraps at 4 KiB.
    #[must_use]
    pub fn dmem_u8(&self, addr: u32) -> u8 {
        self.read_u8(addr & DATA_ADDRESS_MASK)
    }

    /// Writes a DMEM byte; the address wraps at 4 KiB.
    pub fn set_dmem_u8(&mut self, addr: u32, value: u8) {
        self.write_u8(addr & DATA_ADDRESS_MASK, value);
    }

    /// Reads a big-endian halfword from DMEM, bytes wrapping independently.
    #[must_use]
    pub fn dmem_u16(&self, addr: u32) -> u16 {
        u16::from_be_bytes([self.dmem_u8(addr), self.dmem_u8(addr.wrapping_add(1))])
    }

    /// Reads a big-endian word from DMEM, bytes wrapping independently.
    #[must_use]
    pub fn dmem_u32(&self, addr: u32) -> u32 {
        u32::from_be_bytes([
            self.dmem_u8(addr),
            self.dmem_u8(addr.wrapping_add(1)),
            self.dmem_u8(addr.wrapping_add(2)),
            self.dmem_u8(addr.wrapping_add(3)),
        ])
    }

    /// Writes a big-endian halfword to DMEM.
    pub fn set_dmem_u16(&mut self, addr: u32, value: u16) {
        for (i, byte) in value.to_be_bytes().into_iter().enumerate() {
            self.set_dmem_u8(addr.wrapping_add(i as u32), byte);
        }
    }

    /// Writes a big-endian word to DMEM.
    pub fn set_dmem_u32(&mut self, addr: u32, value: u32) {
        for (i, byte) in value.to_be_bytes().into_iter().enumerate() {
            self.set_dmem_u8(addr.wrapping_add(i as u32), byte);
        }
    }

    /// Fetches the instruction word at `pc & 0xFFC` in IMEM.
    #[must_use]
    pub fn fetch(&self, pc: u32) -> u32 {
        let base = u32::from(IMEM_START) + (pc & FETCH_ADDRESS_MASK);
        u32::from_be_bytes([
            self.read_u8(base),
            self.read_u8(base + 1),
            self.read_u8(base + 2),
            self.read_u8(base + 3),
        ])
    }
}

/// Mutable view of host DRAM for DMA.
#[derive(Debug)]
pub struct DramView<'a> {
    bytes: &'a mut [u8],
    swizzle: usize,
}

impl<'a> DramView<'a> {
    /// Wraps a DRAM slice of any length.
    #[must_use]
    pub fn new(bytes: &'a mut [u8], layout: MemoryLayout) -> Self {
        Self {
            bytes,
            swizzle: layout.swizzle(),
        }
    }

    /// Number of addressable bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when the DRAM slice is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reads one byte, or `None` past the end of the slice.
    #[must_use]
    pub fn read_u8(&self, addr: u32) -> Option<u8> {
        self.bytes.get(addr as usize ^ self.swizzle).copied()
    }

    /// Writes one byte; returns `false` when the address is past the slice.
    pub fn write_u8(&mut self, addr: u32, value: u8) -> bool {
        match self.bytes.get_mut(addr as usize ^ self.swizzle) {
            Some(byte) => {
                *byte = value;
                true
            }
            None => false,
        }
    }
}
