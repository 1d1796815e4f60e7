//! Block transfers between DRAM and the scratch window.
//!
//! A transfer moves `count` rows of `length` bytes in 8-byte chunks. Rows
//! are packed in scratch and `skip` bytes apart in DRAM. Rows run from the
//! last to the first, so overlapping rows resolve like the hardware.

use crate::diag::Diagnostic;
use crate::memory::{
    DramView, ScratchView, DMA_DRAM_LIMIT_MASK, DMA_DRAM_MASK, DMA_SCRATCH_MASK,
    SCRATCH_BANK_BYTES,
};

/// Bytes moved per chunk.
pub const DMA_CHUNK_BYTES: u32 = 8;

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DmaDirection {
    /// `SP_RD_LEN`: DRAM to scratch.
    DramToScratch,
    /// `SP_WR_LEN`: scratch to DRAM.
    ScratchToDram,
}

/// Decoded length register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DmaShape {
    /// Bytes per row.
    pub length: u32,
    /// Number of rows.
    pub count: u32,
    /// DRAM distance between row starts.
    pub stride: u32,
}

impl DmaShape {
    /// Decodes `length | count << 12 | skip << 20`. The length field is
    /// rounded up to whole chunks.
    #[must_use]
    pub const fn decode(register: u32) -> Self {
        let length = ((register | (DMA_CHUNK_BYTES - 1)) & 0xFFF) + 1;
        let count = ((register >> 12) & 0xFF) + 1;
        Self {
            length,
            count,
            stride: (register >> 20) + length,
        }
    }

    /// Total bytes the transfer moves.
    #[must_use]
    pub const fn total_bytes(self) -> u32 {
        self.length * self.count
    }
}

/// Runs one transfer. Anomalies are passed to `report`; the transfer
/// always completes.
#[allow(clippy::cast_possible_truncation)]
pub fn transfer(
    scratch: &mut ScratchView<'_>,
    dram: &mut DramView<'_>,
    scratch_addr: u32,
    dram_addr: u32,
    length_register: u32,
    direction: DmaDirection,
    mut report: impl FnMut(Diagnostic),
) {
    let shape = DmaShape::decode(length_register);
    let mut out_of_range = false;
    log::trace!(
        "dma {direction:?} scratch={scratch_addr:#06x} dram={dram_addr:#08x} {} x {}",
        shape.count,
        shape.length
    );

    for row in (0..shape.count).rev() {
        let row_start = (row * shape.length + scratch_addr) & DMA_SCRATCH_MASK;
        let row_end = row_start + shape.length - 1;
        if (row_start ^ row_end) & SCRATCH_BANK_BYTES as u32 != 0 {
            report(Diagnostic::DmaCrossesBoundary { scratch: row_start });
        }

        let mut offset = 0;
        while offset < shape.length {
            let scratch_chunk = (row * shape.length + scratch_addr + offset) & DMA_SCRATCH_MASK;
            let dram_chunk = (row * shape.stride + dram_addr + offset) & DMA_DRAM_MASK;
            let in_range = dram_chunk & !DMA_DRAM_LIMIT_MASK == 0
                && (dram_chunk + DMA_CHUNK_BYTES) as usize <= dram.len();
            if !in_range && !out_of_range {
                out_of_range = true;
                report(Diagnostic::DmaOutOfRange { dram: dram_chunk });
            }
            for byte in 0..DMA_CHUNK_BYTES {
                let c = scratch_chunk + byte;
                let d = dram_chunk + byte;
                match direction {
                    DmaDirection::DramToScratch => {
                        let value = if in_range { dram.read_u8(d).unwrap_or(0) } else { 0 };
                        scratch.write_u8(c, value);
                    }
                    DmaDirection::ScratchToDram => {
                        if in_range {
                            dram.write_u8(d, scratch.read_u8(c));
                        }
                    }
                }
            }
            offset += DMA_CHUNK_BYTES;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{new_scratch_memory, MemoryLayout};

    #[test]
    fn shape_rounds_length_to_chunks() {
        let shape = DmaShape::decode(7);
        assert_eq!((shape.length, shape.count, shape.stride), (8, 1, 8));
        let shape = DmaShape::decode(0x0100_1000 | 0x0F);
        assert_eq!((shape.length, shape.count, shape.stride), (16, 2, 32));
        assert_eq!(shape.total_bytes(), 32);
    }

    #[test]
    fn read_copies_exactly_one_chunk() {
        let mut dram_bytes: Vec<u8> = (0..64).collect();
        let mut scratch_bytes = new_scratch_memory();
        let mut dram = DramView::new(&mut dram_bytes, MemoryLayout::Logical);
        let mut scratch = ScratchView::new(&mut scratch_bytes, MemoryLayout::Logical);
        let mut reports = Vec::new();
        transfer(&mut scratch, &mut dram, 0x100, 0x10, 7, DmaDirection::DramToScratch, |d| {
            reports.push(d);
        });
        assert!(reports.is_empty());
        for i in 0..8 {
            assert_eq!(scratch.read_u8(0x100 + i), 0x10 + i as u8);
        }
        assert_eq!(scratch.read_u8(0x108), 0);
    }

    #[test]
    fn strided_write_to_dram() {
        let mut dram_bytes = vec![0u8; 64];
        let mut scratch_bytes = new_scratch_memory();
        for i in 0..16 {
            scratch_bytes[0x200 + i] = i as u8 + 1;
        }
        let mut dram = DramView::new(&mut dram_bytes, MemoryLayout::Logical);
        let mut scratch = ScratchView::new(&mut scratch_bytes, MemoryLayout::Logical);
        // Two rows of 8 bytes, 8 bytes of gap between them in DRAM.
        let register = (8 << 20) | (1 << 12) | 7;
        transfer(&mut scratch, &mut dram, 0x200, 0, register, DmaDirection::ScratchToDram, |_| {});
        assert_eq!(&dram_bytes[0..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&dram_bytes[8..16], &[0; 8]);
        assert_eq!(&dram_bytes[16..24], &[9, 10, 11, 12, 13, 14, 15, 16]);
    }

    #[test]
    fn out_of_range_reads_zero_and_reports_once() {
        let mut dram_bytes = vec![0xFFu8; 16];
        let mut scratch_bytes = new_scratch_memory();
        scratch_bytes[..32].fill(0xEE);
        let mut dram = DramView::new(&mut dram_bytes, MemoryLayout::Logical);
        let mut scratch = ScratchView::new(&mut scratch_bytes, MemoryLayout::Logical);
        let mut reports = Vec::new();
        transfer(&mut scratch, &mut dram, 0, 8, 0x1F, DmaDirection::DramToScratch, |d| {
            reports.push(d);
        });
        assert_eq!(reports, vec![Diagnostic::DmaOutOfRange { dram: 16 }]);
        assert_eq!(scratch.read_u8(0), 0xFF);
        assert_eq!(scratch.read_u8(8), 0);
        assert_eq!(scratch.read_u8(31), 0);
    }

    #[test]
    fn boundary_crossing_is_reported() {
        let mut dram_bytes = vec![0u8; 64];
        let mut scratch_bytes = new_scratch_memory();
        let mut dram = DramView::new(&mut dram_bytes, MemoryLayout::Logical);
        let mut scratch = ScratchView::new(&mut scratch_bytes, MemoryLayout::Logical);
        let mut reports = Vec::new();
        transfer(&mut scratch, &mut dram, 0xFF8, 0, 0xF, DmaDirection::DramToScratch, |d| {
            reports.push(d);
        });
        assert_eq!(reports, vec![Diagnostic::DmaCrossesBoundary { scratch: 0xFF8 }]);
    }
}
