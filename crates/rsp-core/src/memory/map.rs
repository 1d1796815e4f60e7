//! Fixed scratch-memory map, task header offsets and address masks.

/// Inclusive start of data memory within the scratch window.
pub const DMEM_START: u16 = 0x0000;
/// Inclusive end of data memory within the scratch window.
pub const DMEM_END: u16 = 0x0FFF;
/// Inclusive start of instruction memory within the scratch window.
pub const IMEM_START: u16 = 0x1000;
/// Inclusive end of instruction memory within the scratch window.
pub const IMEM_END: u16 = 0x1FFF;

/// Size in bytes of one of DMEM or IMEM.
pub const SCRATCH_BANK_BYTES: usize = 0x1000;
/// Size in bytes of the combined DMEM + IMEM window.
pub const SCRATCH_BYTES: usize = 0x2000;

/// Mask applied to scalar and vector data addresses (wrap within DMEM).
pub const DATA_ADDRESS_MASK: u32 = 0x0FFF;
/// Mask applied to the program counter before fetch.
pub const FETCH_ADDRESS_MASK: u32 = 0x0FFC;
/// Mask applied to the scratch side of a DMA transfer.
pub const DMA_SCRATCH_MASK: u32 = 0x1FF8;
/// Mask applied to the DRAM side of a DMA transfer.
pub const DMA_DRAM_MASK: u32 = 0x00FF_FFF8;
/// DRAM addresses with bits outside this mask read as zero.
pub const DMA_DRAM_LIMIT_MASK: u32 = 0x007F_FFF8;

/// DMEM offset of the big-endian task type word.
pub const TASK_TYPE_OFFSET: u32 = 0x0FC0;
/// DMEM offset of the big-endian task data pointer.
pub const TASK_DATA_PTR_OFFSET: u32 = 0x0FF0;

/// Value written to `sp_pc` on reset and OR-ed into it on every exit.
pub const BOOT_VECTOR: u32 = 0x0400_1000;

/// Canonical descriptor for one scratch bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionDescriptor {
    /// Bank classification.
    pub region: ScratchRegion,
    /// Inclusive start offset.
    pub start: u16,
    /// Inclusive end offset.
    pub end: u16,
}

/// The two banks of the scratch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ScratchRegion {
    /// Data memory (`0x0000..=0x0FFF`).
    Dmem,
    /// Instruction memory (`0x1000..=0x1FFF`).
    Imem,
}

impl ScratchRegion {
    /// Returns the inclusive bounds for this bank.
    #[must_use]
    pub const fn bounds(self) -> (u16, u16) {
        match self {
            Self::Dmem => (DMEM_START, DMEM_END),
            Self::Imem => (IMEM_START, IMEM_END),
        }
    }

    /// Returns `true` when `offset` belongs to this bank.
    #[must_use]
    pub const fn contains(self, offset: u16) -> bool {
        let (start, end) = self.bounds();
        offset >= start && offset <= end
    }

    /// Returns the canonical descriptor for this bank.
    #[must_use]
    pub const fn descriptor(self) -> RegionDescriptor {
        let (start, end) = self.bounds();
        RegionDescriptor {
            region: self,
            start,
            end,
        }
    }
}

/// Scratch banks in ascending offset order.
pub const SCRATCH_REGIONS: [RegionDescriptor; 2] = [
    ScratchRegion::Dmem.descriptor(),
    ScratchRegion::Imem.descriptor(),
];

const _: () = assert_scratch_layout();

const fn assert_scratch_layout() {
    assert!(
        SCRATCH_REGIONS[0].start == 0,
        "scratch window must begin at DMEM"
    );
    assert!(
        SCRATCH_REGIONS[0].end.wrapping_add(1) == SCRATCH_REGIONS[1].start,
        "banks must be contiguous"
    );
    assert!(
        SCRATCH_REGIONS[1].end as usize + 1 == SCRATCH_BYTES,
        "banks must cover the scratch window"
    );
    assert!(
        DATA_ADDRESS_MASK as usize + 1 == SCRATCH_BANK_BYTES,
        "data mask must wrap within one bank"
    );
    assert!(
        TASK_TYPE_OFFSET < DATA_ADDRESS_MASK && TASK_DATA_PTR_OFFSET < DATA_ADDRESS_MASK,
        "task header lives in DMEM"
    );
}

/// Classifies a scratch offset; offsets wrap modulo the window size.
#[must_use]
pub const fn decode_scratch_region(offset: u32) -> ScratchRegion {
    if offset as usize % SCRATCH_BYTES < SCRATCH_BANK_BYTES {
        ScratchRegion::Dmem
    } else {
        ScratchRegion::Imem
    }
}
