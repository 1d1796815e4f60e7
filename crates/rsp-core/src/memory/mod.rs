//! Scratch memory map and byte-order-correcting accessors.

/// Layout-aware views over host-owned memory.
pub mod access;
/// Fixed DMEM/IMEM map and address masks.
pub mod map;

pub use access::{DramView, MemoryLayout, ScratchView};
pub use map::{
    decode_scratch_region, RegionDescriptor, ScratchRegion, BOOT_VECTOR, DATA_ADDRESS_MASK,
    DMA_DRAM_LIMIT_MASK, DMA_DRAM_MASK, DMA_SCRATCH_MASK, DMEM_END, DMEM_START,
    FETCH_ADDRESS_MASK, IMEM_END, IMEM_START, SCRATCH_BANK_BYTES, SCRATCH_BYTES,
    SCRATCH_REGIONS, TASK_DATA_PTR_OFFSET, TASK_TYPE_OFFSET,
};

/// Allocates a zeroed scratch window (DMEM followed by IMEM).
#[must_use]
pub fn new_scratch_memory() -> Box<[u8]> {
    vec![0; SCRATCH_BYTES].into_boxed_slice()
}
