//! Interpreter for the Nintendo 64 Reality Signal Processor.
//!
//! The crate models the scalar MIPS core, the COP2 vector unit with its
//! accumulator and flag registers, the COP0 control registers and the
//! DMA engine. Host memory is borrowed through [`MemoryMap`] for each
//! [`Rsp::do_cycles`] call; host callbacks arrive through [`RspHost`].

/// Scratch memory map and layout-aware accessors.
pub mod memory;
pub use memory::{
    decode_scratch_region, new_scratch_memory, DramView, MemoryLayout, RegionDescriptor,
    ScratchRegion, ScratchView, BOOT_VECTOR, DATA_ADDRESS_MASK, DMEM_END, DMEM_START,
    FETCH_ADDRESS_MASK, IMEM_END, IMEM_START, SCRATCH_BYTES, SCRATCH_REGIONS,
    TASK_DATA_PTR_OFFSET, TASK_TYPE_OFFSET,
};

/// Advisory diagnostics and their counters.
pub mod diag;
pub use diag::{Diagnostic, DiagnosticClass, DiagnosticCounters, TransferRejection};

/// Scalar and vector architectural state.
pub mod state;
pub use state::{
    Accumulator, ArchitecturalState, DivideState, LaneMask, Lanes, ScalarRegister,
    ScalarRegisters, VectorFile, VectorFlags, VectorRegister, VectorState, ELEMENT_BROADCAST,
    LANE_COUNT, SCALAR_REGISTER_COUNT, VECTOR_BYTES, VECTOR_REGISTER_COUNT,
};

/// Opcode tables for the scalar unit and both coprocessors.
pub mod encoding;
pub use encoding::{
    sign_extend_offset7, CoprocessorMove, PrimaryOpcode, RegimmFunction, SpecialFunction,
    VectorMemoryOpcode, VectorOpcode, VECTOR_MEMORY_TABLE, VECTOR_OPCODE_TABLE,
};

/// Instruction word decoding.
pub mod decoder;
pub use decoder::{
    AluOp, BranchCondition, DecodedInstruction, Decoder, ImmediateOp, InstructionWord, LoadKind,
    ShiftKind, StoreKind,
};

/// COP2 computational and transfer operations.
pub mod vector;
pub use vector::{
    divide_lookup, ActiveBackend, LaneOps, Portable, TransferOperands, VectorOperands,
    DIVIDE_ROM, DIVIDE_ROM_ENTRIES,
};

/// DMA between DRAM and scratch memory.
pub mod dma;
pub use dma::{DmaDirection, DmaShape, DMA_CHUNK_BYTES};

/// COP0 control registers.
pub mod control;
pub use control::{
    ControlLatches, ControlRegister, RcpRegisters, DPC_STATUS_FLUSH, DPC_STATUS_FREEZE,
    DPC_STATUS_XBUS_DMEM_DMA, MI_INTR_SP, SP_STATUS_BROKE, SP_STATUS_DMA_BUSY,
    SP_STATUS_DMA_FULL, SP_STATUS_HALT, SP_STATUS_INTR_BREAK, SP_STATUS_IO_FULL,
    SP_STATUS_SIG0, SP_STATUS_SIG2, SP_STATUS_SSTEP,
};

/// Scalar fetch/decode/execute.
pub mod execute;
pub use execute::{execute_instruction, step_one, Machine, StepOutcome};

/// Host-facing API.
pub mod api;
pub use api::{
    HostResponse, MemoryMap, MemoryMapError, NullHost, Rsp, RspConfig, RspHost, RunExit,
    TaskType,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
