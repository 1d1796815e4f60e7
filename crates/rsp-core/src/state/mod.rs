//! Architectural state of the scalar unit and the vector coprocessor.

/// Scalar register file.
pub mod registers;
/// Vector register file and element broadcast.
pub mod vector;
/// 48-bit accumulator slices.
pub mod accumulator;
/// VCO/VCC/VCE lane masks.
pub mod flags;
/// Reciprocal unit latches.
pub mod divide;

pub use accumulator::Accumulator;
pub use divide::DivideState;
pub use flags::{LaneMask, VectorFlags};
pub use registers::{ScalarRegister, ScalarRegisters, SCALAR_REGISTER_COUNT};
pub use vector::{
    Lanes, VectorFile, VectorRegister, ELEMENT_BROADCAST, LANE_COUNT, VECTOR_BYTES,
    VECTOR_REGISTER_COUNT,
};

use crate::memory::FETCH_ADDRESS_MASK;

/// Everything COP2 owns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VectorState {
    /// `$v0..$v31`.
    pub registers: VectorFile,
    /// Accumulator.
    pub acc: Accumulator,
    /// Flag registers.
    pub flags: VectorFlags,
    /// Divide latches.
    pub divide: DivideState,
}

/// Scalar and vector register state plus the program counter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    /// `$0..$31`.
    pub scalar: ScalarRegisters,
    /// COP2 state.
    pub vector: VectorState,
    pc: u32,
    branch_target: Option<u32>,
}

impl ArchitecturalState {
    /// Creates zeroed state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// IMEM-relative program counter (`0..=0xFFC`).
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Sets the program counter, masked to IMEM.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc & FETCH_ADDRESS_MASK;
    }

    /// Target that takes effect after the current delay slot, if any.
    #[must_use]
    pub const fn branch_target(&self) -> Option<u32> {
        self.branch_target
    }

    /// Records a taken branch.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_branch_target(&mut self, target: u32) {
        self.branch_target = Some(target & FETCH_ADDRESS_MASK);
    }

    /// Removes and returns the pending branch.
    #[allow(clippy::missing_const_for_fn)]
    pub fn take_branch_target(&mut self) -> Option<u32> {
        self.branch_target.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pc_and_targets_are_masked_to_imem() {
        let mut state = ArchitecturalState::new();
        state.set_pc(0x0400_1FFF);
        assert_eq!(state.pc(), 0xFFC);
        state.set_branch_target(0x1234);
        assert_eq!(state.take_branch_target(), Some(0x234));
        assert_eq!(state.branch_target(), None);
    }
}
