//! COP2 vector unit: opcode dispatch over a lane backend.
//!
//! Every opcode receives `vs` and the element-broadcast `vte` and produces
//! the lanes written to `vd`. The divide group works on single lanes and
//! takes register indices instead.

mod add;
mod divide;
mod logic;
mod loadstore;
mod mpeg;
mod multiply;
mod select;

/// Lane primitive trait and the portable backend.
pub mod lanes;
/// SSE2 lane backend.
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub mod sse;

pub use divide::{lookup as divide_lookup, DIVIDE_ROM, DIVIDE_ROM_ENTRIES};
pub use lanes::{ActiveBackend, LaneOps, Portable};
pub use loadstore::{transfer, TransferOperands};

use divide::DivideOp;
use logic::LogicOp;
use select::CompareOp;

use crate::encoding::VectorOpcode;
use crate::state::{Lanes, VectorState};

/// Register fields of one computational vector instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VectorOperands {
    /// Destination register.
    pub vd: u8,
    /// First source register; destination lane for the divide group.
    pub vs: u8,
    /// Second source register.
    pub vt: u8,
    /// Element selector applied to `vt`.
    pub element: u8,
}

/// Executes one computational vector opcode with backend `B`.
pub fn execute<B: LaneOps>(state: &mut VectorState, op: VectorOpcode, operands: VectorOperands) {
    let VectorOperands {
        vd,
        vs,
        vt,
        element,
    } = operands;

    if op.is_single_lane() {
        let divide_op = match op {
            VectorOpcode::Vrcp => DivideOp::Reciprocal,
            VectorOpcode::Vrcpl => DivideOp::ReciprocalLow,
            VectorOpcode::Vrcph => DivideOp::ReciprocalHigh,
            VectorOpcode::Vrsq => DivideOp::InverseSqrt,
            VectorOpcode::Vrsql => DivideOp::InverseSqrtLow,
            VectorOpcode::Vrsqh => DivideOp::InverseSqrtHigh,
            _ => DivideOp::Move,
        };
        divide::execute(state, divide_op, vd, vs, vt, element);
        return;
    }

    let source = state.registers.get(vs).lanes();
    let vte: Lanes = state.registers.get(vt).broadcast(element);

    let result = match op {
        VectorOpcode::Vnop | VectorOpcode::Vnull => return,
        VectorOpcode::Vmulf => multiply::vmulf::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmulu => multiply::vmulu::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmudl => multiply::vmudl::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmudm => multiply::vmudm::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmudn => multiply::vmudn::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmudh => multiply::vmudh::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmacf => multiply::vmacf::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmacu => multiply::vmacu::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmadl => multiply::vmadl::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmadm => multiply::vmadm::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmadn => multiply::vmadn::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmadh => multiply::vmadh::<B>(&mut state.acc, source, vte),
        VectorOpcode::Vmulq => mpeg::vmulq(&mut state.acc, source, vte),
        VectorOpcode::Vmacq => mpeg::vmacq(&mut state.acc),
        VectorOpcode::Vrndp => mpeg::round(&mut state.acc, true, vs, vte),
        VectorOpcode::Vrndn => mpeg::round(&mut state.acc, false, vs, vte),
        VectorOpcode::Vadd => add::vadd::<B>(state, source, vte),
        VectorOpcode::Vsub => add::vsub::<B>(state, source, vte),
        VectorOpcode::Vabs => add::vabs::<B>(state, source, vte),
        VectorOpcode::Vaddc => add::vaddc::<B>(state, source, vte),
        VectorOpcode::Vsubc => add::vsubc::<B>(state, source, vte),
        VectorOpcode::Vsar => add::vsar(state, element),
        VectorOpcode::Vlt => select::compare::<B>(state, CompareOp::Less, source, vte),
        VectorOpcode::Veq => select::compare::<B>(state, CompareOp::Equal, source, vte),
        VectorOpcode::Vne => select::compare::<B>(state, CompareOp::NotEqual, source, vte),
        VectorOpcode::Vge => select::compare::<B>(state, CompareOp::GreaterOrEqual, source, vte),
        VectorOpcode::Vcl => select::vcl::<B>(state, source, vte),
        VectorOpcode::Vch => select::vch::<B>(state, source, vte),
        VectorOpcode::Vcr => select::vcr::<B>(state, source, vte),
        VectorOpcode::Vmrg => select::vmrg::<B>(state, source, vte),
        VectorOpcode::Vand => logic::apply::<B>(&mut state.acc, LogicOp::And, source, vte),
        VectorOpcode::Vnand => logic::apply::<B>(&mut state.acc, LogicOp::Nand, source, vte),
        VectorOpcode::Vor => logic::apply::<B>(&mut state.acc, LogicOp::Or, source, vte),
        VectorOpcode::Vnor => logic::apply::<B>(&mut state.acc, LogicOp::Nor, source, vte),
        VectorOpcode::Vxor => logic::apply::<B>(&mut state.acc, LogicOp::Xor, source, vte),
        VectorOpcode::Vnxor => logic::apply::<B>(&mut state.acc, LogicOp::Nxor, source, vte),
        VectorOpcode::Vrcp
        | VectorOpcode::Vrcpl
        | VectorOpcode::Vrcph
        | VectorOpcode::Vmov
        | VectorOpcode::Vrsq
        | VectorOpcode::Vrsql
        | VectorOpcode::Vrsqh => return,
    };
    state.registers.get_mut(vd).0 = result;
}

/// Executes a reserved function field: the low accumulator slice receives
/// `vs + vte` and `vd` is zeroed.
pub fn execute_reserved<B: LaneOps>(state: &mut VectorState, operands: VectorOperands) {
    let source = state.registers.get(operands.vs).lanes();
    let vte = state.registers.get(operands.vt).broadcast(operands.element);
    state.registers.get_mut(operands.vd).0 = logic::reserved::<B>(&mut state.acc, source, vte);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VectorRegister;

    fn operands(vd: u8, vs: u8, vt: u8, element: u8) -> VectorOperands {
        VectorOperands {
            vd,
            vs,
            vt,
            element,
        }
    }

    #[test]
    fn vnop_changes_nothing() {
        let mut state = VectorState::default();
        state.registers.set(1, VectorRegister([9; 8]));
        state.flags.set_vco(0xA5A5);
        state.acc.set_lane(2, 0x1234_5678);
        let before = state.clone();
        execute::<Portable>(&mut state, VectorOpcode::Vnop, operands(1, 1, 1, 0));
        execute::<Portable>(&mut state, VectorOpcode::Vnull, operands(1, 1, 1, 0));
        assert_eq!(state, before);
    }

    #[test]
    fn element_broadcast_applies_to_vt() {
        let mut state = VectorState::default();
        state.registers.set(2, VectorRegister([1, 2, 3, 4, 5, 6, 7, 8]));
        state.registers.set(3, VectorRegister([10; 8]));
        execute::<Portable>(&mut state, VectorOpcode::Vor, operands(4, 3, 2, 8 + 5));
        assert_eq!(state.registers.get(4).lanes(), [10 | 6; 8]);
    }

    #[test]
    fn vsar_leaves_accumulator() {
        let mut state = VectorState::default();
        state.acc.set_lane(0, 0x0001_0002_0003);
        let before = state.acc;
        execute::<Portable>(&mut state, VectorOpcode::Vsar, operands(5, 0, 0, 9));
        assert_eq!(state.registers.get(5).lane(0), 2);
        assert_eq!(state.acc, before);
    }

    #[test]
    fn divide_group_routes_by_lane() {
        let mut state = VectorState::default();
        state.registers.set(2, VectorRegister([0; 8]));
        execute::<Portable>(&mut state, VectorOpcode::Vrcp, operands(1, 6, 2, 0));
        assert_eq!(state.registers.get(1).lane(6), 0xFFFF);
        assert_eq!(state.registers.get(1).lane(0), 0);
    }

    #[test]
    fn reserved_clears_destination() {
        let mut state = VectorState::default();
        state.registers.set(1, VectorRegister([5; 8]));
        state.registers.set(2, VectorRegister([6; 8]));
        state.registers.set(3, VectorRegister([0xFFFF; 8]));
        execute_reserved::<Portable>(&mut state, operands(3, 1, 2, 0));
        assert_eq!(state.registers.get(3), VectorRegister::ZERO);
        assert_eq!(state.acc.low, [11; 8]);
    }
}
