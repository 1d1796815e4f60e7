//! Bitwise opcodes. Each writes the accumulator low slice and `vd`.

use super::lanes::LaneOps;
use crate::state::{Accumulator, Lanes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Nxor,
}

pub fn apply<B: LaneOps>(acc: &mut Accumulator, op: LogicOp, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let result = match op {
        LogicOp::And => B::and(s, t),
        LogicOp::Nand => B::not(B::and(s, t)),
        LogicOp::Or => B::or(s, t),
        LogicOp::Nor => B::not(B::or(s, t)),
        LogicOp::Xor => B::xor(s, t),
        LogicOp::Nxor => B::not(B::xor(s, t)),
    };
    let vd = B::store(result);
    acc.low = vd;
    vd
}

/// Reserved function: low slice gets the sum, `vd` is zeroed.
pub fn reserved<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    acc.low = B::store(B::add(B::load(vs), B::load(vte)));
    B::store(B::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::lanes::Portable;

    #[test]
    fn inverted_forms_complement() {
        let mut acc = Accumulator::default();
        let a = [0x00FF; 8];
        let b = [0x0F0F; 8];
        assert_eq!(apply::<Portable>(&mut acc, LogicOp::And, a, b), [0x000F; 8]);
        assert_eq!(apply::<Portable>(&mut acc, LogicOp::Nand, a, b), [0xFFF0; 8]);
        assert_eq!(apply::<Portable>(&mut acc, LogicOp::Nor, a, b), [0xF000; 8]);
        assert_eq!(apply::<Portable>(&mut acc, LogicOp::Nxor, a, b), [0xF00F; 8]);
        assert_eq!(acc.low, [0xF00F; 8]);
    }

    #[test]
    fn reserved_zeroes_destination() {
        let mut acc = Accumulator::default();
        let vd = reserved::<Portable>(&mut acc, [3; 8], [4; 8]);
        assert_eq!(vd, [0; 8]);
        assert_eq!(acc.low, [7; 8]);
    }
}
