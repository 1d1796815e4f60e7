//! Add, subtract, absolute value and accumulator readback.

use super::lanes::LaneOps;
use crate::state::{LaneMask, Lanes, VectorState, LANE_COUNT};

pub fn vadd<B: LaneOps>(state: &mut VectorState, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let carry = B::from_mask(state.flags.carry);
    state.acc.low = B::store(B::sub(B::add(s, t), carry));
    // Saturate in two steps so the carry-in never double-clamps.
    let low = B::subs(B::min(s, t), carry);
    let vd = B::adds(low, B::max(s, t));
    state.flags.clear_vco();
    B::store(vd)
}

pub fn vsub<B: LaneOps>(state: &mut VectorState, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let carry = B::from_mask(state.flags.carry);
    let wrapped = B::sub(t, carry);
    let saturated = B::subs(t, carry);
    state.acc.low = B::store(B::sub(s, wrapped));
    let overflow = B::gt(saturated, wrapped);
    let vd = B::adds(B::subs(s, saturated), overflow);
    state.flags.clear_vco();
    B::store(vd)
}

pub fn vabs<B: LaneOps>(state: &mut VectorState, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let is_zero = B::eq(s, B::zero());
    let sign = B::sra15(s);
    let flipped = B::xor(B::andnot(is_zero, t), sign);
    state.acc.low = B::store(B::sub(flipped, sign));
    B::store(B::subs(flipped, sign))
}

pub fn vaddc<B: LaneOps>(state: &mut VectorState, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let sum = B::add(s, t);
    let carry = B::ne(B::adds_u(s, t), sum);
    state.flags.carry = B::to_mask(carry);
    state.flags.not_equal = LaneMask::NONE;
    let vd = B::store(sum);
    state.acc.low = vd;
    vd
}

pub fn vsubc<B: LaneOps>(state: &mut VectorState, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let equal = B::eq(s, t);
    let not_greater = B::eq(B::subs_u(s, t), B::zero());
    state.flags.not_equal = B::to_mask(B::not(equal));
    state.flags.carry = B::to_mask(B::andnot(equal, not_greater));
    let vd = B::store(B::sub(s, t));
    state.acc.low = vd;
    vd
}

/// Reads an accumulator slice: element 8 high, 9 mid, 10 low, else zero.
pub const fn vsar(state: &VectorState, element: u8) -> Lanes {
    match element {
        8 => state.acc.high,
        9 => state.acc.mid,
        10 => state.acc.low,
        _ => [0; LANE_COUNT],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::lanes::Portable;

    #[test]
    fn vadd_uses_and_clears_carry() {
        let mut state = VectorState::default();
        state.flags.carry = LaneMask::from_bits(0b0000_0001);
        state.flags.not_equal = LaneMask::ALL;
        let vd = vadd::<Portable>(&mut state, [0x7FFF, 1, 0, 0, 0, 0, 0, 0], [0, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(vd[0], 0x7FFF, "saturates after carry-in");
        assert_eq!(state.acc.low[0], 0x8000, "low slice wraps");
        assert_eq!(vd[1], 2);
        assert_eq!(state.flags.vco(), 0);
    }

    #[test]
    fn vsub_saturates_negative() {
        let mut state = VectorState::default();
        let vd = vsub::<Portable>(&mut state, [0x8000; 8], [1; 8]);
        assert_eq!(vd, [0x8000; 8]);
        assert_eq!(state.acc.low, [0x7FFF; 8]);
    }

    #[test]
    fn vabs_min_value_clamps_but_accumulator_wraps() {
        let mut state = VectorState::default();
        let vd = vabs::<Portable>(
            &mut state,
            [0xFFFF, 0, 5, 0xFFFF, 0, 0, 0, 0],
            [0x8000, 7, 9, 3, 0, 0, 0, 0],
        );
        assert_eq!(vd[0], 0x7FFF);
        assert_eq!(state.acc.low[0], 0x8000);
        assert_eq!(vd[1], 0, "zero source yields zero");
        assert_eq!(vd[2], 9);
        assert_eq!(vd[3], 0xFFFD);
    }

    #[test]
    fn vsubc_sets_borrow_and_not_equal() {
        let mut state = VectorState::default();
        let vd = vsubc::<Portable>(&mut state, [1, 2, 3, 0, 0, 0, 0, 0], [2, 2, 1, 0, 0, 0, 0, 0]);
        assert_eq!(vd[0], 0xFFFF);
        assert_eq!(state.flags.carry.to_bits(), 0b0000_0001);
        assert_eq!(state.flags.not_equal.to_bits(), 0b0000_0101);
    }

    #[test]
    fn vsar_reads_slices() {
        let mut state = VectorState::default();
        state.acc.set_lane(0, 0x1111_2222_3333);
        assert_eq!(vsar(&state, 8)[0], 0x1111);
        assert_eq!(vsar(&state, 9)[0], 0x2222);
        assert_eq!(vsar(&state, 10)[0], 0x3333);
        assert_eq!(vsar(&state, 0)[0], 0);
    }
}
