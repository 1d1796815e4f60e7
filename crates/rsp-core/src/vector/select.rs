//! Compare, clip and merge opcodes.
//!
//! The compares fold the inbound VCO (from a preceding VADDC/VSUBC) into
//! equality so that 32-bit comparisons can be chained across registers.
//! VCL and VCH communicate through VCE for double-precision clipping.

use super::lanes::LaneOps;
use crate::state::{LaneMask, Lanes, VectorState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Less,
    Equal,
    NotEqual,
    GreaterOrEqual,
}

pub fn compare<B: LaneOps>(
    state: &mut VectorState,
    op: CompareOp,
    vs: Lanes,
    vte: Lanes,
) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let carry = B::from_mask(state.flags.carry);
    let not_equal = B::from_mask(state.flags.not_equal);
    let equal = B::eq(s, t);
    let selected = match op {
        CompareOp::Less => B::or(B::lt(s, t), B::and(B::and(not_equal, carry), equal)),
        CompareOp::Equal => B::andnot(not_equal, equal),
        CompareOp::NotEqual => B::or(B::and(not_equal, equal), B::not(equal)),
        CompareOp::GreaterOrEqual => {
            B::or(B::gt(s, t), B::andnot(B::and(not_equal, carry), equal))
        }
    };
    let vd = B::store(B::blend(selected, s, t));
    state.flags.compare = B::to_mask(selected);
    state.flags.clip = LaneMask::NONE;
    state.flags.clear_vco();
    state.acc.low = vd;
    vd
}

pub fn vcl<B: LaneOps>(state: &mut VectorState, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let zero = B::zero();
    let carry = B::from_mask(state.flags.carry);
    let not_equal = B::from_mask(state.flags.not_equal);
    let compare = B::from_mask(state.flags.compare);
    let clip = B::from_mask(state.flags.clip);
    let extension = B::from_mask(state.flags.extension);

    let negated_t = B::sub(B::xor(t, carry), carry);
    let diff = B::sub(s, negated_t);
    let no_carry = B::eq(diff, B::adds_u(s, t));
    let diff_zero = B::eq(diff, zero);
    let le_single = B::and(B::eq(extension, zero), B::and(diff_zero, no_carry));
    let le_double = B::and(extension, B::or(diff_zero, no_carry));
    let le_equal = B::or(le_single, le_double);
    let ge_equal = B::eq(B::subs_u(t, s), zero);

    let le = B::blend(B::andnot(not_equal, carry), le_equal, compare);
    let ge = B::blend(B::or(carry, not_equal), clip, ge_equal);
    let mask = B::blend(carry, le, ge);
    let vd = B::store(B::blend(mask, negated_t, s));

    state.flags.clip = B::to_mask(ge);
    state.flags.compare = B::to_mask(le);
    state.flags.clear_vco();
    state.flags.extension = LaneMask::NONE;
    state.acc.low = vd;
    vd
}

pub fn vch<B: LaneOps>(state: &mut VectorState, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let zero = B::zero();
    let sign = B::lt(B::xor(s, t), zero);
    let negated_t = B::sub(B::xor(t, sign), sign);
    let diff = B::sub(s, negated_t);
    let diff_zero = B::eq(diff, zero);
    let t_negative = B::lt(t, zero);
    let diff_positive = B::gt(diff, zero);
    let diff_ge_zero = B::or(diff_positive, diff_zero);
    let diff_le_zero = B::eq(zero, diff_positive);

    let clip = B::blend(sign, t_negative, diff_ge_zero);
    let compare = B::blend(sign, diff_le_zero, t_negative);
    let extension = B::and(B::eq(diff, sign), sign);
    let not_equal = B::eq(B::or(diff_zero, extension), zero);
    let mask = B::blend(sign, compare, clip);
    let vd = B::store(B::blend(mask, negated_t, s));

    state.flags.carry = B::to_mask(sign);
    state.flags.not_equal = B::to_mask(not_equal);
    state.flags.compare = B::to_mask(compare);
    state.flags.clip = B::to_mask(clip);
    state.flags.extension = B::to_mask(extension);
    state.acc.low = vd;
    vd
}

pub fn vcr<B: LaneOps>(state: &mut VectorState, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let sign = B::sra15(B::xor(s, t));
    let le = B::sra15(B::add(B::and(s, sign), t));
    let ge = B::eq(B::min(B::or(s, sign), t), t);
    let not_t = B::xor(t, sign);
    let mask = B::blend(sign, le, ge);
    let vd = B::store(B::blend(mask, not_t, s));

    state.flags.compare = B::to_mask(le);
    state.flags.clip = B::to_mask(ge);
    state.flags.clear_vco();
    state.flags.extension = LaneMask::NONE;
    state.acc.low = vd;
    vd
}

/// Selects `vs` where VCC.compare is set, `vte` elsewhere. Flags untouched.
pub fn vmrg<B: LaneOps>(state: &mut VectorState, vs: Lanes, vte: Lanes) -> Lanes {
    let select = B::from_mask(state.flags.compare);
    let vd = B::store(B::blend(select, B::load(vs), B::load(vte)));
    state.acc.low = vd;
    vd
}
