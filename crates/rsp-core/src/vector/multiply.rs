//! Multiply and multiply-accumulate opcodes.
//!
//! The `VMUL*`/`VMUD*` forms overwrite the accumulator; the `VMAC*`/`VMAD*`
//! forms add to it with carries propagated explicitly from low to mid to
//! high. Results are projected back to 16 bits with one of three clamps.

use super::lanes::LaneOps;
use crate::state::{Accumulator, Lanes};

struct Acc<B: LaneOps> {
    high: B::Vector,
    mid: B::Vector,
    low: B::Vector,
}

impl<B: LaneOps> Acc<B> {
    fn load(acc: &Accumulator) -> Self {
        Self {
            high: B::load(acc.high),
            mid: B::load(acc.mid),
            low: B::load(acc.low),
        }
    }

    fn commit(self, acc: &mut Accumulator) {
        acc.high = B::store(self.high);
        acc.mid = B::store(self.mid);
        acc.low = B::store(self.low);
    }
}

/// Wrapping sum plus an all-ones mask where the unsigned add carried out.
fn add_with_carry<B: LaneOps>(acc: B::Vector, value: B::Vector) -> (B::Vector, B::Vector) {
    let saturated = B::adds_u(acc, value);
    let sum = B::add(acc, value);
    (sum, B::ne(sum, saturated))
}

/// `low` when `high:mid` fits in `i16`, otherwise 0 (negative) or 0xFFFF.
fn clamp_signed_low<B: LaneOps>(acc: &Acc<B>) -> B::Vector {
    let zero = B::zero();
    let high_sign = B::sra15(acc.high);
    let mid_sign = B::sra15(acc.mid);
    let high_is_sign = B::eq(high_sign, acc.high);
    let mid_matches = B::eq(high_sign, mid_sign);
    let in_range = B::and(mid_matches, high_is_sign);
    let overflow_value = B::eq(high_sign, zero);
    B::blend(in_range, acc.low, overflow_value)
}

/// Signed fractional product, doubled and rounded. Shared by VMULF/VMULU.
fn fractional_product<B: LaneOps>(
    acc: &mut Acc<B>,
    vs: B::Vector,
    vt: B::Vector,
) -> (B::Vector, B::Vector) {
    let mut lo = B::mullo(vs, vt);
    let mut carry = B::srl15(lo);
    lo = B::add(lo, lo);
    let hi = B::mulhi(vs, vt);
    carry = B::add(carry, B::srl15(lo));
    acc.low = B::add(B::splat(0x8000), lo);
    acc.mid = B::add(B::shl1(hi), carry);
    let equal = B::eq(vs, vt);
    let negative = B::sra15(acc.mid);
    acc.high = B::andnot(equal, negative);
    (equal, negative)
}

pub fn vmulf<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let mut a = Acc::<B>::load(acc);
    let (equal, negative) = fractional_product(&mut a, B::load(vs), B::load(vte));
    // 0x8000 * 0x8000 overflows to 0x8000; pull it back to 0x7FFF.
    let vd = B::add(a.mid, B::and(equal, negative));
    a.commit(acc);
    B::store(vd)
}

pub fn vmulu<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let mut a = Acc::<B>::load(acc);
    let (_, negative) = fractional_product(&mut a, B::load(vs), B::load(vte));
    let vd = B::andnot(a.high, B::or(a.mid, negative));
    a.commit(acc);
    B::store(vd)
}

pub fn vmudl<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let low = B::mulhi_u(B::load(vs), B::load(vte));
    Acc::<B> {
        high: B::zero(),
        mid: B::zero(),
        low,
    }
    .commit(acc);
    B::store(low)
}

pub fn vmudm<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let low = B::mullo(s, t);
    let mid = B::sub(B::mulhi_u(s, t), B::and(t, B::sra15(s)));
    let high = B::sra15(mid);
    Acc::<B> { high, mid, low }.commit(acc);
    B::store(mid)
}

pub fn vmudn<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let low = B::mullo(s, t);
    let mid = B::sub(B::mulhi_u(s, t), B::and(s, B::sra15(t)));
    let high = B::sra15(mid);
    Acc::<B> { high, mid, low }.commit(acc);
    B::store(low)
}

pub fn vmudh<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let (s, t) = (B::load(vs), B::load(vte));
    let mid = B::mullo(s, t);
    let high = B::mulhi(s, t);
    let vd = B::clamp_pair(mid, high);
    Acc::<B> {
        high,
        mid,
        low: B::zero(),
    }
    .commit(acc);
    B::store(vd)
}

/// Adds the doubled signed product to the accumulator. Shared by
/// VMACF/VMACU.
fn accumulate_fractional<B: LaneOps>(acc: &mut Acc<B>, vs: B::Vector, vt: B::Vector) {
    let zero = B::zero();
    let lo = B::mullo(vs, vt);
    let hi = B::mulhi(vs, vt);
    let mut md = B::or(B::shl1(hi), B::srl15(lo));
    let mut sign = B::sra15(hi);
    let (low, carry) = add_with_carry::<B>(acc.low, B::shl1(lo));
    acc.low = low;
    md = B::sub(md, carry);
    sign = B::sub(sign, B::and(B::eq(md, zero), carry));
    let (mid, carry) = add_with_carry::<B>(acc.mid, md);
    acc.mid = mid;
    acc.high = B::sub(B::add(acc.high, sign), carry);
}

pub fn vmacf<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let mut a = Acc::<B>::load(acc);
    accumulate_fractional(&mut a, B::load(vs), B::load(vte));
    let vd = B::clamp_pair(a.mid, a.high);
    a.commit(acc);
    B::store(vd)
}

pub fn vmacu<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let mut a = Acc::<B>::load(acc);
    accumulate_fractional(&mut a, B::load(vs), B::load(vte));
    let mid_or_sign = B::or(B::sra15(a.mid), a.mid);
    let positive_overflow = B::gt(a.high, B::zero());
    let vd = B::or(positive_overflow, B::andnot(B::sra15(a.high), mid_or_sign));
    a.commit(acc);
    B::store(vd)
}

pub fn vmadl<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let mut a = Acc::<B>::load(acc);
    let product = B::mulhi_u(B::load(vs), B::load(vte));
    let (low, carry) = add_with_carry::<B>(a.low, product);
    a.low = low;
    let (mid, carry) = add_with_carry::<B>(a.mid, B::sub(B::zero(), carry));
    a.mid = mid;
    a.high = B::sub(a.high, carry);
    let vd = clamp_signed_low(&a);
    a.commit(acc);
    B::store(vd)
}

/// Adds a mixed-sign product (`lo`, `hi` already sign-corrected).
fn accumulate_mixed<B: LaneOps>(acc: &mut Acc<B>, lo: B::Vector, hi: B::Vector) {
    let (low, carry) = add_with_carry::<B>(acc.low, lo);
    acc.low = low;
    let hi = B::sub(hi, carry);
    let (mid, carry) = add_with_carry::<B>(acc.mid, hi);
    acc.mid = mid;
    acc.high = B::sub(B::add(acc.high, B::sra15(hi)), carry);
}

pub fn vmadm<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let mut a = Acc::<B>::load(acc);
    let (s, t) = (B::load(vs), B::load(vte));
    let hi = B::sub(B::mulhi_u(s, t), B::and(t, B::sra15(s)));
    accumulate_mixed(&mut a, B::mullo(s, t), hi);
    let vd = B::clamp_pair(a.mid, a.high);
    a.commit(acc);
    B::store(vd)
}

pub fn vmadn<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let mut a = Acc::<B>::load(acc);
    let (s, t) = (B::load(vs), B::load(vte));
    let hi = B::sub(B::mulhi_u(s, t), B::and(s, B::sra15(t)));
    accumulate_mixed(&mut a, B::mullo(s, t), hi);
    let vd = clamp_signed_low(&a);
    a.commit(acc);
    B::store(vd)
}

pub fn vmadh<B: LaneOps>(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let mut a = Acc::<B>::load(acc);
    let (s, t) = (B::load(vs), B::load(vte));
    let (mid, carry) = add_with_carry::<B>(a.mid, B::mullo(s, t));
    a.mid = mid;
    a.high = B::add(a.high, B::sub(B::mulhi(s, t), carry));
    let vd = B::clamp_pair(a.mid, a.high);
    a.commit(acc);
    B::store(vd)
}
