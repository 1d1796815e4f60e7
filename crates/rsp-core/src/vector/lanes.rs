//! Lane-parallel primitive set shared by every vector opcode.
//!
//! Each opcode is written once against [`LaneOps`]; backends only supply
//! the primitives. All comparisons produce all-ones / all-zeros lanes.

use crate::state::{LaneMask, Lanes, LANE_COUNT};

/// 16-bit × 8 lane primitives.
pub trait LaneOps {
    /// Backend register type.
    type Vector: Copy;

    /// Loads lanes (lane 0 first).
    fn load(lanes: Lanes) -> Self::Vector;
    /// Stores lanes (lane 0 first).
    fn store(v: Self::Vector) -> Lanes;
    /// Every lane set to `value`.
    fn splat(value: u16) -> Self::Vector;
    /// Expands a mask to all-ones / zero lanes.
    fn from_mask(mask: LaneMask) -> Self::Vector;
    /// Non-zero lanes become set mask bits.
    fn to_mask(v: Self::Vector) -> LaneMask;

    /// Wrapping add.
    fn add(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Wrapping subtract.
    fn sub(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Signed saturating add.
    fn adds(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Signed saturating subtract.
    fn subs(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Unsigned saturating add.
    fn adds_u(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Unsigned saturating subtract.
    fn subs_u(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Signed minimum.
    fn min(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Signed maximum.
    fn max(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// `a == b`.
    fn eq(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Signed `a > b`.
    fn gt(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Signed `a < b`.
    fn lt(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Bitwise and.
    fn and(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Bitwise or.
    fn or(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Bitwise xor.
    fn xor(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// `!a & b`.
    fn andnot(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Low 16 bits of the product.
    fn mullo(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// High 16 bits of the signed product.
    fn mulhi(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// High 16 bits of the unsigned product.
    fn mulhi_u(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    /// Arithmetic shift right by 15 (sign spread).
    fn sra15(a: Self::Vector) -> Self::Vector;
    /// Logical shift right by 15 (sign bit).
    fn srl15(a: Self::Vector) -> Self::Vector;
    /// Shift left by one.
    fn shl1(a: Self::Vector) -> Self::Vector;
    /// Bitwise select: `set` where `mask` bits are one, `clear` elsewhere.
    fn blend(mask: Self::Vector, set: Self::Vector, clear: Self::Vector) -> Self::Vector;
    /// Clamps the signed 32-bit `hi:mid` pair of each lane to `i16`.
    fn clamp_pair(mid: Self::Vector, hi: Self::Vector) -> Self::Vector;

    /// All lanes zero.
    #[must_use]
    fn zero() -> Self::Vector {
        Self::splat(0)
    }

    /// Bitwise not.
    #[must_use]
    fn not(a: Self::Vector) -> Self::Vector {
        Self::xor(a, Self::splat(0xFFFF))
    }

    /// `a != b` as a lane mask.
    #[must_use]
    fn ne(a: Self::Vector, b: Self::Vector) -> Self::Vector {
        Self::not(Self::eq(a, b))
    }
}

/// Scalar reference backend; runs on every target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Portable;

fn map1(a: Lanes, f: impl Fn(u16) -> u16) -> Lanes {
    let mut out = [0; LANE_COUNT];
    for (slot, x) in out.iter_mut().zip(a) {
        *slot = f(x);
    }
    out
}

fn map2(a: Lanes, b: Lanes, f: impl Fn(u16, u16) -> u16) -> Lanes {
    let mut out = [0; LANE_COUNT];
    for ((slot, x), y) in out.iter_mut().zip(a).zip(b) {
        *slot = f(x, y);
    }
    out
}

const fn mask_of(condition: bool) -> u16 {
    if condition {
        0xFFFF
    } else {
        0
    }
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
impl LaneOps for Portable {
    type Vector = Lanes;

    fn load(lanes: Lanes) -> Lanes {
        lanes
    }

    fn store(v: Lanes) -> Lanes {
        v
    }

    fn splat(value: u16) -> Lanes {
        [value; LANE_COUNT]
    }

    fn from_mask(mask: LaneMask) -> Lanes {
        mask.0.map(mask_of)
    }

    fn to_mask(v: Lanes) -> LaneMask {
        LaneMask(v.map(|lane| lane != 0))
    }

    fn add(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, u16::wrapping_add)
    }

    fn sub(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, u16::wrapping_sub)
    }

    fn adds(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| (x as i16).saturating_add(y as i16) as u16)
    }

    fn subs(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| (x as i16).saturating_sub(y as i16) as u16)
    }

    fn adds_u(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, u16::saturating_add)
    }

    fn subs_u(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, u16::saturating_sub)
    }

    fn min(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| (x as i16).min(y as i16) as u16)
    }

    fn max(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| (x as i16).max(y as i16) as u16)
    }

    fn eq(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| mask_of(x == y))
    }

    fn gt(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| mask_of((x as i16) > (y as i16)))
    }

    fn lt(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| mask_of((x as i16) < (y as i16)))
    }

    fn and(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| x & y)
    }

    fn or(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| x | y)
    }

    fn xor(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| x ^ y)
    }

    fn andnot(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| !x & y)
    }

    fn mullo(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, u16::wrapping_mul)
    }

    fn mulhi(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| {
            ((i32::from(x as i16) * i32::from(y as i16)) >> 16) as u16
        })
    }

    fn mulhi_u(a: Lanes, b: Lanes) -> Lanes {
        map2(a, b, |x, y| ((u32::from(x) * u32::from(y)) >> 16) as u16)
    }

    fn sra15(a: Lanes) -> Lanes {
        map1(a, |x| ((x as i16) >> 15) as u16)
    }

    fn srl15(a: Lanes) -> Lanes {
        map1(a, |x| x >> 15)
    }

    fn shl1(a: Lanes) -> Lanes {
        map1(a, |x| x << 1)
    }

    fn blend(mask: Lanes, set: Lanes, clear: Lanes) -> Lanes {
        let mut out = [0; LANE_COUNT];
        for lane in 0..LANE_COUNT {
            out[lane] = (mask[lane] & set[lane]) | (!mask[lane] & clear[lane]);
        }
        out
    }

    fn clamp_pair(mid: Lanes, hi: Lanes) -> Lanes {
        map2(mid, hi, |m, h| {
            let wide = (i32::from(h as i16) << 16) | i32::from(m);
            wide.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as u16
        })
    }
}

/// Backend used by the interpreter for this build.
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub type ActiveBackend = super::sse::Sse2;

/// Backend used by the interpreter for this build.
#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
pub type ActiveBackend = Portable;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_pair_saturates_both_directions() {
        let mid = [0x0000, 0xFFFF, 0x8000, 0x7FFF, 0, 0, 0, 0];
        let hi = [0x0001, 0xFFFF, 0xFFFF, 0x0000, 0xFFFE, 0, 0, 0];
        assert_eq!(
            Portable::clamp_pair(mid, hi),
            [0x7FFF, 0xFFFF, 0x8000, 0x7FFF, 0x8000, 0, 0, 0]
        );
    }

    #[test]
    fn mul_high_halves() {
        let a = [0x8000, 0xFFFF, 2, 0, 0, 0, 0, 0];
        let b = [0x8000, 0xFFFF, 3, 0, 0, 0, 0, 0];
        assert_eq!(Portable::mulhi(a, b)[0], 0x4000);
        assert_eq!(Portable::mulhi_u(a, b)[1], 0xFFFE);
        assert_eq!(Portable::mullo(a, b)[2], 6);
    }

    #[test]
    fn masks_round_trip() {
        let mask = LaneMask::from_bits(0b1010_0101);
        assert_eq!(Portable::to_mask(Portable::from_mask(mask)), mask);
    }
}
