//! SSE2 lane backend. Bit-identical to [`super::lanes::Portable`].

#![allow(unsafe_code, unused_unsafe)]

use core::arch::x86_64::{
    __m128i, _mm_add_epi16, _mm_adds_epi16, _mm_adds_epu16, _mm_and_si128, _mm_andnot_si128,
    _mm_cmpeq_epi16, _mm_cmpgt_epi16, _mm_cmplt_epi16, _mm_max_epi16, _mm_min_epi16,
    _mm_mulhi_epi16, _mm_mulhi_epu16, _mm_mullo_epi16, _mm_or_si128, _mm_packs_epi32,
    _mm_set1_epi16, _mm_slli_epi16, _mm_srai_epi16, _mm_srli_epi16, _mm_sub_epi16,
    _mm_subs_epi16, _mm_subs_epu16, _mm_unpackhi_epi16, _mm_unpacklo_epi16, _mm_xor_si128,
};

use super::lanes::{LaneOps, Portable};
use crate::state::{LaneMask, Lanes};

/// SSE2 backend; SSE2 is part of the x86_64 baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sse2;

macro_rules! binary {
    ($name:ident, $intrinsic:ident) => {
        fn $name(a: __m128i, b: __m128i) -> __m128i {
            // SAFETY: SSE2 is always available on x86_64.
            unsafe { $intrinsic(a, b) }
        }
    };
}

#[allow(clippy::cast_possible_wrap)]
impl LaneOps for Sse2 {
    type Vector = __m128i;

    fn load(lanes: Lanes) -> __m128i {
        // SAFETY: `[u16; 8]` and `__m128i` are both 16 bytes and every bit
        // pattern is valid for either. Lane 0 lands in element 0.
        unsafe { core::mem::transmute::<Lanes, __m128i>(lanes) }
    }

    fn store(v: __m128i) -> Lanes {
        // SAFETY: see `load`.
        unsafe { core::mem::transmute::<__m128i, Lanes>(v) }
    }

    fn splat(value: u16) -> __m128i {
        // SAFETY: SSE2 is always available on x86_64.
        unsafe { _mm_set1_epi16(value as i16) }
    }

    fn from_mask(mask: LaneMask) -> __m128i {
        Self::load(Portable::from_mask(mask))
    }

    fn to_mask(v: __m128i) -> LaneMask {
        Portable::to_mask(Self::store(v))
    }

    binary!(add, _mm_add_epi16);
    binary!(sub, _mm_sub_epi16);
    binary!(adds, _mm_adds_epi16);
    binary!(subs, _mm_subs_epi16);
    binary!(adds_u, _mm_adds_epu16);
    binary!(subs_u, _mm_subs_epu16);
    binary!(min, _mm_min_epi16);
    binary!(max, _mm_max_epi16);
    binary!(eq, _mm_cmpeq_epi16);
    binary!(gt, _mm_cmpgt_epi16);
    binary!(lt, _mm_cmplt_epi16);
    binary!(and, _mm_and_si128);
    binary!(or, _mm_or_si128);
    binary!(xor, _mm_xor_si128);
    binary!(andnot, _mm_andnot_si128);
    binary!(mullo, _mm_mullo_epi16);
    binary!(mulhi, _mm_mulhi_epi16);
    binary!(mulhi_u, _mm_mulhi_epu16);

    fn sra15(a: __m128i) -> __m128i {
        // SAFETY: SSE2 is always available on x86_64.
        unsafe { _mm_srai_epi16::<15>(a) }
    }

    fn srl15(a: __m128i) -> __m128i {
        // SAFETY: SSE2 is always available on x86_64.
        unsafe { _mm_srli_epi16::<15>(a) }
    }

    fn shl1(a: __m128i) -> __m128i {
        // SAFETY: SSE2 is always available on x86_64.
        unsafe { _mm_slli_epi16::<1>(a) }
    }

    fn blend(mask: __m128i, set: __m128i, clear: __m128i) -> __m128i {
        // SAFETY: SSE2 is always available on x86_64.
        unsafe { _mm_or_si128(_mm_and_si128(mask, set), _mm_andnot_si128(mask, clear)) }
    }

    fn clamp_pair(mid: __m128i, hi: __m128i) -> __m128i {
        // SAFETY: SSE2 is always available on x86_64.
        unsafe {
            let lo = _mm_unpacklo_epi16(mid, hi);
            let hi = _mm_unpackhi_epi16(mid, hi);
            _mm_packs_epi32(lo, hi)
        }
    }
}
