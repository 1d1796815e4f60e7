//! Reciprocal and inverse-square-root unit.
//!
//! Results are 32-bit: the destination lane receives the low half and the
//! high half is latched in `div_out` for a following `VRCPH`/`VRSQH`.

use crate::state::{Lanes, VectorState};

/// Entries in the mantissa ROM. The first half holds reciprocals.
pub const DIVIDE_ROM_ENTRIES: usize = 1024;

const HALF: usize = DIVIDE_ROM_ENTRIES / 2;

const fn reciprocal_entry(index: usize) -> u16 {
    if index == 0 {
        return 0xFFFF;
    }
    (((1u64 << 34) / (index as u64 + 512) + 1) >> 8) as u16
}

/// Largest `b >= 2^17` such that `a * (b + 1)^2 >= 2^44` does not yet hold,
/// found by bisection on `b + 1`.
const fn inverse_sqrt_entry(index: usize) -> u16 {
    let a = (index as u64 + 512) >> (index & 1);
    let limit = 1u64 << 44;
    let mut lo = (1u64 << 17) + 1;
    let mut hi = 1u64 << 19;
    while lo < hi {
        let mid = (lo + hi) / 2;
        if a * mid * mid >= limit {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    ((lo - 1) >> 1) as u16
}

const fn build_rom() -> [u16; DIVIDE_ROM_ENTRIES] {
    let mut rom = [0u16; DIVIDE_ROM_ENTRIES];
    let mut i = 0;
    while i < HALF {
        rom[i] = reciprocal_entry(i);
        rom[HALF + i] = inverse_sqrt_entry(i);
        i += 1;
    }
    rom
}

/// Mantissa ROM shared by both lookups.
pub static DIVIDE_ROM: [u16; DIVIDE_ROM_ENTRIES] = build_rom();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivideOp {
    Reciprocal,
    ReciprocalLow,
    ReciprocalHigh,
    InverseSqrt,
    InverseSqrtLow,
    InverseSqrtHigh,
    Move,
}

/// 32-bit reciprocal or inverse square root of `input`.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
pub fn lookup(input: i32, square_root: bool) -> u32 {
    let mask = input >> 31;
    let mut data = input ^ mask;
    if input > -32768 {
        data = data.wrapping_sub(mask);
    }
    if data == 0 {
        return 0x7FFF_FFFF;
    }
    if input == -32768 {
        return 0xFFFF_0000;
    }
    let data = data as u32;
    let shift = data.leading_zeros();
    let index = (((data << shift) & 0x7FC0_0000) >> 22) as usize;
    let result = if square_root {
        let entry = DIVIDE_ROM[HALF + ((index & 0x1FE) | (shift as usize & 1))];
        ((0x10000 | u32::from(entry)) << 14) >> ((31 - shift) >> 1)
    } else {
        let entry = DIVIDE_ROM[index];
        ((0x10000 | u32::from(entry)) << 14) >> (31 - shift)
    };
    result ^ mask as u32
}

/// Executes one divide-unit opcode. `de` is the destination lane taken
/// from the `vs` field.
#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub fn execute(state: &mut VectorState, op: DivideOp, vd: u8, de: u8, vt: u8, element: u8) {
    let source = state.registers.get(vt);
    let vte: Lanes = source.broadcast(element);
    let lane = source.lane(usize::from(element & 7));
    let de = usize::from(de & 7);
    state.acc.low = vte;

    let (square_root, double) = match op {
        DivideOp::Move => {
            state.registers.get_mut(vd).set_lane(de, vte[de]);
            return;
        }
        DivideOp::ReciprocalHigh | DivideOp::InverseSqrtHigh => {
            state.divide.double_precision = true;
            state.divide.div_in = lane;
            let out = state.divide.div_out;
            state.registers.get_mut(vd).set_lane(de, out);
            return;
        }
        DivideOp::Reciprocal => (false, false),
        DivideOp::InverseSqrt => (true, false),
        DivideOp::ReciprocalLow => (false, state.divide.double_precision),
        DivideOp::InverseSqrtLow => (true, state.divide.double_precision),
    };

    let input = if double {
        ((u32::from(state.divide.div_in) << 16) | u32::from(lane)) as i32
    } else {
        i32::from(lane as i16)
    };
    let result = lookup(input, square_root);
    state.registers.get_mut(vd).set_lane(de, result as u16);
    state.divide.div_out = (result >> 16) as u16;
    state.divide.double_precision = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VectorRegister;

    fn with_lane(value: u16) -> VectorState {
        let mut state = VectorState::default();
        state.registers.set(2, VectorRegister([value; 8]));
        state
    }

    #[test]
    fn rom_halves() {
        assert_eq!(DIVIDE_ROM[0], 0xFFFF);
        assert_eq!(DIVIDE_ROM[1], 0xFF00);
        assert_eq!(DIVIDE_ROM[4], 0xFC07);
        assert!(DIVIDE_ROM[HALF..].iter().any(|&v| v != 0));
    }

    #[test]
    fn inverse_sqrt_rom_entries() {
        assert_eq!(DIVIDE_ROM[HALF], 0x6A09);
        assert_eq!(DIVIDE_ROM[HALF + 1], 0xFFFF);
        assert_eq!(DIVIDE_ROM[HALF + 2], 0x6955);
        assert_eq!(DIVIDE_ROM[HALF + 3], 0xFF00);
        assert_eq!(DIVIDE_ROM[HALF + 255], 0xA297);
        assert_eq!(DIVIDE_ROM[HALF + 256], 0x279A);
        assert_eq!(DIVIDE_ROM[HALF + 510], 0x0040);
        assert_eq!(DIVIDE_ROM[HALF + 511], 0x6A64);
    }

    #[test]
    fn inverse_sqrt_known_values() {
        assert_eq!(lookup(1, true), 0x7FFF_C000);
        assert_eq!(lookup(2, true), 0x5A82_4000);
        assert_eq!(lookup(4, true), 0x3FFF_E000);
        assert_eq!(lookup(-4, true), 0xC000_1FFF);
        assert_eq!(lookup(0x1_0000, true), 0x007F_FFC0);
    }

    #[test]
    fn vrsq_then_vrsqh_reads_both_halves() {
        let mut state = with_lane(2);
        execute(&mut state, DivideOp::InverseSqrt, 1, 0, 2, 0);
        execute(&mut state, DivideOp::InverseSqrtHigh, 1, 1, 2, 0);
        assert_eq!(state.registers.get(1).lane(0), 0x4000);
        assert_eq!(state.registers.get(1).lane(1), 0x5A82);
    }

    #[test]
    fn vrsql_uses_latched_high_half() {
        let mut state = with_lane(1);
        execute(&mut state, DivideOp::InverseSqrtHigh, 1, 0, 2, 0);
        state.registers.set(2, VectorRegister([0; 8]));
        execute(&mut state, DivideOp::InverseSqrtLow, 1, 2, 2, 0);
        assert_eq!(state.registers.get(1).lane(2), 0xFFC0);
        assert_eq!(state.divide.div_out, 0x007F);
        assert!(!state.divide.double_precision);
    }

    #[test]
    fn special_inputs() {
        assert_eq!(lookup(0, false), 0x7FFF_FFFF);
        assert_eq!(lookup(0, true), 0x7FFF_FFFF);
        assert_eq!(lookup(-32768, false), 0xFFFF_0000);
        assert_eq!(lookup(-32768, true), 0xFFFF_0000);
    }

    #[test]
    fn reciprocal_of_two_halves_one() {
        let one = lookup(1, false);
        let two = lookup(2, false);
        assert_eq!(two, one >> 1);
        assert_eq!(lookup(-2, false), !two);
    }

    #[test]
    fn vrcp_zero_ignores_prior_double_state() {
        let mut state = with_lane(0);
        state.divide.double_precision = true;
        state.divide.div_in = 0x1234;
        execute(&mut state, DivideOp::Reciprocal, 1, 3, 2, 0);
        assert_eq!(state.registers.get(1).lane(3), 0xFFFF);
        assert_eq!(state.divide.div_out, 0x7FFF);
        assert!(!state.divide.double_precision);
        assert_eq!(state.acc.low, [0; 8]);
    }

    #[test]
    fn high_then_low_merges_double_input() {
        let mut state = with_lane(0xFFFF);
        execute(&mut state, DivideOp::ReciprocalHigh, 1, 0, 2, 0);
        assert!(state.divide.double_precision);
        assert_eq!(state.divide.div_in, 0xFFFF);
        state.registers.set(2, VectorRegister([0x8000; 8]));
        execute(&mut state, DivideOp::ReciprocalLow, 1, 1, 2, 0);
        // 0xFFFF_8000 is treated like -32768.
        assert_eq!(state.registers.get(1).lane(1), 0x0000);
        assert_eq!(state.divide.div_out, 0xFFFF);
        assert!(!state.divide.double_precision);
    }

    #[test]
    fn vmov_copies_one_lane() {
        let mut state = VectorState::default();
        state.registers.set(2, VectorRegister([1, 2, 3, 4, 5, 6, 7, 8]));
        execute(&mut state, DivideOp::Move, 1, 5, 2, 0);
        assert_eq!(state.registers.get(1).lanes(), [0, 0, 0, 0, 0, 6, 0, 0]);
    }
}
