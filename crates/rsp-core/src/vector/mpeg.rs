//! MPEG helper opcodes: quantized multiply and conditional rounding.
//!
//! These run lane by lane; no microcode hot path depends on them.

use crate::state::{Accumulator, Lanes, LANE_COUNT};

#[allow(clippy::cast_possible_truncation)]
fn clamp_i16(value: i64) -> u16 {
    value.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16 as u16
}

fn quantize(product: i32) -> u16 {
    clamp_i16(i64::from(product >> 1)) & !15
}

#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub fn vmulq(acc: &mut Accumulator, vs: Lanes, vte: Lanes) -> Lanes {
    let mut vd = [0; LANE_COUNT];
    for lane in 0..LANE_COUNT {
        let mut product = i32::from(vs[lane] as i16) * i32::from(vte[lane] as i16);
        if product < 0 {
            product += 31;
        }
        acc.high[lane] = (product >> 16) as u16;
        acc.mid[lane] = product as u16;
        acc.low[lane] = 0;
        vd[lane] = quantize(product);
    }
    vd
}

#[allow(clippy::cast_possible_truncation)]
pub fn vmacq(acc: &mut Accumulator) -> Lanes {
    let mut vd = [0; LANE_COUNT];
    for lane in 0..LANE_COUNT {
        let mut product = acc.high_mid(lane);
        if product & (1 << 5) == 0 {
            if product < 0 {
                product = product.wrapping_add(32);
            } else if product >= 32 {
                product -= 32;
            }
        }
        acc.high[lane] = (product >> 16) as u16;
        acc.mid[lane] = product as u16;
        vd[lane] = quantize(product);
    }
    vd
}

/// `VRNDP` when `positive`, else `VRNDN`. `vs` is the register index: odd
/// registers round at bit 16.
#[allow(clippy::cast_possible_wrap)]
pub fn round(acc: &mut Accumulator, positive: bool, vs: u8, vte: Lanes) -> Lanes {
    const LIMIT: i64 = 1 << 47;
    let mut vd = [0; LANE_COUNT];
    for lane in 0..LANE_COUNT {
        let mut product = i64::from(vte[lane] as i16);
        if vs & 1 != 0 {
            product <<= 16;
        }
        let mut value = acc.lane(lane);
        if (positive && value >= 0) || (!positive && value < 0) {
            // Wrap to 48 bits, sign-extended.
            value = ((value + product + LIMIT) & ((LIMIT << 1) - 1)) - LIMIT;
            acc.set_lane(lane, value);
        }
        vd[lane] = clamp_i16(value >> 16);
    }
    vd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vmulq_rounds_negative_products() {
        let mut acc = Accumulator::default();
        let vd = vmulq(&mut acc, [0x0100, 0xFF00, 0, 0, 0, 0, 0, 0], [0x0100; 8]);
        // 256 * 256 = 0x10000.
        assert_eq!(acc.high[0], 1);
        assert_eq!(acc.mid[0], 0);
        assert_eq!(vd[0], 0x7FF0);
        // -65536 + 31 = -65505.
        assert_eq!(acc.high_mid(1), -65505);
        assert_eq!(vd[1], 0x8000);
        assert_eq!(acc.low, [0; 8]);
    }

    #[test]
    fn vmacq_steps_toward_zero_when_bit5_clear() {
        let mut acc = Accumulator::default();
        acc.mid[0] = 64;
        acc.mid[1] = 0x20;
        acc.high[2] = 0xFFFF;
        acc.mid[2] = 0xFF00;
        let vd = vmacq(&mut acc);
        assert_eq!(acc.mid[0], 32);
        assert_eq!(vd[0], 16);
        assert_eq!(acc.mid[1], 0x20, "bit 5 set leaves value alone");
        assert_eq!(acc.high_mid(2), -256 + 32);
    }

    #[test]
    fn round_respects_sign_condition() {
        let mut acc = Accumulator::default();
        acc.set_lane(0, 0x1_0000);
        acc.set_lane(1, -0x1_0000);
        let vd = round(&mut acc, true, 0, [1; 8]);
        assert_eq!(acc.lane(0), 0x1_0001);
        assert_eq!(acc.lane(1), -0x1_0000, "negative lane untouched by VRNDP");
        assert_eq!(vd[0], 1);
        assert_eq!(vd[1], 0xFFFF);

        let vd = round(&mut acc, false, 1, [1; 8]);
        assert_eq!(acc.lane(1), 0, "odd vs shifts the operand by 16");
        assert_eq!(vd[1], 0);
        assert_eq!(acc.lane(0), 0x1_0001);
    }

    #[test]
    fn round_clamps_output() {
        let mut acc = Accumulator::default();
        acc.set_lane(0, 0x7FFF_0000_0000);
        let vd = round(&mut acc, true, 0, [0; 8]);
        assert_eq!(vd[0], 0x7FFF);
    }
}
