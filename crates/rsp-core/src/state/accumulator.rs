use super::vector::{Lanes, LANE_COUNT};

/// 8 × 48-bit accumulator held as three 16-bit slices per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Accumulator {
    /// Bits 47..32 of each lane.
    pub high: Lanes,
    /// Bits 31..16 of each lane.
    pub mid: Lanes,
    /// Bits 15..0 of each lane.
    pub low: Lanes,
}

impl Accumulator {
    /// Returns lane `index` as a sign-extended 48-bit value.
    #[must_use]
    pub const fn lane(&self, index: usize) -> i64 {
        let index = index % LANE_COUNT;
        let raw = ((self.high[index] as u64) << 32)
            | ((self.mid[index] as u64) << 16)
            | self.low[index] as u64;
        ((raw << 16) as i64) >> 16
    }

    /// Stores the low 48 bits of `value` into lane `index`.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_lane(&mut self, index: usize, value: i64) {
        let index = index % LANE_COUNT;
        self.high[index] = (value >> 32) as u16;
        self.mid[index] = (value >> 16) as u16;
        self.low[index] = value as u16;
    }

    /// Signed 32-bit `high:mid` pair of lane `index`.
    #[must_use]
    pub const fn high_mid(&self, index: usize) -> i32 {
        let index = index % LANE_COUNT;
        (((self.high[index] as u32) << 16) | self.mid[index] as u32) as i32
    }
}
