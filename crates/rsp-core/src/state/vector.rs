/// Lanes per vector register.
pub const LANE_COUNT: usize = 8;
/// Number of vector registers.
pub const VECTOR_REGISTER_COUNT: usize = 32;
/// Bytes per vector register.
pub const VECTOR_BYTES: usize = 16;

/// Eight 16-bit lanes, lane 0 first.
pub type Lanes = [u16; LANE_COUNT];

/// Source lane for each destination lane, per element selector `0..=15`.
pub const ELEMENT_BROADCAST: [[u8; LANE_COUNT]; 16] = [
    [0, 1, 2, 3, 4, 5, 6, 7],
    [0, 1, 2, 3, 4, 5, 6, 7],
    [0, 0, 2, 2, 4, 4, 6, 6],
    [1, 1, 3, 3, 5, 5, 7, 7],
    [0, 0, 0, 0, 4, 4, 4, 4],
    [1, 1, 1, 1, 5, 5, 5, 5],
    [2, 2, 2, 2, 6, 6, 6, 6],
    [3, 3, 3, 3, 7, 7, 7, 7],
    [0; LANE_COUNT],
    [1; LANE_COUNT],
    [2; LANE_COUNT],
    [3; LANE_COUNT],
    [4; LANE_COUNT],
    [5; LANE_COUNT],
    [6; LANE_COUNT],
    [7; LANE_COUNT],
];

/// One 128-bit vector register.
///
/// The byte view is big-endian: byte `2 * i` is the high byte of lane `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VectorRegister(pub Lanes);

impl VectorRegister {
    /// All lanes zero.
    pub const ZERO: Self = Self([0; LANE_COUNT]);

    /// Returns the lanes.
    #[must_use]
    pub const fn lanes(self) -> Lanes {
        self.0
    }

    /// Reads one lane; the index wraps modulo 8.
    #[must_use]
    pub const fn lane(self, index: usize) -> u16 {
        self.0[index % LANE_COUNT]
    }

    /// Writes one lane; the index wraps modulo 8.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_lane(&mut self, index: usize, value: u16) {
        self.0[index % LANE_COUNT] = value;
    }

    /// Reads byte `index` of the big-endian view; the index wraps modulo 16.
    #[must_use]
    pub const fn byte(self, index: usize) -> u8 {
        let index = index % VECTOR_BYTES;
        let lane = self.0[index >> 1];
        if index & 1 == 0 {
            (lane >> 8) as u8
        } else {
            lane as u8
        }
    }

    /// Writes byte `index` of the big-endian view. Indices past 15 are
    /// dropped, matching loads that run off the end of the register.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_byte(&mut self, index: usize, value: u8) {
        if index >= VECTOR_BYTES {
            return;
        }
        let lane = &mut self.0[index >> 1];
        *lane = if index & 1 == 0 {
            (*lane & 0x00FF) | (u16::from(value) << 8)
        } else {
            (*lane & 0xFF00) | u16::from(value)
        };
    }

    /// Returns the element-selected broadcast of this register.
    #[must_use]
    pub const fn broadcast(self, element: u8) -> Lanes {
        let pattern = ELEMENT_BROADCAST[(element & 0xF) as usize];
        let mut out = [0; LANE_COUNT];
        let mut lane = 0;
        while lane < LANE_COUNT {
            out[lane] = self.0[pattern[lane] as usize];
            lane += 1;
        }
        out
    }

    /// Builds a register from signed lane values.
    #[must_use]
    pub const fn from_i16(lanes: [i16; LANE_COUNT]) -> Self {
        let mut out = [0; LANE_COUNT];
        let mut lane = 0;
        while lane < LANE_COUNT {
            out[lane] = lanes[lane] as u16;
            lane += 1;
        }
        Self(out)
    }

    /// Returns the lanes as signed values.
    #[must_use]
    pub const fn to_i16(self) -> [i16; LANE_COUNT] {
        let mut out = [0; LANE_COUNT];
        let mut lane = 0;
        while lane < LANE_COUNT {
            out[lane] = self.0[lane] as i16;
            lane += 1;
        }
        out
    }
}

/// The 32-entry vector register file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VectorFile {
    regs: [VectorRegister; VECTOR_REGISTER_COUNT],
}

impl Default for VectorFile {
    fn default() -> Self {
        Self {
            regs: [VectorRegister::ZERO; VECTOR_REGISTER_COUNT],
        }
    }
}

impl VectorFile {
    /// Reads register `index & 31`.
    #[must_use]
    pub const fn get(&self, index: u8) -> VectorRegister {
        self.regs[(index & 0x1F) as usize]
    }

    /// Returns a mutable handle to register `index & 31`.
    #[allow(clippy::missing_const_for_fn)]
    pub fn get_mut(&mut self, index: u8) -> &mut VectorRegister {
        &mut self.regs[(index & 0x1F) as usize]
    }

    /// Replaces register `index & 31`.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set(&mut self, index: u8, value: VectorRegister) {
        self.regs[(index & 0x1F) as usize] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_view_is_big_endian_per_lane() {
        let mut reg = VectorRegister([0x0102, 0x0304, 0, 0, 0, 0, 0, 0xEEFF]);
        assert_eq!(reg.byte(0), 0x01);
        assert_eq!(reg.byte(1), 0x02);
        assert_eq!(reg.byte(3), 0x04);
        assert_eq!(reg.byte(15), 0xFF);
        assert_eq!(reg.byte(16), 0x01, "reads wrap");
        reg.set_byte(2, 0xAA);
        assert_eq!(reg.lane(1), 0xAA04);
        reg.set_byte(16, 0x55);
        assert_eq!(reg.lane(0), 0x0102, "writes past 15 are dropped");
    }

    #[test]
    fn broadcast_patterns() {
        let reg = VectorRegister([10, 11, 12, 13, 14, 15, 16, 17]);
        assert_eq!(reg.broadcast(0), reg.lanes());
        assert_eq!(reg.broadcast(2), [10, 10, 12, 12, 14, 14, 16, 16]);
        assert_eq!(reg.broadcast(3), [11, 11, 13, 13, 15, 15, 17, 17]);
        assert_eq!(reg.broadcast(5), [11, 11, 11, 11, 15, 15, 15, 15]);
        assert_eq!(reg.broadcast(13), [15; LANE_COUNT]);
    }

    #[test]
    fn file_index_wraps() {
        let mut file = VectorFile::default();
        file.set(33, VectorRegister([1; LANE_COUNT]));
        assert_eq!(file.get(1).lane(3), 1);
    }
}
