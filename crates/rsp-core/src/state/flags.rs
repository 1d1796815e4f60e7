use super::vector::LANE_COUNT;

/// Eight per-lane booleans; bit `i` of the packed form is lane `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LaneMask(pub [bool; LANE_COUNT]);

impl LaneMask {
    /// All lanes clear.
    pub const NONE: Self = Self([false; LANE_COUNT]);
    /// All lanes set.
    pub const ALL: Self = Self([true; LANE_COUNT]);

    /// Unpacks eight bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        let mut out = [false; LANE_COUNT];
        let mut lane = 0;
        while lane < LANE_COUNT {
            out[lane] = bits & (1 << lane) != 0;
            lane += 1;
        }
        Self(out)
    }

    /// Packs into eight bits.
    #[must_use]
    pub const fn to_bits(self) -> u8 {
        let mut bits = 0;
        let mut lane = 0;
        while lane < LANE_COUNT {
            if self.0[lane] {
                bits |= 1 << lane;
            }
            lane += 1;
        }
        bits
    }

    /// Reads one lane.
    #[must_use]
    pub const fn get(self, lane: usize) -> bool {
        self.0[lane % LANE_COUNT]
    }
}

/// VCO, VCC and VCE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct VectorFlags {
    /// VCO low byte.
    pub carry: LaneMask,
    /// VCO high byte.
    pub not_equal: LaneMask,
    /// VCC low byte.
    pub compare: LaneMask,
    /// VCC high byte.
    pub clip: LaneMask,
    /// VCE.
    pub extension: LaneMask,
}

const fn pack_pair(low: LaneMask, high: LaneMask) -> u16 {
    ((high.to_bits() as u16) << 8) | low.to_bits() as u16
}

impl VectorFlags {
    /// Packed VCO.
    #[must_use]
    pub const fn vco(&self) -> u16 {
        pack_pair(self.carry, self.not_equal)
    }

    /// Packed VCC.
    #[must_use]
    pub const fn vcc(&self) -> u16 {
        pack_pair(self.compare, self.clip)
    }

    /// Packed VCE.
    #[must_use]
    pub const fn vce(&self) -> u8 {
        self.extension.to_bits()
    }

    /// Unpacks VCO.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_vco(&mut self, value: u16) {
        self.carry = LaneMask::from_bits(value as u8);
        self.not_equal = LaneMask::from_bits((value >> 8) as u8);
    }

    /// Unpacks VCC.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_vcc(&mut self, value: u16) {
        self.compare = LaneMask::from_bits(value as u8);
        self.clip = LaneMask::from_bits((value >> 8) as u8);
    }

    /// Unpacks VCE.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_vce(&mut self, value: u8) {
        self.extension = LaneMask::from_bits(value);
    }

    /// Clears both VCO halves.
    #[allow(clippy::missing_const_for_fn)]
    pub fn clear_vco(&mut self) {
        self.carry = LaneMask::NONE;
        self.not_equal = LaneMask::NONE;
    }

    /// CFC2 view: `rd & 3` selects VCO, VCC, VCE, VCE.
    #[must_use]
    pub const fn read_control(&self, index: u8) -> u16 {
        match index & 3 {
            0 => self.vco(),
            1 => self.vcc(),
            _ => self.vce() as u16,
        }
    }

    /// CTC2 view: writes the low 16 bits (VCE keeps the low 8).
    #[allow(clippy::missing_const_for_fn)]
    pub fn write_control(&mut self, index: u8, value: u16) {
        match index & 3 {
            0 => self.set_vco(value),
            1 => self.set_vcc(value),
            _ => self.set_vce(value as u8),
        }
    }
}
