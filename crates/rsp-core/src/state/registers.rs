/// Number of scalar general-purpose registers.
pub const SCALAR_REGISTER_COUNT: usize = 32;

/// Scalar register identifier (`$0..$31`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ScalarRegister(u8);

impl ScalarRegister {
    /// Hard-wired zero register.
    pub const ZERO: Self = Self(0);
    /// Link register written by `JAL` and the linking branches.
    pub const RA: Self = Self(31);

    /// Builds a register from an index, rejecting values above 31.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < SCALAR_REGISTER_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Builds a register from the low five bits of an instruction field.
    #[must_use]
    pub const fn from_field(bits: u32) -> Self {
        Self((bits & 0x1F) as u8)
    }

    /// Returns the array index (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw register number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }
}

/// Scalar register file. Register 0 always reads zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ScalarRegisters {
    gpr: [u32; SCALAR_REGISTER_COUNT],
}

impl ScalarRegisters {
    /// Creates a zeroed register file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one register.
    #[must_use]
    pub const fn get(&self, reg: ScalarRegister) -> u32 {
        self.gpr[reg.index()]
    }

    /// Writes one register; register 0 is forced back to zero.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set(&mut self, reg: ScalarRegister, value: u32) {
        self.gpr[reg.index()] = value;
        self.gpr[0] = 0;
    }

    /// Returns all registers in index order.
    #[must_use]
    pub const fn as_array(&self) -> &[u32; SCALAR_REGISTER_COUNT] {
        &self.gpr
    }
}
