/// Primary opcode field (bits 31..26) values the RSP implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum PrimaryOpcode {
    Special = 0,
    Regimm = 1,
    J = 2,
    Jal = 3,
    Beq = 4,
    Bne = 5,
    Blez = 6,
    Bgtz = 7,
    Addi = 8,
    Addiu = 9,
    Slti = 10,
    Sltiu = 11,
    Andi = 12,
    Ori = 13,
    Xori = 14,
    Lui = 15,
    Cop0 = 16,
    Cop2 = 18,
    Lb = 32,
    Lh = 33,
    Lw = 35,
    Lbu = 36,
    Lhu = 37,
    Sb = 40,
    Sh = 41,
    Sw = 43,
    Lwc2 = 50,
    Swc2 = 58,
}

impl PrimaryOpcode {
    /// Converts a six-bit opcode field; unassigned values are reserved.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Special),
            1 => Some(Self::Regimm),
            2 => Some(Self::J),
            3 => Some(Self::Jal),
            4 => Some(Self::Beq),
            5 => Some(Self::Bne),
            6 => Some(Self::Blez),
            7 => Some(Self::Bgtz),
            8 => Some(Self::Addi),
            9 => Some(Self::Addiu),
            10 => Some(Self::Slti),
            11 => Some(Self::Sltiu),
            12 => Some(Self::Andi),
            13 => Some(Self::Ori),
            14 => Some(Self::Xori),
            15 => Some(Self::Lui),
            16 => Some(Self::Cop0),
            18 => Some(Self::Cop2),
            32 => Some(Self::Lb),
            33 => Some(Self::Lh),
            35 => Some(Self::Lw),
            36 => Some(Self::Lbu),
            37 => Some(Self::Lhu),
            40 => Some(Self::Sb),
            41 => Some(Self::Sh),
            43 => Some(Self::Sw),
            50 => Some(Self::Lwc2),
            58 => Some(Self::Swc2),
            _ => None,
        }
    }
}

/// SPECIAL function field (bits 5..0) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum SpecialFunction {
    Sll = 0,
    Srl = 2,
    Sra = 3,
    Sllv = 4,
    Srlv = 6,
    Srav = 7,
    Jr = 8,
    Jalr = 9,
    Break = 13,
    Add = 32,
    Addu = 33,
    Sub = 34,
    Subu = 35,
    And = 36,
    Or = 37,
    Xor = 38,
    Nor = 39,
    Slt = 42,
    Sltu = 43,
}

impl SpecialFunction {
    /// Converts a six-bit function field.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Sll),
            2 => Some(Self::Srl),
            3 => Some(Self::Sra),
            4 => Some(Self::Sllv),
            6 => Some(Self::Srlv),
            7 => Some(Self::Srav),
            8 => Some(Self::Jr),
            9 => Some(Self::Jalr),
            13 => Some(Self::Break),
            32 => Some(Self::Add),
            33 => Some(Self::Addu),
            34 => Some(Self::Sub),
            35 => Some(Self::Subu),
            36 => Some(Self::And),
            37 => Some(Self::Or),
            38 => Some(Self::Xor),
            39 => Some(Self::Nor),
            42 => Some(Self::Slt),
            43 => Some(Self::Sltu),
            _ => None,
        }
    }
}

/// REGIMM `rt` field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum RegimmFunction {
    Bltz = 0,
    Bgez = 1,
    Bltzal = 16,
    Bgezal = 17,
}

impl RegimmFunction {
    /// Converts a five-bit `rt` field.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Bltz),
            1 => Some(Self::Bgez),
            16 => Some(Self::Bltzal),
            17 => Some(Self::Bgezal),
            _ => None,
        }
    }
}

/// `rs` field values of the COP0 and COP2 move forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum CoprocessorMove {
    MoveFrom = 0,
    ControlFrom = 2,
    MoveTo = 4,
    ControlTo = 6,
}

impl CoprocessorMove {
    /// Converts an `rs` field below 16.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::MoveFrom),
            2 => Some(Self::ControlFrom),
            4 => Some(Self::MoveTo),
            6 => Some(Self::ControlTo),
            _ => None,
        }
    }
}

/// COP2 vector computational opcodes, keyed by the six-bit function field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum VectorOpcode {
    Vmulf,
    Vmulu,
    Vrndp,
    Vmulq,
    Vmudl,
    Vmudm,
    Vmudn,
    Vmudh,
    Vmacf,
    Vmacu,
    Vrndn,
    Vmacq,
    Vmadl,
    Vmadm,
    Vmadn,
    Vmadh,
    Vadd,
    Vsub,
    Vabs,
    Vaddc,
    Vsubc,
    Vsar,
    Vlt,
    Veq,
    Vne,
    Vge,
    Vcl,
    Vch,
    Vcr,
    Vmrg,
    Vand,
    Vnand,
    Vor,
    Vnor,
    Vxor,
    Vnxor,
    Vrcp,
    Vrcpl,
    Vrcph,
    Vmov,
    Vrsq,
    Vrsql,
    Vrsqh,
    Vnop,
    Vnull,
}

/// Function field assignment for every vector opcode.
///
/// Any function value not present here is reserved.
pub const VECTOR_OPCODE_TABLE: &[(u8, VectorOpcode, &str)] = &[
    (0, VectorOpcode::Vmulf, "vmulf"),
    (1, VectorOpcode::Vmulu, "vmulu"),
    (2, VectorOpcode::Vrndp, "vrndp"),
    (3, VectorOpcode::Vmulq, "vmulq"),
    (4, VectorOpcode::Vmudl, "vmudl"),
    (5, VectorOpcode::Vmudm, "vmudm"),
    (6, VectorOpcode::Vmudn, "vmudn"),
    (7, VectorOpcode::Vmudh, "vmudh"),
    (8, VectorOpcode::Vmacf, "vmacf"),
    (9, VectorOpcode::Vmacu, "vmacu"),
    (10, VectorOpcode::Vrndn, "vrndn"),
    (11, VectorOpcode::Vmacq, "vmacq"),
    (12, VectorOpcode::Vmadl, "vmadl"),
    (13, VectorOpcode::Vmadm, "vmadm"),
    (14, VectorOpcode::Vmadn, "vmadn"),
    (15, VectorOpcode::Vmadh, "vmadh"),
    (16, VectorOpcode::Vadd, "vadd"),
    (17, VectorOpcode::Vsub, "vsub"),
    (19, VectorOpcode::Vabs, "vabs"),
    (20, VectorOpcode::Vaddc, "vaddc"),
    (21, VectorOpcode::Vsubc, "vsubc"),
    (29, VectorOpcode::Vsar, "vsar"),
    (32, VectorOpcode::Vlt, "vlt"),
    (33, VectorOpcode::Veq, "veq"),
    (34, VectorOpcode::Vne, "vne"),
    (35, VectorOpcode::Vge, "vge"),
    (36, VectorOpcode::Vcl, "vcl"),
    (37, VectorOpcode::Vch, "vch"),
    (38, VectorOpcode::Vcr, "vcr"),
    (39, VectorOpcode::Vmrg, "vmrg"),
    (40, VectorOpcode::Vand, "vand"),
    (41, VectorOpcode::Vnand, "vnand"),
    (42, VectorOpcode::Vor, "vor"),
    (43, VectorOpcode::Vnor, "vnor"),
    (44, VectorOpcode::Vxor, "vxor"),
    (45, VectorOpcode::Vnxor, "vnxor"),
    (48, VectorOpcode::Vrcp, "vrcp"),
    (49, VectorOpcode::Vrcpl, "vrcpl"),
    (50, VectorOpcode::Vrcph, "vrcph"),
    (51, VectorOpcode::Vmov, "vmov"),
    (52, VectorOpcode::Vrsq, "vrsq"),
    (53, VectorOpcode::Vrsql, "vrsql"),
    (54, VectorOpcode::Vrsqh, "vrsqh"),
    (55, VectorOpcode::Vnop, "vnop"),
    (63, VectorOpcode::Vnull, "vnull"),
];

impl VectorOpcode {
    /// Looks up a function field; `None` means reserved.
    #[must_use]
    pub fn from_funct(funct: u8) -> Option<Self> {
        VECTOR_OPCODE_TABLE
            .iter()
            .find(|(bits, _, _)| *bits == funct & 0x3F)
            .map(|(_, op, _)| *op)
    }

    /// Function field for this opcode.
    #[must_use]
    pub fn funct(self) -> u8 {
        VECTOR_OPCODE_TABLE
            .iter()
            .find(|(_, op, _)| *op == self)
            .map_or(0, |(bits, _, _)| *bits)
    }

    /// Lower-case assembler mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        VECTOR_OPCODE_TABLE
            .iter()
            .find(|(_, op, _)| *op == self)
            .map_or("", |(_, _, name)| *name)
    }

    /// `true` for the reciprocal group, which addresses single lanes.
    #[must_use]
    pub const fn is_single_lane(self) -> bool {
        matches!(
            self,
            Self::Vrcp
                | Self::Vrcpl
                | Self::Vrcph
                | Self::Vmov
                | Self::Vrsq
                | Self::Vrsql
                | Self::Vrsqh
        )
    }
}

/// Vector load/store opcodes (`rd` field of LWC2/SWC2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum VectorMemoryOpcode {
    Lbv,
    Lsv,
    Llv,
    Ldv,
    Lqv,
    Lrv,
    Lpv,
    Luv,
    Lhv,
    Lfv,
    Ltv,
    Sbv,
    Ssv,
    Slv,
    Sdv,
    Sqv,
    Srv,
    Spv,
    Suv,
    Shv,
    Sfv,
    Swv,
    Stv,
}

/// `(is_store, rd field, opcode, mnemonic)` for every vector transfer.
pub const VECTOR_MEMORY_TABLE: &[(bool, u8, VectorMemoryOpcode, &str)] = &[
    (false, 0x00, VectorMemoryOpcode::Lbv, "lbv"),
    (false, 0x01, VectorMemoryOpcode::Lsv, "lsv"),
    (false, 0x02, VectorMemoryOpcode::Llv, "llv"),
    (false, 0x03, VectorMemoryOpcode::Ldv, "ldv"),
    (false, 0x04, VectorMemoryOpcode::Lqv, "lqv"),
    (false, 0x05, VectorMemoryOpcode::Lrv, "lrv"),
    (false, 0x06, VectorMemoryOpcode::Lpv, "lpv"),
    (false, 0x07, VectorMemoryOpcode::Luv, "luv"),
    (false, 0x08, VectorMemoryOpcode::Lhv, "lhv"),
    (false, 0x09, VectorMemoryOpcode::Lfv, "lfv"),
    (false, 0x0B, VectorMemoryOpcode::Ltv, "ltv"),
    (true, 0x00, VectorMemoryOpcode::Sbv, "sbv"),
    (true, 0x01, VectorMemoryOpcode::Ssv, "ssv"),
    (true, 0x02, VectorMemoryOpcode::Slv, "slv"),
    (true, 0x03, VectorMemoryOpcode::Sdv, "sdv"),
    (true, 0x04, VectorMemoryOpcode::Sqv, "sqv"),
    (true, 0x05, VectorMemoryOpcode::Srv, "srv"),
    (true, 0x06, VectorMemoryOpcode::Spv, "spv"),
    (true, 0x07, VectorMemoryOpcode::Suv, "suv"),
    (true, 0x08, VectorMemoryOpcode::Shv, "shv"),
    (true, 0x09, VectorMemoryOpcode::Sfv, "sfv"),
    (true, 0x0A, VectorMemoryOpcode::Swv, "swv"),
    (true, 0x0B, VectorMemoryOpcode::Stv, "stv"),
];

impl VectorMemoryOpcode {
    /// Looks up an LWC2 (`store == false`) or SWC2 `rd` field.
    #[must_use]
    pub fn from_bits(store: bool, bits: u8) -> Option<Self> {
        VECTOR_MEMORY_TABLE
            .iter()
            .find(|(is_store, field, _, _)| *is_store == store && *field == bits)
            .map(|(_, _, op, _)| *op)
    }

    /// `(is_store, rd field)` for this opcode.
    #[must_use]
    pub fn encoding(self) -> (bool, u8) {
        VECTOR_MEMORY_TABLE
            .iter()
            .find(|(_, _, op, _)| *op == self)
            .map_or((false, 0), |(store, bits, _, _)| (*store, *bits))
    }

    /// Lower-case assembler mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        VECTOR_MEMORY_TABLE
            .iter()
            .find(|(_, _, op, _)| *op == self)
            .map_or("", |(_, _, _, name)| *name)
    }

    /// Left shift applied to the seven-bit offset field.
    #[must_use]
    pub const fn offset_shift(self) -> u32 {
        match self {
            Self::Lbv | Self::Sbv => 0,
            Self::Lsv | Self::Ssv => 1,
            Self::Llv | Self::Slv => 2,
            Self::Ldv | Self::Sdv | Self::Lpv | Self::Spv | Self::Luv | Self::Suv => 3,
            Self::Lqv
            | Self::Sqv
            | Self::Lrv
            | Self::Srv
            | Self::Lhv
            | Self::Shv
            | Self::Lfv
            | Self::Sfv
            | Self::Ltv
            | Self::Stv
            | Self::Swv => 4,
        }
    }
}

/// Sign-extends a seven-bit vector transfer offset.
#[must_use]
pub const fn sign_extend_offset7(bits: u32) -> i32 {
    (((bits & 0x7F) << 25) as i32) >> 25
}
