//! Instruction decoder for the RSP scalar unit and its coprocessors.
//!
//! Every 32-bit word decodes to exactly one [`DecodedInstruction`]; words
//! with no defined meaning decode to a reserved variant rather than an
//! error, since the hardware treats them as no-ops.

#![allow(missing_docs)]

use crate::encoding::{
    sign_extend_offset7, CoprocessorMove, PrimaryOpcode, RegimmFunction, SpecialFunction,
    VectorMemoryOpcode, VectorOpcode,
};
use crate::state::ScalarRegister;

/// Field accessors over a raw instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionWord(pub u32);

impl InstructionWord {
    #[must_use]
    pub const fn opcode(self) -> u8 {
        (self.0 >> 26) as u8
    }

    #[must_use]
    pub const fn rs(self) -> u8 {
        ((self.0 >> 21) & 0x1F) as u8
    }

    #[must_use]
    pub const fn rt(self) -> u8 {
        ((self.0 >> 16) & 0x1F) as u8
    }

    #[must_use]
    pub const fn rd(self) -> u8 {
        ((self.0 >> 11) & 0x1F) as u8
    }

    #[must_use]
    pub const fn sa(self) -> u8 {
        ((self.0 >> 6) & 0x1F) as u8
    }

    #[must_use]
    pub const fn funct(self) -> u8 {
        (self.0 & 0x3F) as u8
    }

    #[must_use]
    pub const fn imm16(self) -> u16 {
        self.0 as u16
    }

    #[must_use]
    pub const fn target26(self) -> u32 {
        self.0 & 0x03FF_FFFF
    }

    /// Element field of COP2 moves and vector transfers (bits 10..7).
    #[must_use]
    pub const fn move_element(self) -> u8 {
        ((self.0 >> 7) & 0xF) as u8
    }

    /// Raw seven-bit vector transfer offset.
    #[must_use]
    pub const fn offset7(self) -> u8 {
        (self.0 & 0x7F) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftKind {
    Left,
    RightLogical,
    RightArithmetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Nor,
    SetLessThan,
    SetLessThanUnsigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImmediateOp {
    Add,
    SetLessThan,
    SetLessThanUnsigned,
    And,
    Or,
    Xor,
    LoadUpper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchCondition {
    Equal,
    NotEqual,
    LessOrEqualZero,
    GreaterThanZero,
    LessThanZero,
    GreaterOrEqualZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadKind {
    Byte,
    ByteUnsigned,
    Half,
    HalfUnsigned,
    Word,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Byte,
    Half,
    Word,
}

/// Fully decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodedInstruction {
    Shift {
        kind: ShiftKind,
        rd: ScalarRegister,
        rt: ScalarRegister,
        amount: u8,
    },
    ShiftVariable {
        kind: ShiftKind,
        rd: ScalarRegister,
        rt: ScalarRegister,
        rs: ScalarRegister,
    },
    JumpRegister {
        rs: ScalarRegister,
        link: Option<ScalarRegister>,
    },
    Break,
    Alu {
        op: AluOp,
        rd: ScalarRegister,
        rs: ScalarRegister,
        rt: ScalarRegister,
    },
    Immediate {
        op: ImmediateOp,
        rt: ScalarRegister,
        rs: ScalarRegister,
        imm: u16,
    },
    Jump {
        link: bool,
        target: u32,
    },
    Branch {
        condition: BranchCondition,
        rs: ScalarRegister,
        rt: ScalarRegister,
        offset: i16,
        link: bool,
    },
    Load {
        kind: LoadKind,
        rt: ScalarRegister,
        base: ScalarRegister,
        offset: i16,
    },
    Store {
        kind: StoreKind,
        rt: ScalarRegister,
        base: ScalarRegister,
        offset: i16,
    },
    MoveFromControl {
        rt: ScalarRegister,
        rd: u8,
    },
    MoveToControl {
        rt: ScalarRegister,
        rd: u8,
    },
    MoveFromVector {
        rt: ScalarRegister,
        vs: u8,
        element: u8,
    },
    MoveToVector {
        rt: ScalarRegister,
        vs: u8,
        element: u8,
    },
    ControlFromVector {
        rt: ScalarRegister,
        rd: u8,
    },
    ControlToVector {
        rt: ScalarRegister,
        rd: u8,
    },
    Vector {
        op: VectorOpcode,
        vd: u8,
        vs: u8,
        vt: u8,
        element: u8,
    },
    ReservedVector {
        funct: u8,
        vd: u8,
        vs: u8,
        vt: u8,
        element: u8,
    },
    VectorTransfer {
        op: VectorMemoryOpcode,
        vt: u8,
        element: u8,
        base: ScalarRegister,
        offset: u8,
    },
    ReservedTransfer {
        store: bool,
        rd: u8,
        vt: u8,
        element: u8,
        base: ScalarRegister,
        offset: u8,
    },
    Reserved {
        word: u32,
    },
}

impl DecodedInstruction {
    /// Signed, unscaled offset of a vector transfer.
    #[must_use]
    pub const fn transfer_offset(offset: u8) -> i32 {
        sign_extend_offset7(offset as u32)
    }

    /// Re-encodes into a canonical 32-bit word.
    ///
    /// Fields the hardware ignores are encoded as zero, so decoding a
    /// non-canonical word and re-encoding it need not reproduce the input.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn encode(self) -> u32 {
        const fn r(reg: ScalarRegister) -> u32 {
            reg.number() as u32
        }
        const fn itype(op: PrimaryOpcode, rs: u32, rt: u32, imm: u16) -> u32 {
            ((op as u32) << 26) | (rs << 21) | (rt << 16) | imm as u32
        }
        const fn special(funct: SpecialFunction, rs: u32, rt: u32, rd: u32, sa: u32) -> u32 {
            (rs << 21) | (rt << 16) | (rd << 11) | (sa << 6) | funct as u32
        }
        const fn cop(op: PrimaryOpcode, mv: CoprocessorMove, rt: u32, rd: u32, low: u32) -> u32 {
            ((op as u32) << 26) | ((mv as u32) << 21) | (rt << 16) | (rd << 11) | low
        }

        match self {
            Self::Shift {
                kind,
                rd,
                rt,
                amount,
            } => {
                let funct = match kind {
                    ShiftKind::Left => SpecialFunction::Sll,
                    ShiftKind::RightLogical => SpecialFunction::Srl,
                    ShiftKind::RightArithmetic => SpecialFunction::Sra,
                };
                special(funct, 0, r(rt), r(rd), u32::from(amount & 0x1F))
            }
            Self::ShiftVariable { kind, rd, rt, rs } => {
                let funct = match kind {
                    ShiftKind::Left => SpecialFunction::Sllv,
                    ShiftKind::RightLogical => SpecialFunction::Srlv,
                    ShiftKind::RightArithmetic => SpecialFunction::Srav,
                };
                special(funct, r(rs), r(rt), r(rd), 0)
            }
            Self::JumpRegister { rs, link } => match link {
                None => special(SpecialFunction::Jr, r(rs), 0, 0, 0),
                Some(rd) => special(SpecialFunction::Jalr, r(rs), 0, r(rd), 0),
            },
            Self::Break => SpecialFunction::Break as u32,
            Self::Alu { op, rd, rs, rt } => {
                let funct = match op {
                    AluOp::Add => SpecialFunction::Addu,
                    AluOp::Sub => SpecialFunction::Subu,
                    AluOp::And => SpecialFunction::And,
                    AluOp::Or => SpecialFunction::Or,
                    AluOp::Xor => SpecialFunction::Xor,
                    AluOp::Nor => SpecialFunction::Nor,
                    AluOp::SetLessThan => SpecialFunction::Slt,
                    AluOp::SetLessThanUnsigned => SpecialFunction::Sltu,
                };
                special(funct, r(rs), r(rt), r(rd), 0)
            }
            Self::Immediate { op, rt, rs, imm } => {
                let opcode = match op {
                    ImmediateOp::Add => PrimaryOpcode::Addiu,
                    ImmediateOp::SetLessThan => PrimaryOpcode::Slti,
                    ImmediateOp::SetLessThanUnsigned => PrimaryOpcode::Sltiu,
                    ImmediateOp::And => PrimaryOpcode::Andi,
                    ImmediateOp::Or => PrimaryOpcode::Ori,
                    ImmediateOp::Xor => PrimaryOpcode::Xori,
                    ImmediateOp::LoadUpper => PrimaryOpcode::Lui,
                };
                itype(opcode, r(rs), r(rt), imm)
            }
            Self::Jump { link, target } => {
                let opcode = if link {
                    PrimaryOpcode::Jal
                } else {
                    PrimaryOpcode::J
                };
                ((opcode as u32) << 26) | ((target >> 2) & 0x03FF_FFFF)
            }
            Self::Branch {
                condition,
                rs,
                rt,
                offset,
                link,
            } => {
                let imm = offset as u16;
                let regimm = |function: RegimmFunction| {
                    itype(PrimaryOpcode::Regimm, r(rs), function as u32, imm)
                };
                match (condition, link) {
                    (BranchCondition::Equal, _) => itype(PrimaryOpcode::Beq, r(rs), r(rt), imm),
                    (BranchCondition::NotEqual, _) => {
                        itype(PrimaryOpcode::Bne, r(rs), r(rt), imm)
                    }
                    (BranchCondition::LessOrEqualZero, _) => {
                        itype(PrimaryOpcode::Blez, r(rs), 0, imm)
                    }
                    (BranchCondition::GreaterThanZero, _) => {
                        itype(PrimaryOpcode::Bgtz, r(rs), 0, imm)
                    }
                    (BranchCondition::LessThanZero, false) => regimm(RegimmFunction::Bltz),
                    (BranchCondition::GreaterOrEqualZero, false) => regimm(RegimmFunction::Bgez),
                    (BranchCondition::LessThanZero, true) => regimm(RegimmFunction::Bltzal),
                    (BranchCondition::GreaterOrEqualZero, true) => {
                        regimm(RegimmFunction::Bgezal)
                    }
                }
            }
            Self::Load {
                kind,
                rt,
                base,
                offset,
            } => {
                let opcode = match kind {
                    LoadKind::Byte => PrimaryOpcode::Lb,
                    LoadKind::ByteUnsigned => PrimaryOpcode::Lbu,
                    LoadKind::Half => PrimaryOpcode::Lh,
                    LoadKind::HalfUnsigned => PrimaryOpcode::Lhu,
                    LoadKind::Word => PrimaryOpcode::Lw,
                };
                itype(opcode, r(base), r(rt), offset as u16)
            }
            Self::Store {
                kind,
                rt,
                base,
                offset,
            } => {
                let opcode = match kind {
                    StoreKind::Byte => PrimaryOpcode::Sb,
                    StoreKind::Half => PrimaryOpcode::Sh,
                    StoreKind::Word => PrimaryOpcode::Sw,
                };
                itype(opcode, r(base), r(rt), offset as u16)
            }
            Self::MoveFromControl { rt, rd } => cop(
                PrimaryOpcode::Cop0,
                CoprocessorMove::MoveFrom,
                r(rt),
                u32::from(rd & 0x1F),
                0,
            ),
            Self::MoveToControl { rt, rd } => cop(
                PrimaryOpcode::Cop0,
                CoprocessorMove::MoveTo,
                r(rt),
                u32::from(rd & 0x1F),
                0,
            ),
            Self::MoveFromVector { rt, vs, element } => cop(
                PrimaryOpcode::Cop2,
                CoprocessorMove::MoveFrom,
                r(rt),
                u32::from(vs & 0x1F),
                u32::from(element & 0xF) << 7,
            ),
            Self::MoveToVector { rt, vs, element } => cop(
                PrimaryOpcode::Cop2,
                CoprocessorMove::MoveTo,
                r(rt),
                u32::from(vs & 0x1F),
                u32::from(element & 0xF) << 7,
            ),
            Self::ControlFromVector { rt, rd } => cop(
                PrimaryOpcode::Cop2,
                CoprocessorMove::ControlFrom,
                r(rt),
                u32::from(rd & 0x1F),
                0,
            ),
            Self::ControlToVector { rt, rd } => cop(
                PrimaryOpcode::Cop2,
                CoprocessorMove::ControlTo,
                r(rt),
                u32::from(rd & 0x1F),
                0,
            ),
            Self::Vector {
                op,
                vd,
                vs,
                vt,
                element,
            } => encode_vector(op.funct(), vd, vs, vt, element),
            Self::ReservedVector {
                funct,
                vd,
                vs,
                vt,
                element,
            } => encode_vector(funct, vd, vs, vt, element),
            Self::VectorTransfer {
                op,
                vt,
                element,
                base,
                offset,
            } => {
                let (store, rd) = op.encoding();
                encode_transfer(store, rd, vt, element, base, offset)
            }
            Self::ReservedTransfer {
                store,
                rd,
                vt,
                element,
                base,
                offset,
            } => encode_transfer(store, rd, vt, element, base, offset),
            Self::Reserved { word } => word,
        }
    }
}

const fn encode_vector(funct: u8, vd: u8, vs: u8, vt: u8, element: u8) -> u32 {
    ((PrimaryOpcode::Cop2 as u32) << 26)
        | (1 << 25)
        | (((element & 0xF) as u32) << 21)
        | (((vt & 0x1F) as u32) << 16)
        | (((vs & 0x1F) as u32) << 11)
        | (((vd & 0x1F) as u32) << 6)
        | (funct & 0x3F) as u32
}

const fn encode_transfer(
    store: bool,
    rd: u8,
    vt: u8,
    element: u8,
    base: ScalarRegister,
    offset: u8,
) -> u32 {
    let opcode = if store {
        PrimaryOpcode::Swc2
    } else {
        PrimaryOpcode::Lwc2
    };
    ((opcode as u32) << 26)
        | ((base.number() as u32) << 21)
        | (((vt & 0x1F) as u32) << 16)
        | (((rd & 0x1F) as u32) << 11)
        | (((element & 0xF) as u32) << 7)
        | (offset & 0x7F) as u32
}

/// Stateless decoder entry point.
pub struct Decoder;

impl Decoder {
    /// Decodes one instruction word. Never fails; unknown encodings map to
    /// a reserved variant.
    #[must_use]
    pub fn decode(word: u32) -> DecodedInstruction {
        let fields = InstructionWord(word);
        let rs = ScalarRegister::from_field(u32::from(fields.rs()));
        let rt = ScalarRegister::from_field(u32::from(fields.rt()));
        let rd = ScalarRegister::from_field(u32::from(fields.rd()));
        let imm = fields.imm16();

        let Some(opcode) = PrimaryOpcode::from_bits(fields.opcode()) else {
            return DecodedInstruction::Reserved { word };
        };

        match opcode {
            PrimaryOpcode::Special => Self::decode_special(fields, rs, rt, rd),
            PrimaryOpcode::Regimm => {
                let (condition, link) = match RegimmFunction::from_bits(fields.rt()) {
                    Some(RegimmFunction::Bltz) => (BranchCondition::LessThanZero, false),
                    Some(RegimmFunction::Bgez) => (BranchCondition::GreaterOrEqualZero, false),
                    Some(RegimmFunction::Bltzal) => (BranchCondition::LessThanZero, true),
                    Some(RegimmFunction::Bgezal) => (BranchCondition::GreaterOrEqualZero, true),
                    None => return DecodedInstruction::Reserved { word },
                };
                DecodedInstruction::Branch {
                    condition,
                    rs,
                    rt: ScalarRegister::ZERO,
                    offset: imm as i16,
                    link,
                }
            }
            PrimaryOpcode::J | PrimaryOpcode::Jal => DecodedInstruction::Jump {
                link: opcode == PrimaryOpcode::Jal,
                target: (fields.target26() << 2) & 0x0FFF_FFFC,
            },
            PrimaryOpcode::Beq | PrimaryOpcode::Bne => DecodedInstruction::Branch {
                condition: if opcode == PrimaryOpcode::Beq {
                    BranchCondition::Equal
                } else {
                    BranchCondition::NotEqual
                },
                rs,
                rt,
                offset: imm as i16,
                link: false,
            },
            PrimaryOpcode::Blez | PrimaryOpcode::Bgtz => DecodedInstruction::Branch {
                condition: if opcode == PrimaryOpcode::Blez {
                    BranchCondition::LessOrEqualZero
                } else {
                    BranchCondition::GreaterThanZero
                },
                rs,
                rt: ScalarRegister::ZERO,
                offset: imm as i16,
                link: false,
            },
            PrimaryOpcode::Addi
            | PrimaryOpcode::Addiu
            | PrimaryOpcode::Slti
            | PrimaryOpcode::Sltiu
            | PrimaryOpcode::Andi
            | PrimaryOpcode::Ori
            | PrimaryOpcode::Xori
            | PrimaryOpcode::Lui => {
                let op = match opcode {
                    PrimaryOpcode::Slti => ImmediateOp::SetLessThan,
                    PrimaryOpcode::Sltiu => ImmediateOp::SetLessThanUnsigned,
                    PrimaryOpcode::Andi => ImmediateOp::And,
                    PrimaryOpcode::Ori => ImmediateOp::Or,
                    PrimaryOpcode::Xori => ImmediateOp::Xor,
                    PrimaryOpcode::Lui => ImmediateOp::LoadUpper,
                    _ => ImmediateOp::Add,
                };
                let rs = if op == ImmediateOp::LoadUpper {
                    ScalarRegister::ZERO
                } else {
                    rs
                };
                DecodedInstruction::Immediate { op, rt, rs, imm }
            }
            PrimaryOpcode::Cop0 => match CoprocessorMove::from_bits(fields.rs()) {
                Some(CoprocessorMove::MoveFrom) => DecodedInstruction::MoveFromControl {
                    rt,
                    rd: fields.rd(),
                },
                Some(CoprocessorMove::MoveTo) => DecodedInstruction::MoveToControl {
                    rt,
                    rd: fields.rd(),
                },
                _ => DecodedInstruction::Reserved { word },
            },
            PrimaryOpcode::Cop2 => Self::decode_cop2(fields, rt),
            PrimaryOpcode::Lb
            | PrimaryOpcode::Lh
            | PrimaryOpcode::Lw
            | PrimaryOpcode::Lbu
            | PrimaryOpcode::Lhu => DecodedInstruction::Load {
                kind: match opcode {
                    PrimaryOpcode::Lb => LoadKind::Byte,
                    PrimaryOpcode::Lbu => LoadKind::ByteUnsigned,
                    PrimaryOpcode::Lh => LoadKind::Half,
                    PrimaryOpcode::Lhu => LoadKind::HalfUnsigned,
                    _ => LoadKind::Word,
                },
                rt,
                base: rs,
                offset: imm as i16,
            },
            PrimaryOpcode::Sb | PrimaryOpcode::Sh | PrimaryOpcode::Sw => {
                DecodedInstruction::Store {
                    kind: match opcode {
                        PrimaryOpcode::Sb => StoreKind::Byte,
                        PrimaryOpcode::Sh => StoreKind::Half,
                        _ => StoreKind::Word,
                    },
                    rt,
                    base: rs,
                    offset: imm as i16,
                }
            }
            PrimaryOpcode::Lwc2 | PrimaryOpcode::Swc2 => {
                let store = opcode == PrimaryOpcode::Swc2;
                let vt = fields.rt();
                let element = fields.move_element();
                let offset = fields.offset7();
                match VectorMemoryOpcode::from_bits(store, fields.rd()) {
                    Some(op) => DecodedInstruction::VectorTransfer {
                        op,
                        vt,
                        element,
                        base: rs,
                        offset,
                    },
                    None => DecodedInstruction::ReservedTransfer {
                        store,
                        rd: fields.rd(),
                        vt,
                        element,
                        base: rs,
                        offset,
                    },
                }
            }
        }
    }

    fn decode_special(
        fields: InstructionWord,
        rs: ScalarRegister,
        rt: ScalarRegister,
        rd: ScalarRegister,
    ) -> DecodedInstruction {
        let Some(function) = SpecialFunction::from_bits(fields.funct()) else {
            return DecodedInstruction::Reserved { word: fields.0 };
        };
        let alu = |op| DecodedInstruction::Alu { op, rd, rs, rt };
        let shift = |kind| DecodedInstruction::Shift {
            kind,
            rd,
            rt,
            amount: fields.sa(),
        };
        let shift_variable = |kind| DecodedInstruction::ShiftVariable { kind, rd, rt, rs };
        match function {
            SpecialFunction::Sll => shift(ShiftKind::Left),
            SpecialFunction::Srl => shift(ShiftKind::RightLogical),
            SpecialFunction::Sra => shift(ShiftKind::RightArithmetic),
            SpecialFunction::Sllv => shift_variable(ShiftKind::Left),
            SpecialFunction::Srlv => shift_variable(ShiftKind::RightLogical),
            SpecialFunction::Srav => shift_variable(ShiftKind::RightArithmetic),
            SpecialFunction::Jr => DecodedInstruction::JumpRegister { rs, link: None },
            SpecialFunction::Jalr => DecodedInstruction::JumpRegister { rs, link: Some(rd) },
            SpecialFunction::Break => DecodedInstruction::Break,
            SpecialFunction::Add | SpecialFunction::Addu => alu(AluOp::Add),
            SpecialFunction::Sub | SpecialFunction::Subu => alu(AluOp::Sub),
            SpecialFunction::And => alu(AluOp::And),
            SpecialFunction::Or => alu(AluOp::Or),
            SpecialFunction::Xor => alu(AluOp::Xor),
            SpecialFunction::Nor => alu(AluOp::Nor),
            SpecialFunction::Slt => alu(AluOp::SetLessThan),
            SpecialFunction::Sltu => alu(AluOp::SetLessThanUnsigned),
        }
    }

    fn decode_cop2(fields: InstructionWord, rt: ScalarRegister) -> DecodedInstruction {
        let rs_field = fields.rs();
        if rs_field >= 0x10 {
            let funct = fields.funct();
            let element = rs_field & 0xF;
            let vd = fields.sa();
            let vs = fields.rd();
            let vt = fields.rt();
            return match VectorOpcode::from_funct(funct) {
                Some(op) => DecodedInstruction::Vector {
                    op,
                    vd,
                    vs,
                    vt,
                    element,
                },
                None => DecodedInstruction::ReservedVector {
                    funct,
                    vd,
                    vs,
                    vt,
                    element,
                },
            };
        }
        let vs = fields.rd();
        let element = fields.move_element();
        match CoprocessorMove::from_bits(rs_field) {
            Some(CoprocessorMove::MoveFrom) => {
                DecodedInstruction::MoveFromVector { rt, vs, element }
            }
            Some(CoprocessorMove::MoveTo) => DecodedInstruction::MoveToVector { rt, vs, element },
            Some(CoprocessorMove::ControlFrom) => {
                DecodedInstruction::ControlFromVector { rt, rd: vs }
            }
            Some(CoprocessorMove::ControlTo) => DecodedInstruction::ControlToVector { rt, rd: vs },
            None => DecodedInstruction::Reserved { word: fields.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(n: u8) -> ScalarRegister {
        ScalarRegister::from_field(u32::from(n))
    }

    #[test]
    fn addiu_and_break() {
        assert_eq!(
            Decoder::decode(0x2401_0005),
            DecodedInstruction::Immediate {
                op: ImmediateOp::Add,
                rt: reg(1),
                rs: reg(0),
                imm: 5,
            }
        );
        assert_eq!(Decoder::decode(0x0000_000D), DecodedInstruction::Break);
    }

    #[test]
    fn vector_operation_fields() {
        // vadd $v3, $v1, $v2[5]
        let word = (18 << 26) | (1 << 25) | (5 << 21) | (2 << 16) | (1 << 11) | (3 << 6) | 16;
        assert_eq!(
            Decoder::decode(word),
            DecodedInstruction::Vector {
                op: VectorOpcode::Vadd,
                vd: 3,
                vs: 1,
                vt: 2,
                element: 5,
            }
        );
    }

    #[test]
    fn unknown_words_decode_as_reserved() {
        assert_eq!(
            Decoder::decode(0xFC00_0000),
            DecodedInstruction::Reserved { word: 0xFC00_0000 }
        );
        assert_eq!(
            Decoder::decode(0x0000_0001),
            DecodedInstruction::Reserved { word: 1 }
        );
        let reserved_vector = (18 << 26) | (1 << 25) | 30;
        assert!(matches!(
            Decoder::decode(reserved_vector),
            DecodedInstruction::ReservedVector { funct: 30, .. }
        ));
        let reserved_lwc2 = (50 << 26) | (0x0A << 11);
        assert!(matches!(
            Decoder::decode(reserved_lwc2),
            DecodedInstruction::ReservedTransfer { store: false, rd: 0x0A, .. }
        ));
    }

    #[test]
    fn canonical_encodings_round_trip() {
        let samples = [
            DecodedInstruction::Shift {
                kind: ShiftKind::RightArithmetic,
                rd: reg(4),
                rt: reg(5),
                amount: 31,
            },
            DecodedInstruction::JumpRegister {
                rs: reg(31),
                link: Some(reg(2)),
            },
            DecodedInstruction::Jump {
                link: true,
                target: 0x0000_0ABC,
            },
            DecodedInstruction::Branch {
                condition: BranchCondition::GreaterOrEqualZero,
                rs: reg(7),
                rt: reg(0),
                offset: -3,
                link: true,
            },
            DecodedInstruction::Store {
                kind: StoreKind::Half,
                rt: reg(9),
                base: reg(29),
                offset: -2,
            },
            DecodedInstruction::MoveToVector {
                rt: reg(3),
                vs: 17,
                element: 14,
            },
            DecodedInstruction::VectorTransfer {
                op: VectorMemoryOpcode::Ltv,
                vt: 8,
                element: 4,
                base: reg(1),
                offset: 0x7F,
            },
        ];
        for instruction in samples {
            assert_eq!(Decoder::decode(instruction.encode()), instruction);
        }
    }
}
