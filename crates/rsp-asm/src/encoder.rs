//! Instruction and directive encoding (pass 2).
//!
//! Field layouts follow the MIPS formats the `rsp-core` decoder reads:
//! R-type and I-type scalar words, COP0/COP2 moves, COP2 computational
//! words with bit 25 set, and LWC2/SWC2 transfers with a scaled
//! seven-bit offset.

use rsp_core::{CoprocessorMove, PrimaryOpcode, SpecialFunction, VectorMemoryOpcode, VectorOpcode};

use crate::mnemonic::OperandForm;
use crate::parser::{fits_bits, Directive, Expr, LineBody, Operand, ParsedInstruction};
use crate::symbols::{AddressedLine, SymbolTable};

const COP2_COMPUTATIONAL: u32 = 1 << 25;

/// Error during encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct EncodeError {
    /// Kind of error.
    pub kind: EncodeErrorKind,
    /// Source line where the error occurred.
    pub line: usize,
}

/// Classification of encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeErrorKind {
    /// Label never defined.
    #[error("undefined label: {0}")]
    UndefinedLabel(String),
    /// Value does not fit the field.
    #[error("immediate value {value} does not fit in {bits} bits")]
    ImmediateOutOfRange {
        /// The value.
        value: i64,
        /// Field width.
        bits: u32,
    },
    /// Shift amount outside `0..32`.
    #[error("shift amount out of range: {0}")]
    ShiftOutOfRange(i64),
    /// Branch or jump target is not word aligned.
    #[error("branch target 0x{0:X} is not word aligned")]
    MisalignedTarget(i64),
    /// Branch displacement does not fit in 16 bits.
    #[error("branch target out of range: {0} words")]
    BranchOutOfRange(i64),
    /// Vector transfer offset is not a multiple of the access size.
    #[error("offset {offset} is not a multiple of {scale}")]
    OffsetNotScaled {
        /// Byte offset as written.
        offset: i64,
        /// Required multiple.
        scale: i64,
    },
    /// Operands do not have the shape the mnemonic needs.
    #[error("operands do not match {0}")]
    OperandMismatch(String),
    /// Scaled vector transfer offset outside `-64..=63`.
    #[error("vector transfer offset out of range: {0}")]
    OffsetOutOfRange(i64),
}

type EncodeResult<T> = Result<T, EncodeErrorKind>;

/// Encodes one addressed line to bytes.
///
/// # Errors
///
/// Returns `EncodeError` if a label is undefined or a value does not fit
/// its field.
pub fn encode_line(line: &AddressedLine, symbols: &SymbolTable) -> Result<Vec<u8>, EncodeError> {
    let at_line = |kind| EncodeError {
        kind,
        line: line.source_line,
    };

    match &line.parsed.body {
        LineBody::Empty => Ok(Vec::new()),
        LineBody::Directive(directive) => encode_directive(directive, line.size, symbols)
            .map_err(at_line),
        LineBody::Instruction(instruction) => encode_instruction(instruction, symbols, line.address)
            .map(|words| words.iter().flat_map(|w| w.to_be_bytes()).collect())
            .map_err(at_line),
    }
}

fn encode_directive(
    directive: &Directive,
    size: u32,
    symbols: &SymbolTable,
) -> EncodeResult<Vec<u8>> {
    match directive {
        Directive::Org(_) | Directive::Align(_) | Directive::Space(_) => {
            Ok(vec![0; size as usize])
        }
        Directive::Word(values) => {
            let mut bytes = Vec::with_capacity(4 * values.len());
            for expr in values {
                let value = resolve(expr, symbols)?;
                bytes.extend(field(value, 32)?.to_be_bytes());
            }
            Ok(bytes)
        }
        Directive::Half(values) => Ok(values.iter().flat_map(|v| v.to_be_bytes()).collect()),
        Directive::Byte(values) => Ok(values.clone()),
    }
}

fn resolve(expr: &Expr, symbols: &SymbolTable) -> EncodeResult<i64> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Label { name, addend } => symbols
            .get(name)
            .map(|symbol| i64::from(symbol.address) + addend)
            .ok_or_else(|| EncodeErrorKind::UndefinedLabel(name.clone())),
    }
}

/// Low `bits` of `value`, after checking it fits signed or unsigned.
fn field(value: i64, bits: u32) -> EncodeResult<u32> {
    if fits_bits(value, bits) {
        Ok(low_bits(value, bits))
    } else {
        Err(EncodeErrorKind::ImmediateOutOfRange { value, bits })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn low_bits(value: i64, bits: u32) -> u32 {
    (value & ((1i64 << bits) - 1)) as u32
}

fn r_type(rs: u8, rt: u8, rd: u8, sa: u32, funct: SpecialFunction) -> u32 {
    (u32::from(rs) << 21) | (u32::from(rt) << 16) | (u32::from(rd) << 11) | (sa << 6) | funct as u32
}

fn i_type(op: PrimaryOpcode, rs: u8, rt: u8, imm: u32) -> u32 {
    ((op as u32) << 26) | (u32::from(rs) << 21) | (u32::from(rt) << 16) | (imm & 0xFFFF)
}

fn branch_offset(target: i64, pc: u32) -> EncodeResult<u32> {
    if target % 4 != 0 {
        return Err(EncodeErrorKind::MisalignedTarget(target));
    }
    let words = (target - (i64::from(pc) + 4)) / 4;
    if fits_signed(words, 16) {
        Ok(low_bits(words, 16))
    } else {
        Err(EncodeErrorKind::BranchOutOfRange(words))
    }
}

const fn fits_signed(value: i64, bits: u32) -> bool {
    value >= -(1 << (bits - 1)) && value < (1 << (bits - 1))
}

fn cop_move(op: PrimaryOpcode, mv: CoprocessorMove, rt: u8, rd: u8, element: u8) -> u32 {
    ((op as u32) << 26)
        | ((mv as u32) << 21)
        | (u32::from(rt) << 16)
        | (u32::from(rd) << 11)
        | (u32::from(element) << 7)
}

fn vector_word(op: VectorOpcode, element: u8, vt: u8, vs: u8, vd: u8) -> u32 {
    ((PrimaryOpcode::Cop2 as u32) << 26)
        | COP2_COMPUTATIONAL
        | (u32::from(element & 0xF) << 21)
        | (u32::from(vt) << 16)
        | (u32::from(vs) << 11)
        | (u32::from(vd) << 6)
        | u32::from(op.funct())
}

fn vector_transfer(
    op: VectorMemoryOpcode,
    vt: u8,
    element: u8,
    base: u8,
    offset: i64,
) -> EncodeResult<u32> {
    let scale = 1i64 << op.offset_shift();
    if offset % scale != 0 {
        return Err(EncodeErrorKind::OffsetNotScaled { offset, scale });
    }
    let scaled = offset / scale;
    if !fits_signed(scaled, 7) {
        return Err(EncodeErrorKind::OffsetOutOfRange(scaled));
    }
    let (store, rd) = op.encoding();
    let primary = if store {
        PrimaryOpcode::Swc2
    } else {
        PrimaryOpcode::Lwc2
    };
    Ok(((primary as u32) << 26)
        | (u32::from(base) << 21)
        | (u32::from(vt) << 16)
        | (u32::from(rd) << 11)
        | (u32::from(element) << 7)
        | low_bits(scaled, 7))
}

/// Encodes an instruction placed at IMEM offset `pc` into one or two words.
///
/// # Errors
///
/// Returns `EncodeErrorKind` if a label is undefined or a value does not
/// fit its field.
#[allow(clippy::too_many_lines)]
pub fn encode_instruction(
    instr: &ParsedInstruction,
    symbols: &SymbolTable,
    pc: u32,
) -> EncodeResult<Vec<u32>> {
    use Operand::{Control, Immediate, Memory, Scalar, Vector};

    let word = match (instr.form, instr.operands.as_slice()) {
        (OperandForm::Register3(f), [Scalar(rd), Scalar(rs), Scalar(rt)]) => {
            r_type(*rs, *rt, *rd, 0, f)
        }
        (OperandForm::Shift(f), [Scalar(rd), Scalar(rt), Immediate(sa)]) => {
            let sa = resolve(sa, symbols)?;
            if !(0..32).contains(&sa) {
                return Err(EncodeErrorKind::ShiftOutOfRange(sa));
            }
            r_type(0, *rt, *rd, low_bits(sa, 5), f)
        }
        (OperandForm::ShiftVariable(f), [Scalar(rd), Scalar(rt), Scalar(rs)]) => {
            r_type(*rs, *rt, *rd, 0, f)
        }
        (OperandForm::JumpRegister, [Scalar(rs)]) => r_type(*rs, 0, 0, 0, SpecialFunction::Jr),
        (OperandForm::JumpAndLinkRegister, [Scalar(rs)]) => {
            r_type(*rs, 0, 31, 0, SpecialFunction::Jalr)
        }
        (OperandForm::JumpAndLinkRegister, [Scalar(rd), Scalar(rs)]) => {
            r_type(*rs, 0, *rd, 0, SpecialFunction::Jalr)
        }
        (OperandForm::Break, []) => SpecialFunction::Break as u32,
        (OperandForm::Nop, []) => 0,
        (OperandForm::Move, [Scalar(rd), Scalar(rs)]) => {
            r_type(*rs, 0, *rd, 0, SpecialFunction::Addu)
        }
        (OperandForm::Immediate(op), [Scalar(rt), Scalar(rs), Immediate(imm)]) => {
            let imm = field(resolve(imm, symbols)?, 16)?;
            i_type(op, *rs, *rt, imm)
        }
        (OperandForm::LoadUpper, [Scalar(rt), Immediate(imm)]) => {
            let imm = field(resolve(imm, symbols)?, 16)?;
            i_type(PrimaryOpcode::Lui, 0, *rt, imm)
        }
        (OperandForm::LoadImmediate, [Scalar(rt), Immediate(imm)]) => {
            return encode_li(*rt, resolve(imm, symbols)?, instr.words);
        }
        (OperandForm::BranchCompare(op), [Scalar(rs), Scalar(rt), Immediate(target)]) => {
            let offset = branch_offset(resolve(target, symbols)?, pc)?;
            i_type(op, *rs, *rt, offset)
        }
        (OperandForm::Branch, [Immediate(target)]) => {
            let offset = branch_offset(resolve(target, symbols)?, pc)?;
            i_type(PrimaryOpcode::Beq, 0, 0, offset)
        }
        (OperandForm::BranchZero(op), [Scalar(rs), Immediate(target)]) => {
            let offset = branch_offset(resolve(target, symbols)?, pc)?;
            i_type(op, *rs, 0, offset)
        }
        (OperandForm::BranchRegimm(f), [Scalar(rs), Immediate(target)]) => {
            let offset = branch_offset(resolve(target, symbols)?, pc)?;
            i_type(PrimaryOpcode::Regimm, *rs, f as u8, offset)
        }
        (OperandForm::Jump(op), [Immediate(target)]) => {
            let target = resolve(target, symbols)?;
            if target % 4 != 0 {
                return Err(EncodeErrorKind::MisalignedTarget(target));
            }
            ((op as u32) << 26) | field(target / 4, 26)?
        }
        (OperandForm::Memory(op), [Scalar(rt), Memory { offset, base }]) => {
            let offset = field(resolve(offset, symbols)?, 16)?;
            i_type(op, *base, *rt, offset)
        }
        (OperandForm::Cop0(mv), [Scalar(rt), Control(rd)]) => {
            cop_move(PrimaryOpcode::Cop0, mv, *rt, *rd, 0)
        }
        (OperandForm::Cop2Element(mv), [Scalar(rt), Vector { register, element }]) => {
            cop_move(PrimaryOpcode::Cop2, mv, *rt, *register, *element)
        }
        (OperandForm::Cop2Control(mv), [Scalar(rt), Control(rd)]) => {
            cop_move(PrimaryOpcode::Cop2, mv, *rt, *rd, 0)
        }
        (
            OperandForm::Vector(op),
            [Vector { register: vd, .. }, Vector { register: vs, .. }, Vector {
                register: vt,
                element,
            }],
        ) => vector_word(op, *element, *vt, *vs, *vd),
        (
            OperandForm::VectorSingleLane(op),
            [Vector {
                register: vd,
                element: de,
            }, Vector {
                register: vt,
                element,
            }],
        ) => vector_word(op, *element, *vt, *de, *vd),
        (OperandForm::VectorBare(op), []) => vector_word(op, 0, 0, 0, 0),
        (
            OperandForm::VectorMemory(op),
            [Vector {
                register: vt,
                element,
            }, Memory { offset, base }],
        ) => vector_transfer(op, *vt, *element, *base, resolve(offset, symbols)?)?,
        _ => return Err(EncodeErrorKind::OperandMismatch(instr.mnemonic.clone())),
    };

    Ok(vec![word])
}

fn encode_li(rt: u8, value: i64, words: u8) -> EncodeResult<Vec<u32>> {
    let imm = field(value, 32)?;
    if words == 1 {
        let op = if fits_signed(value, 16) {
            PrimaryOpcode::Addiu
        } else {
            PrimaryOpcode::Ori
        };
        return Ok(vec![i_type(op, 0, rt, imm)]);
    }
    Ok(vec![
        i_type(PrimaryOpcode::Lui, 0, rt, imm >> 16),
        i_type(PrimaryOpcode::Ori, rt, rt, imm),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use crate::symbols::Symbol;
    use rsp_core::{DecodedInstruction, Decoder};

    fn symbols() -> SymbolTable {
        let mut table = SymbolTable::new();
        table.insert(
            "target".into(),
            Symbol {
                address: 0x40,
                defined_at: 1,
            },
        );
        table
    }

    fn encode_at(source: &str, pc: u32) -> EncodeResult<Vec<u32>> {
        match parse_line(source, 1).unwrap().body {
            LineBody::Instruction(instr) => encode_instruction(&instr, &symbols(), pc),
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    fn encode(source: &str) -> u32 {
        encode_at(source, 0).unwrap()[0]
    }

    #[test]
    fn scalar_words() {
        assert_eq!(encode("addiu $1, $0, 5"), 0x2401_0005);
        assert_eq!(encode("addiu $1, $0, -1"), 0x2401_FFFF);
        assert_eq!(encode("addu $3, $1, $2"), 0x0022_1821);
        assert_eq!(encode("sll $1, $2, 4"), 0x0002_0900);
        assert_eq!(encode("srav $1, $2, $3"), 0x0062_0807);
        assert_eq!(encode("lui $1, 0x8000"), 0x3C01_8000);
        assert_eq!(encode("lw $1, 0x10($2)"), 0x8C41_0010);
        assert_eq!(encode("sb $1, -1($2)"), 0xA041_FFFF);
        assert_eq!(encode("jr $31"), 0x03E0_0008);
        assert_eq!(encode("jalr $5"), 0x00A0_F809);
        assert_eq!(encode("break"), 0x0000_000D);
        assert_eq!(encode("nop"), 0);
        assert_eq!(encode("move $4, $5"), 0x00A0_2021);
    }

    #[test]
    fn branches_are_relative_to_the_delay_slot() {
        assert_eq!(encode_at("beq $1, $2, target", 0x20).unwrap()[0], 0x1022_0007);
        assert_eq!(encode_at("bne $1, $0, 0x10", 0x20).unwrap()[0], 0x1420_FFFB);
        assert_eq!(encode_at("b target", 0x3C).unwrap()[0], 0x1000_0000);
        assert_eq!(encode_at("bgezal $3, target", 0).unwrap()[0], 0x0471_000F);
        assert_eq!(encode_at("blez $3, target", 0).unwrap()[0], 0x1860_000F);
        assert_eq!(
            encode_at("beq $1, $2, 0x42", 0),
            Err(EncodeErrorKind::MisalignedTarget(0x42))
        );
    }

    #[test]
    fn jumps_use_word_index() {
        assert_eq!(encode("j target"), 0x0800_0010);
        assert_eq!(encode("jal 0x100"), 0x0C00_0040);
    }

    #[test]
    fn coprocessor_moves() {
        assert_eq!(encode("mfc0 $5, SP_STATUS"), 0x4005_2000);
        assert_eq!(encode("mtc0 $1, $c7"), 0x4081_3800);
        assert_eq!(encode("mfc2 $1, $v2[4]"), 0x4801_1200);
        assert_eq!(encode("mtc2 $1, $v2[15]"), 0x4881_1780);
        assert_eq!(encode("cfc2 $1, $vcc"), 0x4841_0800);
        assert_eq!(encode("ctc2 $1, $vco"), 0x48C1_0000);
    }

    #[test]
    fn vector_words_decode_back() {
        let word = encode("vmulf $v3, $v1, $v2[1h]");
        match Decoder::decode(word) {
            DecodedInstruction::Vector {
                op,
                vd,
                vs,
                vt,
                element,
            } => {
                assert_eq!(op, VectorOpcode::Vmulf);
                assert_eq!((vd, vs, vt, element), (3, 1, 2, 5));
            }
            other => panic!("unexpected decode {other:?}"),
        }

        let word = encode("vrcph $v4[6], $v5[2]");
        match Decoder::decode(word) {
            DecodedInstruction::Vector {
                op,
                vd,
                vs,
                vt,
                element,
            } => {
                assert_eq!(op, VectorOpcode::Vrcph);
                assert_eq!((vd, vs, vt, element), (4, 6, 5, 10));
            }
            other => panic!("unexpected decode {other:?}"),
        }

        assert_eq!(encode("vnop"), 0x4A00_0037);
    }

    #[test]
    fn vector_transfers_scale_the_offset() {
        assert_eq!(encode("lqv $v1[0], 0($1)"), 0xC821_2000);
        assert_eq!(encode("sqv $v1[0], 0x20($1)"), 0xE821_2002);
        assert_eq!(encode("ldv $v2[8], -8($0)"), 0xC802_1C7F);
        assert_eq!(
            encode_at("lqv $v1[0], 8($1)", 0),
            Err(EncodeErrorKind::OffsetNotScaled {
                offset: 8,
                scale: 16
            })
        );
        assert_eq!(
            encode_at("lbv $v1[0], 64($1)", 0),
            Err(EncodeErrorKind::OffsetOutOfRange(64))
        );
    }

    #[test]
    fn load_immediate_expansions() {
        assert_eq!(encode_at("li $1, -2", 0).unwrap(), [0x2401_FFFE]);
        assert_eq!(encode_at("li $1, 0xFFFF", 0).unwrap(), [0x3401_FFFF]);
        assert_eq!(
            encode_at("li $1, 0x12345678", 0).unwrap(),
            [0x3C01_1234, 0x3421_5678]
        );
        assert_eq!(
            encode_at("li $2, target", 0).unwrap(),
            [0x3C02_0000, 0x3442_0040]
        );
    }

    #[test]
    fn range_errors() {
        assert_eq!(
            encode_at("addiu $1, $0, 0x10000", 0),
            Err(EncodeErrorKind::ImmediateOutOfRange {
                value: 0x10000,
                bits: 16
            })
        );
        assert_eq!(
            encode_at("sll $1, $1, 32", 0),
            Err(EncodeErrorKind::ShiftOutOfRange(32))
        );
        assert_eq!(
            encode_at("j missing", 0),
            Err(EncodeErrorKind::UndefinedLabel("missing".into()))
        );
    }
}
