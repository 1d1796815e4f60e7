//! Mnemonic resolution derived from the `rsp-core` opcode tables.

use rsp_core::{
    CoprocessorMove, PrimaryOpcode, RegimmFunction, SpecialFunction, VectorMemoryOpcode,
    VectorOpcode, VECTOR_MEMORY_TABLE, VECTOR_OPCODE_TABLE,
};

/// Operand shape and opcode fields selected by a mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandForm {
    /// `rd, rs, rt`
    Register3(SpecialFunction),
    /// `rd, rt, sa`
    Shift(SpecialFunction),
    /// `rd, rt, rs`
    ShiftVariable(SpecialFunction),
    /// `jr rs`
    JumpRegister,
    /// `jalr rs` or `jalr rd, rs`
    JumpAndLinkRegister,
    /// `break`
    Break,
    /// `rt, rs, imm`
    Immediate(PrimaryOpcode),
    /// `lui rt, imm`
    LoadUpper,
    /// `rs, rt, target`
    BranchCompare(PrimaryOpcode),
    /// `rs, target` (BLEZ/BGTZ)
    BranchZero(PrimaryOpcode),
    /// `rs, target` (REGIMM)
    BranchRegimm(RegimmFunction),
    /// `j target` / `jal target`
    Jump(PrimaryOpcode),
    /// `rt, offset(rs)`
    Memory(PrimaryOpcode),
    /// `rt, cop0-register`
    Cop0(CoprocessorMove),
    /// `rt, $vs[e]`
    Cop2Element(CoprocessorMove),
    /// `rt, $vco|$vcc|$vce`
    Cop2Control(CoprocessorMove),
    /// `vd, vs, vt[e]`
    Vector(VectorOpcode),
    /// `vd[de], vt[e]`
    VectorSingleLane(VectorOpcode),
    /// No operands (VNOP, VNULL).
    VectorBare(VectorOpcode),
    /// `vt[e], offset(rs)`
    VectorMemory(VectorMemoryOpcode),
    /// `nop`, encoded as `sll $0, $0, 0`.
    Nop,
    /// `move rd, rs`, encoded as `addu rd, rs, $0`.
    Move,
    /// `b target`, encoded as `beq $0, $0, target`.
    Branch,
    /// `li rt, imm`: one or two words depending on the value.
    LoadImmediate,
}

const SCALAR_MNEMONICS: &[(&str, OperandForm)] = &[
    ("sll", OperandForm::Shift(SpecialFunction::Sll)),
    ("srl", OperandForm::Shift(SpecialFunction::Srl)),
    ("sra", OperandForm::Shift(SpecialFunction::Sra)),
    ("sllv", OperandForm::ShiftVariable(SpecialFunction::Sllv)),
    ("srlv", OperandForm::ShiftVariable(SpecialFunction::Srlv)),
    ("srav", OperandForm::ShiftVariable(SpecialFunction::Srav)),
    ("jr", OperandForm::JumpRegister),
    ("jalr", OperandForm::JumpAndLinkRegister),
    ("break", OperandForm::Break),
    ("add", OperandForm::Register3(SpecialFunction::Add)),
    ("addu", OperandForm::Register3(SpecialFunction::Addu)),
    ("sub", OperandForm::Register3(SpecialFunction::Sub)),
    ("subu", OperandForm::Register3(SpecialFunction::Subu)),
    ("and", OperandForm::Register3(SpecialFunction::And)),
    ("or", OperandForm::Register3(SpecialFunction::Or)),
    ("xor", OperandForm::Register3(SpecialFunction::Xor)),
    ("nor", OperandForm::Register3(SpecialFunction::Nor)),
    ("slt", OperandForm::Register3(SpecialFunction::Slt)),
    ("sltu", OperandForm::Register3(SpecialFunction::Sltu)),
    ("bltz", OperandForm::BranchRegimm(RegimmFunction::Bltz)),
    ("bgez", OperandForm::BranchRegimm(RegimmFunction::Bgez)),
    ("bltzal", OperandForm::BranchRegimm(RegimmFunction::Bltzal)),
    ("bgezal", OperandForm::BranchRegimm(RegimmFunction::Bgezal)),
    ("j", OperandForm::Jump(PrimaryOpcode::J)),
    ("jal", OperandForm::Jump(PrimaryOpcode::Jal)),
    ("beq", OperandForm::BranchCompare(PrimaryOpcode::Beq)),
    ("bne", OperandForm::BranchCompare(PrimaryOpcode::Bne)),
    ("blez", OperandForm::BranchZero(PrimaryOpcode::Blez)),
    ("bgtz", OperandForm::BranchZero(PrimaryOpcode::Bgtz)),
    ("addi", OperandForm::Immediate(PrimaryOpcode::Addi)),
    ("addiu", OperandForm::Immediate(PrimaryOpcode::Addiu)),
    ("slti", OperandForm::Immediate(PrimaryOpcode::Slti)),
    ("sltiu", OperandForm::Immediate(PrimaryOpcode::Sltiu)),
    ("andi", OperandForm::Immediate(PrimaryOpcode::Andi)),
    ("ori", OperandForm::Immediate(PrimaryOpcode::Ori)),
    ("xori", OperandForm::Immediate(PrimaryOpcode::Xori)),
    ("lui", OperandForm::LoadUpper),
    ("lb", OperandForm::Memory(PrimaryOpcode::Lb)),
    ("lh", OperandForm::Memory(PrimaryOpcode::Lh)),
    ("lw", OperandForm::Memory(PrimaryOpcode::Lw)),
    ("lbu", OperandForm::Memory(PrimaryOpcode::Lbu)),
    ("lhu", OperandForm::Memory(PrimaryOpcode::Lhu)),
    ("sb", OperandForm::Memory(PrimaryOpcode::Sb)),
    ("sh", OperandForm::Memory(PrimaryOpcode::Sh)),
    ("sw", OperandForm::Memory(PrimaryOpcode::Sw)),
    ("mfc0", OperandForm::Cop0(CoprocessorMove::MoveFrom)),
    ("mtc0", OperandForm::Cop0(CoprocessorMove::MoveTo)),
    ("mfc2", OperandForm::Cop2Element(CoprocessorMove::MoveFrom)),
    ("mtc2", OperandForm::Cop2Element(CoprocessorMove::MoveTo)),
    ("cfc2", OperandForm::Cop2Control(CoprocessorMove::ControlFrom)),
    ("ctc2", OperandForm::Cop2Control(CoprocessorMove::ControlTo)),
    ("nop", OperandForm::Nop),
    ("move", OperandForm::Move),
    ("b", OperandForm::Branch),
    ("li", OperandForm::LoadImmediate),
];

/// Resolves a mnemonic (any case) to its operand form.
#[must_use]
pub fn resolve_mnemonic(name: &str) -> Option<OperandForm> {
    let lower = name.to_ascii_lowercase();

    if let Some((_, form)) = SCALAR_MNEMONICS.iter().find(|(m, _)| *m == lower) {
        return Some(*form);
    }

    if let Some((_, op, _)) = VECTOR_OPCODE_TABLE.iter().find(|(_, _, m)| *m == lower) {
        return Some(vector_form(*op));
    }

    VECTOR_MEMORY_TABLE
        .iter()
        .find(|(_, _, _, m)| *m == lower)
        .map(|(_, _, op, _)| OperandForm::VectorMemory(*op))
}

const fn vector_form(op: VectorOpcode) -> OperandForm {
    if op.is_single_lane() {
        OperandForm::VectorSingleLane(op)
    } else if matches!(op, VectorOpcode::Vnop | VectorOpcode::Vnull) {
        OperandForm::VectorBare(op)
    } else {
        OperandForm::Vector(op)
    }
}

/// Every mnemonic the assembler accepts, scalar first.
pub fn all_mnemonics() -> impl Iterator<Item = &'static str> {
    SCALAR_MNEMONICS
        .iter()
        .map(|(m, _)| *m)
        .chain(VECTOR_OPCODE_TABLE.iter().map(|(_, _, m)| *m))
        .chain(VECTOR_MEMORY_TABLE.iter().map(|(_, _, _, m)| *m))
}
