//! Pure scalar-unit arithmetic used by the execute stage.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use crate::decoder::{AluOp, BranchCondition, ImmediateOp, ShiftKind};
use crate::memory::{DATA_ADDRESS_MASK, FETCH_ADDRESS_MASK};

/// Sign-extends a 16-bit immediate.
#[must_use]
pub const fn sign_extend16(imm: u16) -> u32 {
    imm as i16 as i32 as u32
}

/// `(base + sext(offset)) & 0xFFF`.
#[must_use]
pub const fn effective_address(base: u32, offset: i16) -> u32 {
    base.wrapping_add(offset as i32 as u32) & DATA_ADDRESS_MASK
}

/// Shifts by the low five bits of `amount`.
#[must_use]
pub const fn shift(kind: ShiftKind, value: u32, amount: u32) -> u32 {
    let amount = amount & 0x1F;
    match kind {
        ShiftKind::Left => value << amount,
        ShiftKind::RightLogical => value >> amount,
        ShiftKind::RightArithmetic => ((value as i32) >> amount) as u32,
    }
}

/// Register-register ALU. The trapping forms behave like the unsigned ones.
#[must_use]
pub const fn alu(op: AluOp, rs: u32, rt: u32) -> u32 {
    match op {
        AluOp::Add => rs.wrapping_add(rt),
        AluOp::Sub => rs.wrapping_sub(rt),
        AluOp::And => rs & rt,
        AluOp::Or => rs | rt,
        AluOp::Xor => rs ^ rt,
        AluOp::Nor => !(rs | rt),
        AluOp::SetLessThan => ((rs as i32) < (rt as i32)) as u32,
        AluOp::SetLessThanUnsigned => (rs < rt) as u32,
    }
}

/// Register-immediate ALU. SLTIU compares against the sign-extended
/// immediate taken as unsigned; the logical forms zero-extend.
#[must_use]
pub const fn immediate(op: ImmediateOp, rs: u32, imm: u16) -> u32 {
    let signed = sign_extend16(imm);
    let zero_extended = imm as u32;
    match op {
        ImmediateOp::Add => rs.wrapping_add(signed),
        ImmediateOp::SetLessThan => ((rs as i32) < (signed as i32)) as u32,
        ImmediateOp::SetLessThanUnsigned => (rs < signed) as u32,
        ImmediateOp::And => rs & zero_extended,
        ImmediateOp::Or => rs | zero_extended,
        ImmediateOp::Xor => rs ^ zero_extended,
        ImmediateOp::LoadUpper => zero_extended << 16,
    }
}

#[must_use]
pub const fn branch_taken(condition: BranchCondition, rs: u32, rt: u32) -> bool {
    let signed = rs as i32;
    match condition {
        BranchCondition::Equal => rs == rt,
        BranchCondition::NotEqual => rs != rt,
        BranchCondition::LessOrEqualZero => signed <= 0,
        BranchCondition::GreaterThanZero => signed > 0,
        BranchCondition::LessThanZero => signed < 0,
        BranchCondition::GreaterOrEqualZero => signed >= 0,
    }
}

/// Target of a PC-relative branch at `pc`: delay slot plus `offset * 4`.
#[must_use]
pub const fn branch_target(pc: u32, offset: i16) -> u32 {
    pc.wrapping_add(4).wrapping_add(((offset as i32) << 2) as u32) & FETCH_ADDRESS_MASK
}

/// Return address stored by linking jumps and branches at `pc`.
#[must_use]
pub const fn link_address(pc: u32) -> u32 {
    pc.wrapping_add(8) & FETCH_ADDRESS_MASK
}
