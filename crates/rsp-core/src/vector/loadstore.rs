//! LWC2/SWC2 transfers between DMEM and the vector register file.
//!
//! Loads never write past byte 15 of the target register; stores read
//! register bytes modulo 16. DMEM addresses wrap at 4 KiB byte by byte.
//! An access the hardware would mangle is refused with a
//! [`TransferRejection`] and nothing is transferred.

use crate::diag::TransferRejection;
use crate::encoding::{sign_extend_offset7, VectorMemoryOpcode};
use crate::memory::{ScratchView, DATA_ADDRESS_MASK};
use crate::state::{VectorFile, LANE_COUNT, VECTOR_BYTES};

/// Operands of one transfer after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOperands {
    /// Which transfer.
    pub op: VectorMemoryOpcode,
    /// Vector register field.
    pub vt: u8,
    /// Element field.
    pub element: u8,
    /// Value of the base scalar register.
    pub base: u32,
    /// Raw seven-bit offset field.
    pub offset: u8,
}

impl TransferOperands {
    /// `(base + sext7(offset) << scale) & 0xFFF`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn address(&self) -> u32 {
        let scaled = sign_extend_offset7(self.offset as u32) << self.op.offset_shift();
        self.base.wrapping_add(scaled as u32) & DATA_ADDRESS_MASK
    }
}

const fn require(condition: bool, reason: TransferRejection) -> Result<(), TransferRejection> {
    if condition {
        Ok(())
    } else {
        Err(reason)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn step(addr: u32, by: usize) -> u32 {
    addr.wrapping_add(by as u32)
}

/// Performs one vector transfer.
///
/// # Errors
///
/// Returns the rejection reason when the element or address combination is
/// refused; no register or memory byte is changed in that case.
#[allow(clippy::too_many_lines)]
pub fn transfer(
    registers: &mut VectorFile,
    memory: &mut ScratchView<'_>,
    operands: TransferOperands,
) -> Result<(), TransferRejection> {
    use TransferRejection::{
        IllegalElement, OddAddress, OddElement, UncertainCase, Unimplemented, WeirdAddress,
    };
    use VectorMemoryOpcode as Op;

    let addr = operands.address();
    let e = usize::from(operands.element & 0xF);
    let vt = operands.vt & 31;
    let line_offset = (addr & 0xF) as usize;
    let line = addr & !0xF;

    match operands.op {
        Op::Lbv => load_bytes(registers, memory, vt, e, addr, 1),
        Op::Lsv => {
            require(e & 1 == 0, OddElement)?;
            require(addr & 3 != 3, WeirdAddress)?;
            load_bytes(registers, memory, vt, e, addr, 2);
        }
        Op::Llv => {
            require(e & 1 == 0, OddElement)?;
            load_bytes(registers, memory, vt, e, addr, 4);
        }
        Op::Ldv => {
            require(e & 1 == 0, OddElement)?;
            load_bytes(registers, memory, vt, e, addr, 8);
        }
        Op::Lqv => {
            require(e & 1 == 0, OddElement)?;
            require(addr & 1 == 0, OddAddress)?;
            load_bytes(registers, memory, vt, e, addr, VECTOR_BYTES - line_offset);
        }
        Op::Lrv => {
            require(e == 0, IllegalElement)?;
            require(addr & 1 == 0, OddAddress)?;
            let target = registers.get_mut(vt);
            for i in 0..line_offset {
                target.set_byte(VECTOR_BYTES - line_offset + i, memory.dmem_u8(step(line, i)));
            }
        }
        Op::Lpv => {
            require(e == 0, IllegalElement)?;
            load_packed(registers, memory, vt, addr, 1, 8);
        }
        Op::Luv => {
            if e == 0 {
                load_packed(registers, memory, vt, addr, 1, 7);
            } else {
                load_unpacked_rotated(registers, memory, vt, e, addr);
            }
        }
        Op::Lhv => {
            require(e == 0, IllegalElement)?;
            require(addr & 0xE == 0, WeirdAddress)?;
            load_packed(registers, memory, vt, addr, 2, 7);
        }
        Op::Lfv | Op::Swv => return Err(Unimplemented),
        Op::Ltv => {
            require(e & 1 == 0, OddElement)?;
            require(vt & 7 == 0 && addr & 0xF == 0, UncertainCase)?;
            for i in 0..LANE_COUNT {
                let lane = (i + LANE_COUNT - e / 2) & 7;
                let value = memory.dmem_u16(step(addr, 2 * i));
                #[allow(clippy::cast_possible_truncation)]
                let register = vt + i as u8;
                registers.get_mut(register).set_lane(lane, value);
            }
        }
        Op::Sbv => memory.set_dmem_u8(addr, registers.get(vt).byte(e)),
        Op::Ssv => store_bytes(registers, memory, vt, e, addr, 2),
        Op::Slv => {
            require(e & 1 == 0 && e <= 12, IllegalElement)?;
            require(addr & 1 == 0, OddAddress)?;
            store_bytes(registers, memory, vt, e, addr, 4);
        }
        Op::Sdv => store_bytes(registers, memory, vt, e, addr, 8),
        Op::Sqv => store_bytes(registers, memory, vt, e, addr, VECTOR_BYTES - line_offset),
        Op::Srv => {
            require(e == 0, IllegalElement)?;
            require(addr & 1 == 0, OddAddress)?;
            let source = registers.get(vt);
            for i in 0..line_offset {
                memory.set_dmem_u8(step(line, i), source.byte(VECTOR_BYTES - line_offset + i));
            }
        }
        Op::Spv => {
            require(e == 0, IllegalElement)?;
            store_packed(registers, memory, vt, addr, 1, 8);
        }
        Op::Suv => {
            require(e == 0, IllegalElement)?;
            store_packed(registers, memory, vt, addr, 1, 7);
        }
        Op::Shv => {
            require(e == 0, IllegalElement)?;
            require(addr & 0xE == 0, WeirdAddress)?;
            store_packed(registers, memory, vt, addr, 2, 7);
        }
        Op::Sfv => {
            require(e == 0 || e == 8, IllegalElement)?;
            let source = registers.get(vt);
            let base = addr & 0xFF3;
            for k in 0..4 {
                #[allow(clippy::cast_possible_truncation)]
                let value = (source.lane(k + e / 2) >> 7) as u8;
                memory.set_dmem_u8(step(base, 4 * k), value);
            }
        }
        Op::Stv => {
            require(e & 1 == 0, OddElement)?;
            require(vt & 7 == 0 && addr & 0xF == 0, UncertainCase)?;
            for i in 0..LANE_COUNT {
                #[allow(clippy::cast_possible_truncation)]
                let register = vt + ((e / 2 + i) % LANE_COUNT) as u8;
                memory.set_dmem_u16(step(addr, 2 * i), registers.get(register).lane(i));
            }
        }
    }
    Ok(())
}

fn load_bytes(
    registers: &mut VectorFile,
    memory: &ScratchView<'_>,
    vt: u8,
    element: usize,
    addr: u32,
    count: usize,
) {
    let target = registers.get_mut(vt);
    for i in 0..count {
        target.set_byte(element + i, memory.dmem_u8(step(addr, i)));
    }
}

fn store_bytes(
    registers: &VectorFile,
    memory: &mut ScratchView<'_>,
    vt: u8,
    element: usize,
    addr: u32,
    count: usize,
) {
    let source = registers.get(vt);
    for i in 0..count {
        memory.set_dmem_u8(step(addr, i), source.byte((element + i) & 0xF));
    }
}

/// One byte per lane, `stride` bytes apart, shifted left by `shift`.
fn load_packed(
    registers: &mut VectorFile,
    memory: &ScratchView<'_>,
    vt: u8,
    addr: u32,
    stride: usize,
    shift: u32,
) {
    let target = registers.get_mut(vt);
    for i in 0..LANE_COUNT {
        target.set_lane(i, u16::from(memory.dmem_u8(step(addr, i * stride))) << shift);
    }
}

#[allow(clippy::cast_possible_truncation)]
fn store_packed(
    registers: &VectorFile,
    memory: &mut ScratchView<'_>,
    vt: u8,
    addr: u32,
    stride: usize,
    shift: u32,
) {
    let source = registers.get(vt);
    for i in 0..LANE_COUNT {
        memory.set_dmem_u8(step(addr, i * stride), (source.lane(i) >> shift) as u8);
    }
}

/// LUV with a nonzero element: the read pointer starts `-e` bytes into the
/// line and steps back one line after lane `e - 1`.
#[allow(clippy::cast_possible_truncation)]
fn load_unpacked_rotated(
    registers: &mut VectorFile,
    memory: &ScratchView<'_>,
    vt: u8,
    element: usize,
    addr: u32,
) {
    let mut pointer = addr.wrapping_add((VECTOR_BYTES - element) as u32 & 0xF);
    let target = registers.get_mut(vt);
    for lane in 0..LANE_COUNT {
        target.set_lane(lane, u16::from(memory.dmem_u8(pointer)) << 7);
        if lane + 1 == element {
            pointer = pointer.wrapping_sub(16);
        }
        pointer = pointer.wrapping_add(1);
    }
}
