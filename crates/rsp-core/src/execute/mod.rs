//! Scalar fetch/decode/execute and COP0/COP2 routing.
//!
//! Each step follows the static two-phase PC model:
//! 1. Fetch the word at IMEM `pc & 0xFFC`
//! 2. Take the branch target left pending by the previous instruction
//! 3. Advance `pc` by 4
//! 4. Execute, possibly recording a new branch target
//! 5. If a target was pending and the instruction did not replace it, jump
//!
//! Nothing here returns an error: anomalies are reported as diagnostics
//! and execution continues.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

mod helpers;

pub use helpers::{effective_address, sign_extend16};

use crate::api::{RspConfig, RspHost};
use crate::control::{ControlLatches, RcpRegisters, MI_INTR_SP, SP_STATUS_BROKE};
use crate::control::{SP_STATUS_HALT, SP_STATUS_INTR_BREAK};
use crate::decoder::{DecodedInstruction, Decoder, LoadKind, StoreKind};
use crate::diag::{Diagnostic, DiagnosticCounters};
use crate::memory::{DramView, ScratchView};
use crate::state::{ArchitecturalState, ScalarRegister};
use crate::vector::{self, ActiveBackend, TransferOperands, VectorOperands};

/// Everything one instruction may touch, borrowed for the length of a run.
pub struct Machine<'a> {
    /// Register files, flags and program counter.
    pub state: &'a mut ArchitecturalState,
    /// DMEM + IMEM.
    pub scratch: ScratchView<'a>,
    /// Host DRAM, reached only through DMA.
    pub dram: DramView<'a>,
    /// COP0, `SP_PC` and `MI_INTR`.
    pub registers: &'a mut RcpRegisters,
    /// Host callbacks.
    pub host: &'a mut dyn RspHost,
    /// Behavior switches.
    pub config: &'a RspConfig,
    /// MFC0 side-effect latches.
    pub latches: &'a mut ControlLatches,
    /// Diagnostic tallies.
    pub counters: &'a mut DiagnosticCounters,
}

impl core::fmt::Debug for Machine<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Machine")
            .field("pc", &self.state.pc())
            .field("registers", &self.registers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Result of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// The instruction retired and the unit keeps running.
    Retired,
    /// `SP_STATUS.HALT` is set after the instruction.
    Halted,
}

impl Machine<'_> {
    /// Counts a diagnostic and hands it to the host.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.counters.record(diagnostic);
        self.host.message(diagnostic);
    }

    /// `true` while `SP_STATUS.HALT` is clear.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_running(&self) -> bool {
        self.registers.status() & SP_STATUS_HALT == 0
    }

    fn read(&self, reg: ScalarRegister) -> u32 {
        self.state.scalar.get(reg)
    }

    fn write(&mut self, reg: ScalarRegister, value: u32) {
        self.state.scalar.set(reg, value);
    }
}

/// Fetches, decodes and executes one instruction.
pub fn step_one(machine: &mut Machine<'_>) -> StepOutcome {
    let pc = machine.state.pc();
    let word = machine.scratch.fetch(pc);
    let instruction = Decoder::decode(word);
    let pending = machine.state.take_branch_target();
    machine.state.set_pc(pc.wrapping_add(4));

    execute_instruction(machine, instruction, pc);
    machine.counters.increment_instructions();

    if let Some(target) = pending {
        // A branch in the delay slot replaces the pending target.
        if machine.state.branch_target().is_none() {
            machine.state.set_pc(target);
        }
    }

    if machine.is_running() {
        StepOutcome::Retired
    } else {
        StepOutcome::Halted
    }
}

/// Executes an already decoded instruction located at `pc`.
#[allow(clippy::too_many_lines)]
pub fn execute_instruction(machine: &mut Machine<'_>, instruction: DecodedInstruction, pc: u32) {
    match instruction {
        DecodedInstruction::Shift {
            kind,
            rd,
            rt,
            amount,
        } => {
            let value = helpers::shift(kind, machine.read(rt), u32::from(amount));
            machine.write(rd, value);
        }
        DecodedInstruction::ShiftVariable { kind, rd, rt, rs } => {
            let value = helpers::shift(kind, machine.read(rt), machine.read(rs));
            machine.write(rd, value);
        }
        DecodedInstruction::JumpRegister { rs, link } => {
            // The link is written before rs is read.
            if let Some(rd) = link {
                machine.write(rd, helpers::link_address(pc));
            }
            let target = machine.read(rs);
            machine.state.set_branch_target(target);
        }
        DecodedInstruction::Break => execute_break(machine),
        DecodedInstruction::Alu { op, rd, rs, rt } => {
            let value = helpers::alu(op, machine.read(rs), machine.read(rt));
            machine.write(rd, value);
        }
        DecodedInstruction::Immediate { op, rt, rs, imm } => {
            let value = helpers::immediate(op, machine.read(rs), imm);
            machine.write(rt, value);
        }
        DecodedInstruction::Jump { link, target } => {
            if link {
                machine.write(ScalarRegister::RA, helpers::link_address(pc));
            }
            machine.state.set_branch_target(target);
        }
        DecodedInstruction::Branch {
            condition,
            rs,
            rt,
            offset,
            link,
        } => {
            if link {
                machine.write(ScalarRegister::RA, helpers::link_address(pc));
            }
            let taken = helpers::branch_taken(condition, machine.read(rs), machine.read(rt));
            if taken {
                machine
                    .state
                    .set_branch_target(helpers::branch_target(pc, offset));
            }
        }
        DecodedInstruction::Load {
            kind,
            rt,
            base,
            offset,
        } => {
            let addr = effective_address(machine.read(base), offset);
            let scratch = &machine.scratch;
            let value = match kind {
                LoadKind::Byte => i32::from(scratch.dmem_u8(addr) as i8) as u32,
                LoadKind::ByteUnsigned => u32::from(scratch.dmem_u8(addr)),
                LoadKind::Half => i32::from(scratch.dmem_u16(addr) as i16) as u32,
                LoadKind::HalfUnsigned => u32::from(scratch.dmem_u16(addr)),
                LoadKind::Word => scratch.dmem_u32(addr),
            };
            machine.write(rt, value);
        }
        DecodedInstruction::Store {
            kind,
            rt,
            base,
            offset,
        } => {
            let addr = effective_address(machine.read(base), offset);
            let value = machine.read(rt);
            let [_, _, high, low] = value.to_be_bytes();
            match kind {
                StoreKind::Byte => machine.scratch.set_dmem_u8(addr, low),
                StoreKind::Half => machine
                    .scratch
                    .set_dmem_u16(addr, u16::from_be_bytes([high, low])),
                StoreKind::Word => machine.scratch.set_dmem_u32(addr, value),
            }
        }
        DecodedInstruction::MoveFromControl { rt, rd } => {
            let value = machine.read_control(rd, rt);
            machine.write(rt, value);
        }
        DecodedInstruction::MoveToControl { rt, rd } => {
            let value = machine.read(rt);
            machine.write_control(rd, value);
        }
        DecodedInstruction::MoveFromVector { rt, vs, element } => {
            let register = machine.state.vector.registers.get(vs);
            let e = usize::from(element & 0xF);
            let half = i16::from_be_bytes([register.byte(e), register.byte((e + 1) & 0xF)]);
            machine.write(rt, i32::from(half) as u32);
        }
        DecodedInstruction::MoveToVector { rt, vs, element } => {
            let [_, _, high, low] = machine.read(rt).to_be_bytes();
            let e = usize::from(element & 0xF);
            let register = machine.state.vector.registers.get_mut(vs);
            register.set_byte(e, high);
            register.set_byte(e + 1, low);
        }
        DecodedInstruction::ControlFromVector { rt, rd } => {
            let value = machine.state.vector.flags.read_control(rd);
            machine.write(rt, i32::from(value as i16) as u32);
        }
        DecodedInstruction::ControlToVector { rt, rd } => {
            let [_, _, high, low] = machine.read(rt).to_be_bytes();
            machine
                .state
                .vector
                .flags
                .write_control(rd, u16::from_be_bytes([high, low]));
        }
        DecodedInstruction::Vector {
            op,
            vd,
            vs,
            vt,
            element,
        } => {
            let operands = VectorOperands {
                vd,
                vs,
                vt,
                element,
            };
            vector::execute::<ActiveBackend>(&mut machine.state.vector, op, operands);
        }
        DecodedInstruction::ReservedVector {
            funct,
            vd,
            vs,
            vt,
            element,
        } => {
            let operands = VectorOperands {
                vd,
                vs,
                vt,
                element,
            };
            vector::execute_reserved::<ActiveBackend>(&mut machine.state.vector, operands);
            machine.report(Diagnostic::ReservedVectorOperation { funct });
        }
        DecodedInstruction::VectorTransfer {
            op,
            vt,
            element,
            base,
            offset,
        } => {
            let operands = TransferOperands {
                op,
                vt,
                element,
                base: machine.read(base),
                offset,
            };
            let result = vector::transfer(
                &mut machine.state.vector.registers,
                &mut machine.scratch,
                operands,
            );
            if let Err(reason) = result {
                machine.report(Diagnostic::SkippedTransfer { opcode: op, reason });
            }
        }
        DecodedInstruction::ReservedTransfer {
            store,
            rd: _,
            vt,
            element,
            base,
            offset,
        } => machine.report(Diagnostic::ReservedVectorTransfer {
            store,
            vt,
            element,
            offset,
            base: base.number(),
        }),
        DecodedInstruction::Reserved { word } => {
            machine.report(Diagnostic::ReservedInstruction { word });
        }
    }
}

fn execute_break(machine: &mut Machine<'_>) {
    machine
        .registers
        .set_status_bits(SP_STATUS_BROKE | SP_STATUS_HALT);
    if machine.registers.status() & SP_STATUS_INTR_BREAK != 0 {
        machine.registers.mi_intr |= MI_INTR_SP;
        machine.host.check_interrupts();
    }
}
