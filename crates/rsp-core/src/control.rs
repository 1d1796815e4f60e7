//! COP0: the sixteen SP and DPC control registers and their side effects.

use crate::diag::Diagnostic;
use crate::dma::{self, DmaDirection};
use crate::execute::Machine;
use crate::state::{ScalarRegister, SCALAR_REGISTER_COUNT};

/// `SP_STATUS` bit: the scalar loop stops.
pub const SP_STATUS_HALT: u32 = 0x0001;
/// `SP_STATUS` bit: a BREAK retired.
pub const SP_STATUS_BROKE: u32 = 0x0002;
/// `SP_STATUS` bit: DMA in progress.
pub const SP_STATUS_DMA_BUSY: u32 = 0x0004;
/// `SP_STATUS` bit: DMA queue full.
pub const SP_STATUS_DMA_FULL: u32 = 0x0008;
/// `SP_STATUS` bit: IO full.
pub const SP_STATUS_IO_FULL: u32 = 0x0010;
/// `SP_STATUS` bit: single-step mode.
pub const SP_STATUS_SSTEP: u32 = 0x0020;
/// `SP_STATUS` bit: BREAK raises the SP interrupt.
pub const SP_STATUS_INTR_BREAK: u32 = 0x0040;
/// `SP_STATUS` bit: first of the eight signal bits.
pub const SP_STATUS_SIG0: u32 = 0x0080;
/// `SP_STATUS` bit: signal 2, set when a task completes through HLE.
pub const SP_STATUS_SIG2: u32 = 0x0200;

/// `MI_INTR` bit for the SP interrupt.
pub const MI_INTR_SP: u32 = 0x01;

/// `DPC_STATUS` bit: commands come from DMEM.
pub const DPC_STATUS_XBUS_DMEM_DMA: u32 = 0x0001;
/// `DPC_STATUS` bit: command processing frozen.
pub const DPC_STATUS_FREEZE: u32 = 0x0002;
/// `DPC_STATUS` bit: flush requested.
pub const DPC_STATUS_FLUSH: u32 = 0x0004;

/// Status read count at which `wait_for_cpu_host` halts the unit.
pub const DEFAULT_STATUS_TIMEOUT: u32 = 32767;
/// Timeout used after a task was interrupted while waiting on the host.
pub const INTERRUPTED_STATUS_TIMEOUT: u32 = 16;

const SP_STATUS_RESERVED_BITS: u32 = 0xFE00_0040;
const DPC_STATUS_RESERVED_BITS: u32 = 0xFFFF_FD80;

/// The sixteen COP0 registers, indexed by the `rd` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum ControlRegister {
    SpMemAddr,
    SpDramAddr,
    SpRdLen,
    SpWrLen,
    SpStatus,
    SpDmaFull,
    SpDmaBusy,
    SpSemaphore,
    DpcStart,
    DpcEnd,
    DpcCurrent,
    DpcStatus,
    DpcClock,
    DpcBufBusy,
    DpcPipeBusy,
    DpcTmem,
}

const CONTROL_REGISTERS: [ControlRegister; 16] = [
    ControlRegister::SpMemAddr,
    ControlRegister::SpDramAddr,
    ControlRegister::SpRdLen,
    ControlRegister::SpWrLen,
    ControlRegister::SpStatus,
    ControlRegister::SpDmaFull,
    ControlRegister::SpDmaBusy,
    ControlRegister::SpSemaphore,
    ControlRegister::DpcStart,
    ControlRegister::DpcEnd,
    ControlRegister::DpcCurrent,
    ControlRegister::DpcStatus,
    ControlRegister::DpcClock,
    ControlRegister::DpcBufBusy,
    ControlRegister::DpcPipeBusy,
    ControlRegister::DpcTmem,
];

impl ControlRegister {
    /// Register selected by `rd & 0xF`.
    #[must_use]
    pub const fn from_index(rd: u8) -> Self {
        CONTROL_REGISTERS[(rd & 0xF) as usize]
    }

    /// Index in `0..16`.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Hardware register name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SpMemAddr => "SP_MEM_ADDR",
            Self::SpDramAddr => "SP_DRAM_ADDR",
            Self::SpRdLen => "SP_RD_LEN",
            Self::SpWrLen => "SP_WR_LEN",
            Self::SpStatus => "SP_STATUS",
            Self::SpDmaFull => "SP_DMA_FULL",
            Self::SpDmaBusy => "SP_DMA_BUSY",
            Self::SpSemaphore => "SP_SEMAPHORE",
            Self::DpcStart => "DPC_START",
            Self::DpcEnd => "DPC_END",
            Self::DpcCurrent => "DPC_CURRENT",
            Self::DpcStatus => "DPC_STATUS",
            Self::DpcClock => "DPC_CLOCK",
            Self::DpcBufBusy => "DPC_BUFBUSY",
            Self::DpcPipeBusy => "DPC_PIPEBUSY",
            Self::DpcTmem => "DPC_TMEM",
        }
    }
}

/// RCP registers shared with the host: COP0, the SP program counter and
/// the MIPS interface interrupt register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RcpRegisters {
    /// COP0 registers in `rd` order.
    pub cop0: [u32; 16],
    /// `SP_PC` as seen by the host (`0x0400_1000 | pc`).
    pub sp_pc: u32,
    /// `MI_INTR`.
    pub mi_intr: u32,
}

impl RcpRegisters {
    /// Creates zeroed registers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one COP0 register without side effects.
    #[must_use]
    pub const fn get(&self, register: ControlRegister) -> u32 {
        self.cop0[register as usize]
    }

    /// Writes one COP0 register without side effects.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set(&mut self, register: ControlRegister, value: u32) {
        self.cop0[register as usize] = value;
    }

    /// `SP_STATUS`.
    #[must_use]
    pub const fn status(&self) -> u32 {
        self.get(ControlRegister::SpStatus)
    }

    /// Sets bits in `SP_STATUS`.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set_status_bits(&mut self, bits: u32) {
        self.cop0[ControlRegister::SpStatus as usize] |= bits;
    }

    /// Clears bits in `SP_STATUS`.
    #[allow(clippy::missing_const_for_fn)]
    pub fn clear_status_bits(&mut self, bits: u32) {
        self.cop0[ControlRegister::SpStatus as usize] &= !bits;
    }
}

/// Per-instance latches behind the MFC0 side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ControlLatches {
    /// Status reads per target register before the unit halts itself.
    pub status_timeout: u32,
    /// Status reads counted per target scalar register in the current run.
    pub status_reads: [u32; SCALAR_REGISTER_COUNT],
    /// Set once the missing-RDP-handler warning has been logged.
    pub rdp_warned: bool,
}

impl Default for ControlLatches {
    fn default() -> Self {
        Self {
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            status_reads: [0; SCALAR_REGISTER_COUNT],
            rdp_warned: false,
        }
    }
}

const fn clear_set(value: u32, written: u32, clear_bit: u32, set_bit: u32, target: u32) -> u32 {
    let mut value = value;
    if written & clear_bit != 0 {
        value &= !target;
    }
    if written & set_bit != 0 {
        value |= target;
    }
    value
}

impl Machine<'_> {
    const fn semaphore_hle_blocked(&self) -> bool {
        self.config.hle_gfx || self.config.hle_aud
    }

    /// MFC0: reads `rd & 0xF` into the caller, applying read side effects.
    pub fn read_control(&mut self, rd: u8, rt: ScalarRegister) -> u32 {
        let register = ControlRegister::from_index(rd);
        let value = self.registers.get(register);
        match register {
            ControlRegister::SpSemaphore => {
                if self.config.mend_semaphore_lock && !self.semaphore_hle_blocked() {
                    self.registers.set(ControlRegister::SpSemaphore, 1);
                    self.registers.set_status_bits(SP_STATUS_HALT);
                }
            }
            ControlRegister::SpStatus => {
                if self.config.wait_for_cpu_host {
                    let reads = &mut self.latches.status_reads[rt.index()];
                    *reads = reads.saturating_add(1);
                    if *reads >= self.latches.status_timeout {
                        self.registers.set_status_bits(SP_STATUS_HALT);
                    }
                }
            }
            _ => {}
        }
        value
    }

    /// MTC0: writes `value` to `rd & 0xF` through its handler.
    pub fn write_control(&mut self, rd: u8, value: u32) {
        let register = ControlRegister::from_index(rd);
        match register {
            ControlRegister::SpMemAddr | ControlRegister::SpDramAddr => {
                self.registers.set(register, value & !7);
            }
            ControlRegister::SpRdLen => {
                self.registers.set(register, value | 7);
                self.run_dma(DmaDirection::DramToScratch, value | 7);
            }
            ControlRegister::SpWrLen => {
                self.registers.set(register, value | 7);
                self.run_dma(DmaDirection::ScratchToDram, value | 7);
            }
            ControlRegister::SpStatus => self.write_sp_status(value),
            ControlRegister::SpDmaFull
            | ControlRegister::SpDmaBusy
            | ControlRegister::DpcCurrent
            | ControlRegister::DpcBufBusy
            | ControlRegister::DpcPipeBusy
            | ControlRegister::DpcTmem => {
                self.report(Diagnostic::ReadOnlyControlRegister {
                    index: register.index(),
                });
            }
            ControlRegister::SpSemaphore => {
                if !self.semaphore_hle_blocked() {
                    self.registers.set(register, 0);
                }
            }
            ControlRegister::DpcStart => {
                if self.registers.get(ControlRegister::DpcBufBusy) != 0 {
                    self.report(Diagnostic::DpcStartWhileBusy);
                }
                let start = value & !7;
                self.registers.set(ControlRegister::DpcStart, start);
                self.registers.set(ControlRegister::DpcCurrent, start);
                self.registers.set(ControlRegister::DpcEnd, start);
            }
            ControlRegister::DpcEnd => {
                self.registers.set(register, value & !7);
                self.dispatch_rdp_list();
            }
            ControlRegister::DpcStatus => self.write_dpc_status(value),
            ControlRegister::DpcClock => {
                self.report(Diagnostic::DpcClockWrite { value });
                self.registers.set(register, value);
            }
        }
    }

    fn run_dma(&mut self, direction: DmaDirection, length: u32) {
        let scratch_addr = self.registers.get(ControlRegister::SpMemAddr);
        let dram_addr = self.registers.get(ControlRegister::SpDramAddr);
        let mut pending = Vec::new();
        dma::transfer(
            &mut self.scratch,
            &mut self.dram,
            scratch_addr,
            dram_addr,
            length,
            direction,
            |diagnostic| pending.push(diagnostic),
        );
        for diagnostic in pending {
            self.report(diagnostic);
        }
        self.registers.set(ControlRegister::SpDmaBusy, 0);
        self.registers.clear_status_bits(SP_STATUS_DMA_BUSY);
    }

    fn write_sp_status(&mut self, value: u32) {
        if value & SP_STATUS_RESERVED_BITS != 0 {
            self.report(Diagnostic::StatusReservedBits {
                bits: value & SP_STATUS_RESERVED_BITS,
            });
        }
        let mut status = self.registers.status();
        status = clear_set(status, value, 0x01, 0x02, SP_STATUS_HALT);
        if value & 0x04 != 0 {
            status &= !SP_STATUS_BROKE;
        }
        if value & 0x08 != 0 {
            self.registers.mi_intr &= !MI_INTR_SP;
        }
        let raise = value & 0x10 != 0;
        if raise {
            self.registers.mi_intr |= MI_INTR_SP;
        }
        if raise {
            status |= SP_STATUS_HALT;
        }
        if value & 0x20 != 0 {
            status &= !SP_STATUS_SSTEP;
        }
        status = clear_set(status, value, 0x80, 0x100, SP_STATUS_INTR_BREAK);
        for signal in 0..8 {
            let clear_bit = 1 << (9 + 2 * signal);
            status = clear_set(status, value, clear_bit, clear_bit << 1, SP_STATUS_SIG0 << signal);
        }
        self.registers.set(ControlRegister::SpStatus, status);
        if raise {
            self.host.check_interrupts();
        }
    }

    fn write_dpc_status(&mut self, value: u32) {
        if value & DPC_STATUS_RESERVED_BITS != 0 {
            self.report(Diagnostic::DpcStatusReservedBits {
                bits: value & DPC_STATUS_RESERVED_BITS,
            });
        }
        let mut status = self.registers.get(ControlRegister::DpcStatus);
        status = clear_set(status, value, 0x01, 0x02, DPC_STATUS_XBUS_DMEM_DMA);
        status = clear_set(status, value, 0x04, 0x08, DPC_STATUS_FREEZE);
        status = clear_set(status, value, 0x10, 0x20, DPC_STATUS_FLUSH);
        self.registers.set(ControlRegister::DpcStatus, status);
        if value & 0x40 != 0 {
            self.registers.set(ControlRegister::DpcTmem, 0);
        }
        if value & 0x200 != 0 {
            self.registers.set(ControlRegister::DpcClock, 0);
        }
    }

    fn dispatch_rdp_list(&mut self) {
        if self.host.process_rdp_list().is_unsupported() && !self.latches.rdp_warned {
            self.latches.rdp_warned = true;
            log::warn!("host has no RDP command list handler; DPC_END writes are ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_indices_match_rd_field() {
        for (index, register) in CONTROL_REGISTERS.iter().enumerate() {
            assert_eq!(usize::from(register.index()), index);
            assert_eq!(ControlRegister::from_index(index as u8 + 16), *register);
        }
        assert_eq!(ControlRegister::DpcTmem.name(), "DPC_TMEM");
    }

    #[test]
    fn clear_set_pairs() {
        assert_eq!(clear_set(0, 0b10, 0b01, 0b10, 0x40), 0x40);
        assert_eq!(clear_set(0x41, 0b01, 0b01, 0b10, 0x40), 0x01);
        assert_eq!(clear_set(0x41, 0, 0b01, 0b10, 0x40), 0x41);
    }

    #[test]
    fn status_helpers() {
        let mut registers = RcpRegisters::new();
        registers.set_status_bits(SP_STATUS_HALT | SP_STATUS_BROKE);
        registers.clear_status_bits(SP_STATUS_HALT);
        assert_eq!(registers.status(), SP_STATUS_BROKE);
    }
}
