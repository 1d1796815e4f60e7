//! Host-facing API: configuration, callbacks, the borrowed memory map and
//! the [`Rsp`] context that owns the unit's private state.

use thiserror::Error;

use crate::control::{
    ControlLatches, ControlRegister, RcpRegisters, DPC_STATUS_FREEZE, INTERRUPTED_STATUS_TIMEOUT,
    MI_INTR_SP, SP_STATUS_BROKE, SP_STATUS_HALT, SP_STATUS_INTR_BREAK, SP_STATUS_SIG2,
};
use crate::diag::{Diagnostic, DiagnosticCounters};
use crate::execute::{step_one, Machine};
use crate::memory::{
    DramView, MemoryLayout, ScratchView, BOOT_VECTOR, SCRATCH_BYTES, TASK_DATA_PTR_OFFSET,
    TASK_TYPE_OFFSET,
};
use crate::state::{ArchitecturalState, SCALAR_REGISTER_COUNT};

/// Answer from an optional host callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HostResponse {
    /// The host performed the requested work.
    Handled,
    /// The host has no handler for this request.
    #[default]
    Unsupported,
}

impl HostResponse {
    /// `true` for [`HostResponse::Unsupported`].
    #[must_use]
    pub const fn is_unsupported(self) -> bool {
        matches!(self, Self::Unsupported)
    }
}

/// Callbacks into the embedding emulator. Every method has a default so
/// hosts implement only what they support.
pub trait RspHost {
    /// Re-evaluates `MI_INTR` after the SP interrupt was raised.
    fn check_interrupts(&mut self) {}

    /// High-level graphics task processing.
    fn process_display_list(&mut self) -> HostResponse {
        HostResponse::Unsupported
    }

    /// High-level audio task processing.
    fn process_audio_list(&mut self) -> HostResponse {
        HostResponse::Unsupported
    }

    /// RDP command list submission after a `DPC_END` write.
    fn process_rdp_list(&mut self) -> HostResponse {
        HostResponse::Unsupported
    }

    /// Framebuffer presentation for HVQM tasks.
    fn show_cfb(&mut self) -> HostResponse {
        HostResponse::Unsupported
    }

    /// Receives every diagnostic. The default logs it at warn level.
    fn message(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
    }
}

/// Host without any callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NullHost;

impl RspHost for NullHost {}

/// Behavior switches for one [`Rsp`] instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct RspConfig {
    /// Hand graphics tasks to [`RspHost::process_display_list`].
    pub hle_gfx: bool,
    /// Hand audio tasks to [`RspHost::process_audio_list`].
    pub hle_aud: bool,
    /// Reading `SP_SEMAPHORE` acquires it.
    pub mend_semaphore_lock: bool,
    /// Halt after repeated `SP_STATUS` polling so the host CPU can run.
    pub wait_for_cpu_host: bool,
    /// Storage layout of the scratch and DRAM slices.
    pub memory_layout: MemoryLayout,
    /// Maximum instructions per `do_cycles` call.
    pub instruction_limit: Option<u64>,
}

/// Task tag stored at DMEM `0xFC0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum TaskType {
    Gfx,
    Audio,
    Video,
    Jpeg,
    Null,
    Hvq,
    Hvqm,
}

impl TaskType {
    /// Decodes a task tag.
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(Self::Gfx),
            2 => Some(Self::Audio),
            3 => Some(Self::Video),
            4 => Some(Self::Jpeg),
            5 => Some(Self::Null),
            6 => Some(Self::Hvq),
            7 => Some(Self::Hvqm),
            _ => None,
        }
    }

    /// Numeric tag of this task type.
    #[must_use]
    pub const fn tag(self) -> u32 {
        self as u32 + 1
    }
}

/// Why the last `do_cycles` call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunExit {
    /// HALT or BROKE was already set; nothing ran.
    HaltedOnEntry,
    /// The task was handed to the host.
    Deferred {
        /// Deferred task type.
        task: TaskType,
    },
    /// A BREAK retired.
    Broke,
    /// Halted with the SP interrupt pending; the host was asked to check it.
    Interrupted,
    /// Halted while `SP_SEMAPHORE` was held.
    SemaphoreHeld,
    /// Halted by status polling under `wait_for_cpu_host`.
    WaitingOnHost,
    /// Halted with no explanation; reported as `SP_SET_HALT`.
    Unclaimed,
    /// The instruction limit ran out before the unit halted.
    LimitReached,
}

/// Construction errors for [`MemoryMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MemoryMapError {
    /// The scratch slice cannot hold DMEM and IMEM.
    #[error("scratch memory holds {len} bytes, need at least {required}")]
    ScratchTooSmall {
        /// Supplied length.
        len: usize,
        /// Minimum length.
        required: usize,
    },
    /// DRAM must consist of whole 32-bit words.
    #[error("DRAM length {len} is not a multiple of 4")]
    DramNotWordAligned {
        /// Supplied length.
        len: usize,
    },
}

/// Host memory and registers lent to the unit for one or more runs.
#[derive(Debug)]
pub struct MemoryMap<'a> {
    dram: &'a mut [u8],
    scratch: &'a mut [u8],
    registers: &'a mut RcpRegisters,
}

impl<'a> MemoryMap<'a> {
    /// Validates and wraps host memory.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryMapError::ScratchTooSmall`] when `scratch` is under
    /// 8 KiB and [`MemoryMapError::DramNotWordAligned`] when the DRAM
    /// length is not a multiple of four.
    pub fn new(
        dram: &'a mut [u8],
        scratch: &'a mut [u8],
        registers: &'a mut RcpRegisters,
    ) -> Result<Self, MemoryMapError> {
        if scratch.len() < SCRATCH_BYTES {
            return Err(MemoryMapError::ScratchTooSmall {
                len: scratch.len(),
                required: SCRATCH_BYTES,
            });
        }
        if dram.len() % 4 != 0 {
            return Err(MemoryMapError::DramNotWordAligned { len: dram.len() });
        }
        Ok(Self {
            dram,
            scratch,
            registers,
        })
    }

    /// RCP registers.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn registers(&self) -> &RcpRegisters {
        self.registers
    }

    /// Mutable RCP registers.
    #[allow(clippy::missing_const_for_fn)]
    pub fn registers_mut(&mut self) -> &mut RcpRegisters {
        self.registers
    }

    /// Layout-aware view of DMEM and IMEM.
    pub fn scratch(&mut self, layout: MemoryLayout) -> ScratchView<'_> {
        ScratchView::new(self.scratch, layout)
    }

    /// Layout-aware view of DRAM.
    pub fn dram(&mut self, layout: MemoryLayout) -> DramView<'_> {
        DramView::new(self.dram, layout)
    }
}

/// The RSP context: register files, accumulator, flags, divide latches and
/// per-instance bookkeeping. Memory is borrowed per call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Rsp {
    state: ArchitecturalState,
    config: RspConfig,
    counters: DiagnosticCounters,
    latches: ControlLatches,
    last_exit: Option<RunExit>,
}

impl Rsp {
    /// Creates a unit with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a unit with `config`.
    #[must_use]
    pub fn with_config(config: RspConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &RspConfig {
        &self.config
    }

    /// Register files and program counter.
    #[must_use]
    pub const fn state(&self) -> &ArchitecturalState {
        &self.state
    }

    /// Mutable register files and program counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn state_mut(&mut self) -> &mut ArchitecturalState {
        &mut self.state
    }

    /// Diagnostic tallies since creation or the last reset.
    #[must_use]
    pub const fn diagnostics(&self) -> &DiagnosticCounters {
        &self.counters
    }

    /// Zeroes the diagnostic tallies.
    pub fn reset_diagnostics(&mut self) {
        self.counters.reset();
    }

    /// Exit reason of the most recent `do_cycles` call.
    #[must_use]
    pub const fn last_exit(&self) -> Option<RunExit> {
        self.last_exit
    }

    /// `true` once the missing RDP handler warning has been logged.
    #[must_use]
    pub const fn rdp_warned(&self) -> bool {
        self.latches.rdp_warned
    }

    /// Points `SP_PC` at the boot vector. Register and memory contents are
    /// left alone.
    pub fn reset(&mut self, map: &mut MemoryMap<'_>) {
        map.registers.sp_pc = BOOT_VECTOR;
        self.state.set_pc(BOOT_VECTOR);
        self.state.take_branch_target();
    }

    /// Runs the task described by DMEM until the unit halts.
    ///
    /// Returns 0 when HALT or BROKE is set on entry, otherwise `cycles`
    /// unchanged.
    pub fn do_cycles(
        &mut self,
        map: &mut MemoryMap<'_>,
        host: &mut dyn RspHost,
        cycles: u32,
    ) -> u32 {
        let status = map.registers.status();
        if status & (SP_STATUS_HALT | SP_STATUS_BROKE) != 0 {
            self.report(host, Diagnostic::HaltedOnEntry { status });
            self.last_exit = Some(RunExit::HaltedOnEntry);
            return 0;
        }

        let scratch = map.scratch(self.config.memory_layout);
        let tag = scratch.dmem_u32(TASK_TYPE_OFFSET);
        let data_ptr = scratch.dmem_u32(TASK_DATA_PTR_OFFSET);
        let task = TaskType::from_tag(tag);
        log::trace!("rsp run: task tag {tag} ({task:?}) pc {:#05x}", map.registers.sp_pc & 0xFFC);

        match task {
            Some(TaskType::Gfx) if self.config.hle_gfx && data_ptr != 0 => {
                let response = host.process_display_list();
                self.finish_deferred(map, host, TaskType::Gfx, response);
                let dpc_status = map.registers.get(ControlRegister::DpcStatus);
                map.registers
                    .set(ControlRegister::DpcStatus, dpc_status & !DPC_STATUS_FREEZE);
                return cycles;
            }
            Some(TaskType::Audio) if self.config.hle_aud => {
                let response = host.process_audio_list();
                self.finish_deferred(map, host, TaskType::Audio, response);
                return cycles;
            }
            Some(task @ (TaskType::Video | TaskType::Null | TaskType::Hvq)) => {
                self.report(host, Diagnostic::UnhandledTask { task });
            }
            Some(TaskType::Hvqm) => {
                host.show_cfb();
            }
            _ => {}
        }

        self.run_task(map, host);
        cycles
    }

    fn report(&mut self, host: &mut dyn RspHost, diagnostic: Diagnostic) {
        self.counters.record(diagnostic);
        host.message(diagnostic);
    }

    fn finish_deferred(
        &mut self,
        map: &mut MemoryMap<'_>,
        host: &mut dyn RspHost,
        task: TaskType,
        response: HostResponse,
    ) {
        log::debug!("{task:?} task deferred to host ({response:?})");
        map.registers
            .set_status_bits(SP_STATUS_SIG2 | SP_STATUS_BROKE | SP_STATUS_HALT);
        if map.registers.status() & SP_STATUS_INTR_BREAK != 0 {
            map.registers.mi_intr |= MI_INTR_SP;
            host.check_interrupts();
        }
        self.last_exit = Some(RunExit::Deferred { task });
    }

    fn run_task(&mut self, map: &mut MemoryMap<'_>, host: &mut dyn RspHost) {
        let layout = self.config.memory_layout;
        self.latches.status_reads = [0; SCALAR_REGISTER_COUNT];
        self.state.set_pc(map.registers.sp_pc);

        let mut machine = Machine {
            state: &mut self.state,
            scratch: ScratchView::new(map.scratch, layout),
            dram: DramView::new(map.dram, layout),
            registers: map.registers,
            host,
            config: &self.config,
            latches: &mut self.latches,
            counters: &mut self.counters,
        };

        let mut executed: u64 = 0;
        let mut limited = false;
        while machine.is_running() {
            if machine
                .config
                .instruction_limit
                .is_some_and(|limit| executed >= limit)
            {
                limited = true;
                break;
            }
            step_one(&mut machine);
            executed += 1;
        }

        machine.registers.sp_pc = BOOT_VECTOR | machine.state.pc();
        let exit = if limited {
            RunExit::LimitReached
        } else {
            classify_halt(&mut machine)
        };
        log::trace!("rsp run finished: {exit:?} after {executed} instructions");
        self.last_exit = Some(exit);
    }
}

fn classify_halt(machine: &mut Machine<'_>) -> RunExit {
    if machine.registers.status() & SP_STATUS_BROKE != 0 {
        return RunExit::Broke;
    }
    let exit = if machine.registers.mi_intr & MI_INTR_SP != 0 {
        machine.host.check_interrupts();
        RunExit::Interrupted
    } else if machine.registers.get(ControlRegister::SpSemaphore) != 0 {
        RunExit::SemaphoreHeld
    } else if machine.config.wait_for_cpu_host {
        machine.latches.status_timeout = INTERRUPTED_STATUS_TIMEOUT;
        RunExit::WaitingOnHost
    } else {
        machine.report(Diagnostic::UnclaimedHalt);
        RunExit::Unclaimed
    };
    machine.registers.clear_status_bits(SP_STATUS_HALT);
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{new_scratch_memory, IMEM_START};

    #[derive(Default)]
    struct RecordingHost {
        display_lists: u32,
        audio_lists: u32,
        interrupts: u32,
        cfb: u32,
        messages: Vec<Diagnostic>,
    }

    impl RspHost for RecordingHost {
        fn check_interrupts(&mut self) {
            self.interrupts += 1;
        }

        fn process_display_list(&mut self) -> HostResponse {
            self.display_lists += 1;
            HostResponse::Handled
        }

        fn process_audio_list(&mut self) -> HostResponse {
            self.audio_lists += 1;
            HostResponse::Handled
        }

        fn show_cfb(&mut self) -> HostResponse {
            self.cfb += 1;
            HostResponse::Handled
        }

        fn message(&mut self, diagnostic: Diagnostic) {
            self.messages.push(diagnostic);
        }
    }

    fn load(scratch: &mut [u8], program: &[u32]) {
        for (i, word) in program.iter().enumerate() {
            let at = usize::from(IMEM_START) + 4 * i;
            scratch[at..at + 4].copy_from_slice(&word.to_be_bytes());
        }
    }

    fn set_task(scratch: &mut [u8], tag: u32, data_ptr: u32) {
        scratch[0xFC0..0xFC4].copy_from_slice(&tag.to_be_bytes());
        scratch[0xFF0..0xFF4].copy_from_slice(&data_ptr.to_be_bytes());
    }

    const BREAK: u32 = 0x0000_000D;

    #[test]
    fn memory_map_rejects_short_scratch_and_odd_dram() {
        let mut registers = RcpRegisters::new();
        let mut scratch = vec![0u8; 0x1000];
        let mut dram = vec![0u8; 16];
        let err = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap_err();
        assert_eq!(
            err,
            MemoryMapError::ScratchTooSmall {
                len: 0x1000,
                required: SCRATCH_BYTES
            }
        );

        let mut scratch = new_scratch_memory();
        let mut dram = vec![0u8; 6];
        let err = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap_err();
        assert_eq!(err.to_string(), "DRAM length 6 is not a multiple of 4");
    }

    #[test]
    fn halted_on_entry_returns_zero() {
        let mut registers = RcpRegisters::new();
        registers.set_status_bits(SP_STATUS_HALT);
        let mut scratch = new_scratch_memory();
        let mut dram = vec![0u8; 64];
        let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
        let mut host = RecordingHost::default();
        let mut rsp = Rsp::new();
        assert_eq!(rsp.do_cycles(&mut map, &mut host, 100), 0);
        assert_eq!(rsp.last_exit(), Some(RunExit::HaltedOnEntry));
        assert_eq!(host.messages, vec![Diagnostic::HaltedOnEntry { status: 1 }]);
    }

    #[test]
    fn hle_gfx_defers_and_signals() {
        let mut registers = RcpRegisters::new();
        registers.set_status_bits(SP_STATUS_INTR_BREAK);
        registers.set(ControlRegister::DpcStatus, DPC_STATUS_FREEZE | 1);
        let mut scratch = new_scratch_memory();
        set_task(&mut scratch, 1, 0x0010_0000);
        let mut dram = vec![0u8; 64];
        let mut host = RecordingHost::default();
        let mut rsp = Rsp::with_config(RspConfig {
            hle_gfx: true,
            ..RspConfig::default()
        });
        {
            let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
            assert_eq!(rsp.do_cycles(&mut map, &mut host, 500), 500);
        }
        assert_eq!(host.display_lists, 1);
        assert_eq!(host.interrupts, 1);
        assert_eq!(registers.mi_intr, MI_INTR_SP);
        let expected = SP_STATUS_SIG2 | SP_STATUS_BROKE | SP_STATUS_HALT | SP_STATUS_INTR_BREAK;
        assert_eq!(registers.status(), expected);
        assert_eq!(registers.get(ControlRegister::DpcStatus), 1);
        assert_eq!(
            rsp.last_exit(),
            Some(RunExit::Deferred {
                task: TaskType::Gfx
            })
        );
    }

    #[test]
    fn gfx_without_data_pointer_is_interpreted() {
        let mut registers = RcpRegisters::new();
        let mut scratch = new_scratch_memory();
        set_task(&mut scratch, 1, 0);
        load(&mut scratch, &[BREAK]);
        let mut dram = vec![0u8; 64];
        let mut host = RecordingHost::default();
        let mut rsp = Rsp::with_config(RspConfig {
            hle_gfx: true,
            ..RspConfig::default()
        });
        let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
        rsp.do_cycles(&mut map, &mut host, 10);
        assert_eq!(host.display_lists, 0);
        assert_eq!(rsp.last_exit(), Some(RunExit::Broke));
    }

    #[test]
    fn hle_audio_defers_without_touching_dpc() {
        let mut registers = RcpRegisters::new();
        registers.set(ControlRegister::DpcStatus, DPC_STATUS_FREEZE);
        let mut scratch = new_scratch_memory();
        set_task(&mut scratch, 2, 0);
        let mut dram = vec![0u8; 64];
        let mut host = RecordingHost::default();
        let mut rsp = Rsp::with_config(RspConfig {
            hle_aud: true,
            ..RspConfig::default()
        });
        {
            let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
            rsp.do_cycles(&mut map, &mut host, 1);
        }
        assert_eq!(host.audio_lists, 1);
        assert_eq!(host.interrupts, 0);
        assert_eq!(registers.get(ControlRegister::DpcStatus), DPC_STATUS_FREEZE);
    }

    #[test]
    fn hvqm_shows_framebuffer_then_interprets() {
        let mut registers = RcpRegisters::new();
        let mut scratch = new_scratch_memory();
        set_task(&mut scratch, 7, 0);
        load(&mut scratch, &[BREAK]);
        let mut dram = vec![0u8; 64];
        let mut host = RecordingHost::default();
        let mut rsp = Rsp::new();
        let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
        rsp.do_cycles(&mut map, &mut host, 10);
        assert_eq!(host.cfb, 1);
        assert_eq!(rsp.last_exit(), Some(RunExit::Broke));
    }

    #[test]
    fn unclaimed_halt_is_reported_and_cleared() {
        // mtc0 $1, SP_STATUS with $1 = 2 (set HALT)
        let program = [0x2401_0002, 0x4081_2000, BREAK];
        let mut registers = RcpRegisters::new();
        let mut scratch = new_scratch_memory();
        load(&mut scratch, &program);
        let mut dram = vec![0u8; 64];
        let mut host = RecordingHost::default();
        let mut rsp = Rsp::new();
        {
            let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
            rsp.do_cycles(&mut map, &mut host, 10);
        }
        assert_eq!(rsp.last_exit(), Some(RunExit::Unclaimed));
        assert_eq!(host.messages, vec![Diagnostic::UnclaimedHalt]);
        assert_eq!(registers.status() & SP_STATUS_HALT, 0);
        assert_eq!(registers.sp_pc, BOOT_VECTOR | 8);
    }

    #[test]
    fn instruction_limit_stops_without_halting() {
        // j 0 ; nop
        let program = [0x0800_0000, 0];
        let mut registers = RcpRegisters::new();
        let mut scratch = new_scratch_memory();
        load(&mut scratch, &program);
        let mut dram = vec![0u8; 64];
        let mut rsp = Rsp::with_config(RspConfig {
            instruction_limit: Some(101),
            ..RspConfig::default()
        });
        {
            let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
            assert_eq!(rsp.do_cycles(&mut map, &mut NullHost, 7), 7);
        }
        assert_eq!(rsp.last_exit(), Some(RunExit::LimitReached));
        assert_eq!(rsp.diagnostics().instructions, 101);
        assert_eq!(registers.status() & SP_STATUS_HALT, 0);
        assert_eq!(registers.sp_pc, BOOT_VECTOR | 4);
    }

    #[test]
    fn reset_points_at_boot_vector() {
        let mut registers = RcpRegisters::new();
        registers.sp_pc = 0x0400_1234;
        let mut scratch = new_scratch_memory();
        scratch[0] = 0x5A;
        let mut dram = vec![0u8; 64];
        let mut rsp = Rsp::new();
        {
            let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
            rsp.reset(&mut map);
        }
        assert_eq!(registers.sp_pc, BOOT_VECTOR);
        assert_eq!(scratch[0], 0x5A);
        assert_eq!(rsp.state().pc(), 0);
    }

    #[test]
    fn task_tags_round_trip() {
        for tag in 1..=7 {
            let task = TaskType::from_tag(tag).unwrap();
            assert_eq!(task.tag(), tag);
        }
        assert_eq!(TaskType::from_tag(0), None);
        assert_eq!(TaskType::from_tag(8), None);
    }
}
