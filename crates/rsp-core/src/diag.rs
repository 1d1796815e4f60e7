//! Advisory diagnostics raised while interpreting RSP code.
//!
//! Nothing here is an error in the `Result` sense: every anomaly has a
//! defined degenerate behavior and execution continues. Diagnostics are
//! forwarded to [`crate::RspHost::message`] and tallied in
//! [`DiagnosticCounters`].

use thiserror::Error;

use crate::encoding::VectorMemoryOpcode;

/// Stable diagnostic classes used for counter aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum DiagnosticClass {
    /// Reserved or unrecognized instruction encodings.
    Decode = 0x01,
    /// Vector load/store rejected or reduced.
    Transfer = 0x02,
    /// Control register anomalies.
    Control = 0x03,
    /// DMA transfers touching unusual ranges.
    Dma = 0x04,
    /// Task dispatch notices.
    Task = 0x05,
}

impl DiagnosticClass {
    /// Converts the class to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte value back into a class.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Decode),
            0x02 => Some(Self::Transfer),
            0x03 => Some(Self::Control),
            0x04 => Some(Self::Dma),
            0x05 => Some(Self::Task),
            _ => None,
        }
    }
}

/// Why a vector load or store was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TransferRejection {
    /// Element selector is not legal for this opcode.
    IllegalElement,
    /// Element selector must be even.
    OddElement,
    /// Address falls on a position the unit cannot service.
    WeirdAddress,
    /// Address must be even.
    OddAddress,
    /// Transposed access with an unaligned register group or address.
    UncertainCase,
    /// Opcode is recognized but has no transfer implementation.
    Unimplemented,
}

impl core::fmt::Display for TransferRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Self::IllegalElement => "Illegal element.",
            Self::OddElement => "Odd element.",
            Self::WeirdAddress => "Weird addr.",
            Self::OddAddress => "Odd addr.",
            Self::UncertainCase => "Uncertain case!",
            Self::Unimplemented => "Unimplemented.",
        };
        f.write_str(text)
    }
}

/// A single advisory notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Diagnostic {
    /// Scalar word with no defined meaning; executed as a no-op.
    #[error("RESERVED instruction {word:#010x}")]
    ReservedInstruction {
        /// Raw instruction word.
        word: u32,
    },
    /// COP2 vector function without a defined opcode.
    #[error("C2 RESERVED function {funct}")]
    ReservedVectorOperation {
        /// Six-bit function field.
        funct: u8,
    },
    /// LWC2/SWC2 table slot without a defined opcode.
    #[error(
        "{}WC2    $v{vt:02}[0x{element:X}], 0x{offset:03X}(${base:02})",
        transfer_letter(.store)
    )]
    ReservedVectorTransfer {
        /// `true` for SWC2.
        store: bool,
        /// Vector register field.
        vt: u8,
        /// Element field.
        element: u8,
        /// Raw seven-bit offset field.
        offset: u8,
        /// Base scalar register.
        base: u8,
    },
    /// Vector load/store rejected before any byte moved.
    #[error("{opcode:?}: {reason}")]
    SkippedTransfer {
        /// Rejected opcode.
        opcode: VectorMemoryOpcode,
        /// Rejection cause.
        reason: TransferRejection,
    },
    /// `do_cycles` entered while HALT or BROKE was set.
    #[error("SP_STATUS_HALT on RSP entry (status {status:#x})")]
    HaltedOnEntry {
        /// Status register at entry.
        status: u32,
    },
    /// The scalar loop stopped without BREAK and nobody claims the halt.
    #[error("SP_SET_HALT")]
    UnclaimedHalt,
    /// MTC0 to `SP_STATUS` with reserved or unsupported bits set.
    #[error("MTC0 to SP_STATUS with unsupported bits {bits:#010x}")]
    StatusReservedBits {
        /// Offending bits.
        bits: u32,
    },
    /// MTC0 to a register the RSP may not write.
    #[error("Invalid MTC0 from SR[{index}].")]
    ReadOnlyControlRegister {
        /// Control register index.
        index: u8,
    },
    /// `DPC_START` written while the command buffer is busy.
    #[error("DPC_START written while DPC buffer busy")]
    DpcStartWhileBusy,
    /// MTC0 to `DPC_STATUS` with unsupported bits set.
    #[error("MTC0 to DPC_STATUS with unsupported bits {bits:#010x}")]
    DpcStatusReservedBits {
        /// Offending bits.
        bits: u32,
    },
    /// RSP wrote the DPC clock counter.
    #[error("DPC_CLOCK written with {value:#010x}")]
    DpcClockWrite {
        /// Written value.
        value: u32,
    },
    /// A DMA row straddles the DMEM/IMEM boundary.
    #[error("DMA crosses DMEM/IMEM boundary at {scratch:#06x}")]
    DmaCrossesBoundary {
        /// Scratch start of the row.
        scratch: u32,
    },
    /// DMA touched DRAM past the host slice.
    #[error("DMA outside DRAM at {dram:#08x}")]
    DmaOutOfRange {
        /// First offending DRAM address.
        dram: u32,
    },
    /// Task type the core interprets without a dedicated handler.
    #[error("{task:?} task type interpreted directly")]
    UnhandledTask {
        /// Task tag read from DMEM.
        task: crate::TaskType,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn transfer_letter(store: &bool) -> char {
    if *store {
        'S'
    } else {
        'L'
    }
}

impl Diagnostic {
    /// Returns the aggregation class of this diagnostic.
    #[must_use]
    pub const fn class(self) -> DiagnosticClass {
        match self {
            Self::ReservedInstruction { .. }
            | Self::ReservedVectorOperation { .. }
            | Self::ReservedVectorTransfer { .. } => DiagnosticClass::Decode,
            Self::SkippedTransfer { .. } => DiagnosticClass::Transfer,
            Self::HaltedOnEntry { .. }
            | Self::UnclaimedHalt
            | Self::StatusReservedBits { .. }
            | Self::ReadOnlyControlRegister { .. }
            | Self::DpcStartWhileBusy
            | Self::DpcStatusReservedBits { .. }
            | Self::DpcClockWrite { .. } => DiagnosticClass::Control,
            Self::DmaCrossesBoundary { .. } | Self::DmaOutOfRange { .. } => DiagnosticClass::Dma,
            Self::UnhandledTask { .. } => DiagnosticClass::Task,
        }
    }
}

/// Saturating tallies of everything the core has reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiagnosticCounters {
    /// The most recent diagnostic, if any.
    pub last: Option<Diagnostic>,
    /// Decode-class count.
    pub decode: u32,
    /// Transfer-class count.
    pub transfer: u32,
    /// Control-class count.
    pub control: u32,
    /// DMA-class count.
    pub dma: u32,
    /// Task-class count.
    pub task: u32,
    /// Instructions retired since the last reset of the counters.
    pub instructions: u64,
}

impl DiagnosticCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one diagnostic.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.last = Some(diagnostic);
        let counter = match diagnostic.class() {
            DiagnosticClass::Decode => &mut self.decode,
            DiagnosticClass::Transfer => &mut self.transfer,
            DiagnosticClass::Control => &mut self.control,
            DiagnosticClass::Dma => &mut self.dma,
            DiagnosticClass::Task => &mut self.task,
        };
        *counter = counter.saturating_add(1);
    }

    /// Increments the retired instruction counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn increment_instructions(&mut self) {
        self.instructions = self.instructions.saturating_add(1);
    }

    /// Returns the count for one class.
    #[must_use]
    pub const fn count(&self, class: DiagnosticClass) -> u32 {
        match class {
            DiagnosticClass::Decode => self.decode,
            DiagnosticClass::Transfer => self.transfer,
            DiagnosticClass::Control => self.control,
            DiagnosticClass::Dma => self.dma,
            DiagnosticClass::Task => self.task,
        }
    }

    /// Sum over all classes.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.decode as u64
            + self.transfer as u64
            + self.control as u64
            + self.dma as u64
            + self.task as u64
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
