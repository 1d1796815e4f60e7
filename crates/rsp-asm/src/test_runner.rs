//! BREAK-driven execution of `rsptest` blocks.
//!
//! ## Execution Model
//!
//! 1. Load the image into IMEM at offset 0 with DMEM zeroed and `SP_PC`
//!    at the start of IMEM.
//! 2. For each block in document order:
//!    a. Clear HALT and BROKE, then run until the unit halts.
//!    b. Evaluate every assertion against the machine state.
//!    c. Keep the diagnostics the run produced with the block result.
//! 3. A run that exhausts the instruction limit faults its block; later
//!    blocks are reported as unexecuted.

use std::fmt;

use rsp_core::{
    new_scratch_memory, Diagnostic, MemoryMap, RcpRegisters, Rsp, RspConfig, RspHost, RunExit,
    ScalarRegister, ScratchView, IMEM_START, SP_STATUS_BROKE, SP_STATUS_HALT,
};

use crate::test_format::{AccumulatorSlice, Assertion, ParsedTestBlock, Target, VectorControl};

/// DRAM lent to the unit during test runs.
pub const TEST_DRAM_BYTES: usize = 0x80_0000;

/// Instructions one block may execute before it is declared runaway.
pub const DEFAULT_INSTRUCTION_LIMIT: u64 = 1_000_000;

/// Result of evaluating a single assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// The assertion.
    pub assertion: Assertion,
    /// Whether it held.
    pub passed: bool,
    /// Observed value, formatted at the target's width.
    pub actual: String,
}

/// Result of running one test block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBlockResult {
    /// 1-indexed line of the opening fence.
    pub start_line: usize,
    /// 1-indexed line of the closing fence.
    pub end_line: usize,
    /// Per-assertion outcomes.
    pub assertion_results: Vec<AssertionResult>,
    /// Why the run before this block stopped.
    pub exit: Option<RunExit>,
    /// Diagnostics raised while running up to this block.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the run never reached a halt.
    pub faulted: bool,
    /// Explanation when faulted.
    pub fault_message: Option<String>,
}

impl TestBlockResult {
    /// True if no fault occurred and every assertion held.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.faulted && self.assertion_results.iter().all(|r| r.passed)
    }
}

/// Results for every block of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRunResult {
    /// Executed blocks in order.
    pub block_results: Vec<TestBlockResult>,
    /// Blocks skipped after a runaway run.
    pub unexecuted_blocks: usize,
}

impl TestRunResult {
    /// True if every block ran and passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.unexecuted_blocks == 0 && self.block_results.iter().all(TestBlockResult::passed)
    }

    /// Counts for the summary line.
    #[must_use]
    pub fn summary(&self) -> TestSummary {
        let passed = self.block_results.iter().filter(|b| b.passed()).count();
        let failed = self.block_results.len() - passed;
        TestSummary {
            passed,
            failed,
            unexecuted: self.unexecuted_blocks,
            total: self.block_results.len() + self.unexecuted_blocks,
        }
    }
}

/// Summary counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestSummary {
    /// Blocks that passed.
    pub passed: usize,
    /// Blocks that failed.
    pub failed: usize,
    /// Blocks never reached.
    pub unexecuted: usize,
    /// All blocks.
    pub total: usize,
}

#[derive(Debug, Default)]
struct CollectingHost {
    diagnostics: Vec<Diagnostic>,
}

impl RspHost for CollectingHost {
    fn message(&mut self, diagnostic: Diagnostic) {
        log::debug!("rsp diagnostic: {diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

/// An RSP with its own scratch memory, DRAM and registers.
#[derive(Debug)]
pub struct TestBench {
    rsp: Rsp,
    scratch: Box<[u8]>,
    dram: Vec<u8>,
    registers: RcpRegisters,
    host: CollectingHost,
}

impl TestBench {
    /// Creates a bench with `image` loaded at IMEM offset 0.
    ///
    /// Bytes past the end of IMEM are ignored.
    #[must_use]
    pub fn new(image: &[u8], instruction_limit: u64) -> Self {
        let config = RspConfig {
            instruction_limit: Some(instruction_limit),
            ..RspConfig::default()
        };
        let mut scratch = new_scratch_memory();
        {
            let mut view = ScratchView::new(&mut scratch, config.memory_layout);
            for (offset, byte) in (0..0x1000u32).zip(image) {
                view.write_u8(u32::from(IMEM_START) + offset, *byte);
            }
        }

        Self {
            rsp: Rsp::with_config(config),
            scratch,
            dram: vec![0; TEST_DRAM_BYTES],
            registers: RcpRegisters::new(),
            host: CollectingHost::default(),
        }
    }

    /// Clears HALT and BROKE and runs until the unit stops.
    pub fn resume(&mut self) -> Option<RunExit> {
        self.registers
            .clear_status_bits(SP_STATUS_HALT | SP_STATUS_BROKE);
        match MemoryMap::new(&mut self.dram, &mut self.scratch, &mut self.registers) {
            Ok(mut map) => {
                self.rsp.do_cycles(&mut map, &mut self.host, 1);
                self.rsp.last_exit()
            }
            Err(e) => {
                log::error!("test bench memory rejected: {e}");
                None
            }
        }
    }

    /// Reads the value an assertion target names.
    #[must_use]
    pub fn read(&mut self, target: Target) -> u32 {
        let state = self.rsp.state();
        match target {
            Target::Scalar(n) => ScalarRegister::new(n).map_or(0, |r| state.scalar.get(r)),
            Target::VectorLane { register, lane } => {
                u32::from(state.vector.registers.get(register).lane(usize::from(lane)))
            }
            Target::Dmem(address) => {
                let view = ScratchView::new(&mut self.scratch, self.rsp.config().memory_layout);
                u32::from(view.dmem_u8(address))
            }
            Target::Control(VectorControl::Vco) => u32::from(state.vector.flags.vco()),
            Target::Control(VectorControl::Vcc) => u32::from(state.vector.flags.vcc()),
            Target::Control(VectorControl::Vce) => u32::from(state.vector.flags.vce()),
            Target::Accumulator { slice, lane } => {
                let acc = &state.vector.acc;
                let lanes = match slice {
                    AccumulatorSlice::High => &acc.high,
                    AccumulatorSlice::Mid => &acc.mid,
                    AccumulatorSlice::Low => &acc.low,
                };
                u32::from(lanes[usize::from(lane) % lanes.len()])
            }
            Target::Status => self.registers.status(),
            Target::Pc => state.pc(),
        }
    }

    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.host.diagnostics)
    }
}

/// Runs every block against `binary` with the default instruction limit.
#[must_use]
pub fn run_tests(binary: &[u8], test_blocks: &[ParsedTestBlock]) -> TestRunResult {
    run_tests_with_limit(binary, test_blocks, DEFAULT_INSTRUCTION_LIMIT)
}

/// Runs every block against `binary`, allowing `limit` instructions per
/// block.
#[must_use]
pub fn run_tests_with_limit(
    binary: &[u8],
    test_blocks: &[ParsedTestBlock],
    limit: u64,
) -> TestRunResult {
    let mut bench = TestBench::new(binary, limit);
    let mut block_results = Vec::with_capacity(test_blocks.len());

    for block in test_blocks {
        let result = run_test_block(&mut bench, block);
        let runaway = result.faulted;
        block_results.push(result);
        if runaway {
            return TestRunResult {
                unexecuted_blocks: test_blocks.len() - block_results.len(),
                block_results,
            };
        }
    }

    TestRunResult {
        block_results,
        unexecuted_blocks: 0,
    }
}

fn run_test_block(bench: &mut TestBench, block: &ParsedTestBlock) -> TestBlockResult {
    let exit = bench.resume();
    let diagnostics = bench.take_diagnostics();
    log::debug!(
        "test block at lines {}-{}: {exit:?}, {} diagnostics",
        block.start_line,
        block.end_line,
        diagnostics.len()
    );

    let fault_message = match exit {
        Some(RunExit::LimitReached) => Some(format!(
            "instruction limit reached before BREAK (pc=0x{:03X})",
            bench.rsp.state().pc()
        )),
        None => Some("memory map rejected".to_string()),
        Some(_) => None,
    };
    if fault_message.is_some() {
        return TestBlockResult {
            start_line: block.start_line,
            end_line: block.end_line,
            assertion_results: Vec::new(),
            exit,
            diagnostics,
            faulted: true,
            fault_message,
        };
    }

    let assertion_results = block
        .assertions
        .iter()
        .map(|assertion| {
            let actual = bench.read(assertion.target);
            AssertionResult {
                assertion: *assertion,
                passed: assertion.operator.holds(actual, assertion.expected),
                actual: format_value(assertion.target, actual),
            }
        })
        .collect();

    TestBlockResult {
        start_line: block.start_line,
        end_line: block.end_line,
        assertion_results,
        exit,
        diagnostics,
        faulted: false,
        fault_message: None,
    }
}

fn format_value(target: Target, value: u32) -> String {
    let digits = target.hex_digits();
    format!("0x{value:0digits$X}")
}

impl fmt::Display for TestBlockResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = (self.start_line, self.end_line);
        if self.passed() {
            write!(
                f,
                "PASS (lines {start}-{end}): {} assertions",
                self.assertion_results.len()
            )
        } else if self.faulted {
            write!(
                f,
                "FAIL (lines {start}-{end}): {}",
                self.fault_message.as_deref().unwrap_or("unknown fault")
            )
        } else {
            let failed = self.assertion_results.iter().filter(|r| !r.passed).count();
            write!(f, "FAIL (lines {start}-{end}): {failed} assertion(s) failed")
        }
    }
}

impl fmt::Display for AssertionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed {
            write!(f, "  PASS: {}", self.assertion)
        } else {
            write!(f, "  FAIL: {} (got {})", self.assertion, self.actual)
        }
    }
}

impl fmt::Display for TestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} passed, {} failed", self.passed, self.failed)?;
        if self.unexecuted > 0 {
            write!(f, ", {} unexecuted", self.unexecuted)?;
        }
        Ok(())
    }
}
