//! Boot vector, reset and the smallest complete program.

use log as _;
use proptest as _;
use rsp_core::{
    new_scratch_memory, MemoryMap, NullHost, RcpRegisters, Rsp, RunExit, ScalarRegister,
    BOOT_VECTOR, IMEM_START, SP_STATUS_BROKE, SP_STATUS_HALT,
};
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const ADDIU_R1_5: u32 = 0x2401_0005;
const BREAK: u32 = 0x0000_000D;

fn load_at(scratch: &mut [u8], imem_offset: usize, program: &[u32]) {
    for (i, word) in program.iter().enumerate() {
        let at = usize::from(IMEM_START) + imem_offset + 4 * i;
        scratch[at..at + 4].copy_from_slice(&word.to_be_bytes());
    }
}

fn r(rsp: &Rsp, index: u8) -> u32 {
    let register = ScalarRegister::new(index).unwrap();
    rsp.state().scalar.get(register)
}

#[test]
fn addiu_then_break_halts_and_returns_budget() {
    let mut scratch = new_scratch_memory();
    load_at(&mut scratch, 0, &[ADDIU_R1_5, BREAK]);
    let mut dram = vec![0u8; 1024];
    let mut registers = RcpRegisters::new();
    let mut rsp = Rsp::new();

    let returned = {
        let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
        rsp.reset(&mut map);
        rsp.do_cycles(&mut map, &mut NullHost, 1234)
    };

    assert_eq!(returned, 1234);
    assert_eq!(r(&rsp, 1), 5);
    assert_eq!(
        registers.status() & (SP_STATUS_HALT | SP_STATUS_BROKE),
        SP_STATUS_HALT | SP_STATUS_BROKE
    );
    assert_eq!(registers.sp_pc, BOOT_VECTOR | 8);
    assert_eq!(rsp.last_exit(), Some(RunExit::Broke));
    assert_eq!(rsp.diagnostics().instructions, 2);
}

#[test]
fn second_call_after_break_does_nothing() {
    let mut scratch = new_scratch_memory();
    load_at(&mut scratch, 0, &[BREAK]);
    let mut dram = vec![0u8; 16];
    let mut registers = RcpRegisters::new();
    let mut rsp = Rsp::new();
    let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();

    assert_eq!(rsp.do_cycles(&mut map, &mut NullHost, 50), 50);
    assert_eq!(rsp.do_cycles(&mut map, &mut NullHost, 50), 0);
    assert_eq!(rsp.last_exit(), Some(RunExit::HaltedOnEntry));
    assert_eq!(rsp.diagnostics().control, 1);
}

#[test]
fn run_starts_at_sp_pc() {
    let mut scratch = new_scratch_memory();
    load_at(&mut scratch, 0x200, &[ADDIU_R1_5, BREAK]);
    let mut dram = vec![0u8; 16];
    let mut registers = RcpRegisters::new();
    registers.sp_pc = BOOT_VECTOR | 0x200;
    let mut rsp = Rsp::new();
    {
        let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
        rsp.do_cycles(&mut map, &mut NullHost, 1);
    }
    assert_eq!(r(&rsp, 1), 5);
    assert_eq!(registers.sp_pc, BOOT_VECTOR | 0x208);
}

#[test]
fn reset_keeps_registers_and_memory() {
    let mut scratch = new_scratch_memory();
    load_at(&mut scratch, 0, &[ADDIU_R1_5, BREAK]);
    scratch[0x10] = 0x77;
    let mut dram = vec![0u8; 16];
    let mut registers = RcpRegisters::new();
    let mut rsp = Rsp::new();
    {
        let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
        rsp.do_cycles(&mut map, &mut NullHost, 1);
        rsp.reset(&mut map);
    }
    assert_eq!(registers.sp_pc, BOOT_VECTOR);
    assert_eq!(r(&rsp, 1), 5);
    assert_eq!(scratch[0x10], 0x77);
}

#[test]
fn pc_wraps_from_imem_end_to_start() {
    let mut scratch = new_scratch_memory();
    // nop at 0xFFC, then execution continues at 0x000
    load_at(&mut scratch, 0, &[ADDIU_R1_5, BREAK]);
    let mut dram = vec![0u8; 16];
    let mut registers = RcpRegisters::new();
    registers.sp_pc = BOOT_VECTOR | 0xFFC;
    let mut rsp = Rsp::new();
    {
        let mut map = MemoryMap::new(&mut dram, &mut scratch, &mut registers).unwrap();
        rsp.do_cycles(&mut map, &mut NullHost, 1);
    }
    assert_eq!(r(&rsp, 1), 5);
    assert_eq!(rsp.diagnostics().instructions, 3);
}
