#![no_main]

use libfuzzer_sys::fuzz_target;
use rsp_core::{
    new_scratch_memory, Decoder, MemoryMap, NullHost, RcpRegisters, Rsp, RspConfig, IMEM_START,
};

struct Quiet;

impl rsp_core::RspHost for Quiet {
    fn message(&mut self, _diagnostic: rsp_core::Diagnostic) {}
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    for chunk in data.chunks_exact(4) {
        let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let _ = Decoder::decode(word);
    }

    // Program bytes fill IMEM; the tail doubles as DMEM contents.
    let mut scratch = new_scratch_memory();
    let imem = usize::from(IMEM_START);
    let program = &data[..data.len().min(0x1000)];
    scratch[imem..imem + program.len()].copy_from_slice(program);
    let dmem = &data[program.len()..];
    let dmem = &dmem[..dmem.len().min(0xFC0)];
    scratch[..dmem.len()].copy_from_slice(dmem);

    let mut dram = vec![0u8; 0x1000];
    let mut registers = RcpRegisters::new();
    let Ok(mut map) = MemoryMap::new(&mut dram, &mut scratch, &mut registers) else {
        return;
    };
    let mut rsp = Rsp::with_config(RspConfig {
        instruction_limit: Some(4096),
        ..RspConfig::default()
    });
    let _ = rsp.do_cycles(&mut map, &mut Quiet, 1);
    let _ = rsp.do_cycles(&mut map, &mut NullHost, 1);
});
