//! Assembler and literate test runner for the RSP interpreter.

/// Top-level two-pass assembler pipeline.
pub mod assembler;
/// Instruction and directive encoding.
pub mod encoder;
/// Structured assembly error and warning types.
pub mod errors;
/// Mnemonic resolution against the core opcode tables.
pub mod mnemonic;
/// Line parser for instructions, labels, and directives.
pub mod parser;
/// Source loading and literate Markdown extraction.
pub mod source;
/// Symbol table and pass-1 address assignment.
pub mod symbols;
/// `rsptest` assertion syntax.
pub mod test_format;
/// Runs assertion blocks against an assembled image.
pub mod test_runner;

pub use assembler::{assemble, assemble_source, AssembleResult, ListingEntry};
pub use errors::{AssembleError, AssembleErrorKind, AssembleWarning, AssembleWarningKind};
pub use test_runner::{run_tests, TestRunResult};
