//! Top-level assembler pipeline.
//!
//! 1. **Extraction**: plain or literate source (`source::extract_source`)
//! 2. **Pass 1**: parsing and address assignment
//! 3. **Pass 2**: encoding into an IMEM image starting at offset 0
//!
//! `rsptest` blocks are parsed here too, so a malformed assertion fails
//! the build instead of the test run.

use std::fs;
use std::path::Path;

use crate::encoder::encode_line;
use crate::errors::{
    AssembleError, AssembleErrorKind, AssembleWarning, AssembleWarningKind, SourceLoc,
};
use crate::mnemonic::OperandForm;
use crate::parser::{parse_line, LineBody, ParsedLine};
use crate::source::{extract_source, SourceContent};
use crate::symbols::{assign_addresses, Assignment, SymbolTable};
use crate::test_format::{parse_test_block, ParsedTestBlock};

/// Output of a successful assembly.
#[derive(Debug, Clone)]
pub struct AssembleResult {
    /// IMEM image, starting at offset 0.
    pub binary: Vec<u8>,
    /// Parsed test blocks in document order.
    pub test_blocks: Vec<ParsedTestBlock>,
    /// Non-fatal findings.
    pub warnings: Vec<AssembleWarning>,
    /// One entry per line that emitted bytes.
    pub listing: Vec<ListingEntry>,
    /// Label definitions.
    pub symbols: SymbolTable,
}

/// An entry in the address-to-source listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// IMEM offset.
    pub address: u32,
    /// Emitted bytes.
    pub bytes: Vec<u8>,
    /// Source text, trimmed.
    pub source: String,
    /// 1-indexed source line.
    pub line: usize,
}

/// Reads and assembles a source file.
///
/// Files ending in `.md` are treated as literate documents; anything else
/// is plain assembly.
///
/// # Errors
///
/// Returns `AssembleError` if the file cannot be read or any phase fails.
#[allow(clippy::result_large_err)]
pub fn assemble(path: &Path) -> Result<AssembleResult, AssembleError> {
    let content = fs::read_to_string(path).map_err(|e| {
        AssembleError::new(AssembleErrorKind::Io(format!("{}: {e}", path.display())))
    })?;
    assemble_source(path, &content)
}

/// Assembles already loaded content; `path` selects the format and names
/// the file in diagnostics.
///
/// # Errors
///
/// Returns `AssembleError` on a syntax error, a label or layout error, a
/// value that does not fit its field, or a malformed test block.
#[allow(clippy::result_large_err)]
pub fn assemble_source(path: &Path, content: &str) -> Result<AssembleResult, AssembleError> {
    let source = extract_source(path, content);
    let file = source.file_path.as_str();

    let parsed = parse_lines(&source)?;
    let line_numbers: Vec<usize> = source.lines.iter().map(|l| l.original_line).collect();
    let assignment = assign_addresses(&parsed, &line_numbers).map_err(|e| {
        let line = e.line;
        AssembleError::from(e).with_location(SourceLoc::new(file, line, 1))
    })?;

    let (binary, listing) = encode_pass2(&assignment, &source)?;
    let test_blocks = parse_test_blocks(&source)?;
    let warnings = collect_warnings(&assignment, file, !test_blocks.is_empty());

    log::debug!(
        "assembled {file}: {} bytes, {} labels, {} test blocks, {} warnings",
        binary.len(),
        assignment.symbols.len(),
        test_blocks.len(),
        warnings.len()
    );

    Ok(AssembleResult {
        binary,
        test_blocks,
        warnings,
        listing,
        symbols: assignment.symbols,
    })
}

#[allow(clippy::result_large_err)]
fn parse_lines(source: &SourceContent) -> Result<Vec<ParsedLine>, AssembleError> {
    source
        .lines
        .iter()
        .map(|line| {
            parse_line(&line.text, line.original_line).map_err(|e| {
                let loc = SourceLoc::new(&source.file_path, e.location.line, e.location.column);
                AssembleError::from(e).with_location(loc)
            })
        })
        .collect()
}

#[allow(clippy::result_large_err)]
fn encode_pass2(
    assignment: &Assignment,
    source: &SourceContent,
) -> Result<(Vec<u8>, Vec<ListingEntry>), AssembleError> {
    let mut binary = Vec::with_capacity(assignment.end_address as usize);
    let mut listing = Vec::new();

    for (addressed, line) in assignment.lines.iter().zip(&source.lines) {
        let bytes = encode_line(addressed, &assignment.symbols).map_err(|e| {
            let at = e.line;
            AssembleError::from(e).with_location(SourceLoc::new(&source.file_path, at, 1))
        })?;
        if bytes.is_empty() {
            continue;
        }
        listing.push(ListingEntry {
            address: addressed.address,
            bytes: bytes.clone(),
            source: line.text.trim().to_string(),
            line: line.original_line,
        });
        binary.extend(bytes);
    }

    Ok((binary, listing))
}

#[allow(clippy::result_large_err)]
fn parse_test_blocks(source: &SourceContent) -> Result<Vec<ParsedTestBlock>, AssembleError> {
    source
        .test_blocks
        .iter()
        .map(|block| {
            parse_test_block(&block.content, block.start_line, block.end_line).map_err(|e| {
                let line = block.start_line + e.line_in_block;
                AssembleError::from(e).with_location(SourceLoc::new(&source.file_path, line, 1))
            })
        })
        .collect()
}

fn collect_warnings(assignment: &Assignment, file: &str, has_tests: bool) -> Vec<AssembleWarning> {
    let mut warnings = Vec::new();
    let mut saw_break = false;

    for line in &assignment.lines {
        let LineBody::Instruction(instruction) = &line.parsed.body else {
            continue;
        };
        saw_break |= instruction.form == OperandForm::Break;
        if line.address % 4 != 0 {
            warnings.push(AssembleWarning {
                kind: AssembleWarningKind::UnalignedInstruction {
                    address: line.address,
                },
                location: Some(SourceLoc::new(file, line.source_line, 1)),
            });
        }
    }

    if has_tests && !saw_break {
        warnings.push(AssembleWarning {
            kind: AssembleWarningKind::NoBreak,
            location: Some(SourceLoc::new(file, 1, 1)),
        });
    }
    warnings
}
