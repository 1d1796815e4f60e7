//! Symbol table and pass-1 address assignment.
//!
//! Walks parsed lines, assigns an IMEM offset to each instruction and
//! datum, and records label definitions.

use std::collections::HashMap;

use crate::parser::{Directive, LineBody, ParsedLine};

/// Size of the IMEM image the assembler produces.
pub const IMEM_BYTES: u32 = 0x1000;

/// A label with its assigned address and definition line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// IMEM offset assigned to the label.
    pub address: u32,
    /// Source line where the label was defined.
    pub defined_at: usize,
}

/// Label name to definition.
pub type SymbolTable = HashMap<String, Symbol>;

/// Error during address assignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct SymbolError {
    /// Kind of error.
    pub kind: SymbolErrorKind,
    /// Source line where the error occurred.
    pub line: usize,
}

/// Classification of symbol errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolErrorKind {
    /// Label defined twice.
    #[error("duplicate label '{name}' (first defined at line {first_definition})")]
    DuplicateLabel {
        /// The label name.
        name: String,
        /// Line of the first definition.
        first_definition: usize,
    },
    /// Content would extend past the end of IMEM.
    #[error("address overflow: 0x{address:X} exceeds IMEM (0x1000 bytes)")]
    AddressOverflow {
        /// One past the last byte that would be emitted.
        address: u64,
    },
    /// `.org` would move the location counter backwards.
    #[error(".org would move address backwards: current=0x{current:03X}, requested=0x{requested:03X}")]
    OrgBackwards {
        /// Current address.
        current: u32,
        /// Requested address.
        requested: u32,
    },
}

/// A line with its assigned address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressedLine {
    /// Where this line's content begins.
    pub address: u32,
    /// Bytes this line emits, padding included.
    pub size: u32,
    /// The parsed line.
    pub parsed: ParsedLine,
    /// Original source line number.
    pub source_line: usize,
}

/// Result of pass 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Lines with their assigned addresses.
    pub lines: Vec<AddressedLine>,
    /// Label definitions.
    pub symbols: SymbolTable,
    /// One past the last emitted byte.
    pub end_address: u32,
}

/// Bytes emitted by `parsed` when placed at `address`.
///
/// `.org` and `.align` emit the zero padding needed to reach their target.
#[must_use]
pub fn line_size(parsed: &ParsedLine, address: u32) -> u64 {
    let address = u64::from(address);
    match &parsed.body {
        LineBody::Empty => 0,
        LineBody::Instruction(instruction) => 4 * u64::from(instruction.words),
        LineBody::Directive(directive) => match directive {
            Directive::Org(target) => u64::from(*target).saturating_sub(address),
            Directive::Word(values) => 4 * values.len() as u64,
            Directive::Half(values) => 2 * values.len() as u64,
            Directive::Byte(values) => values.len() as u64,
            Directive::Space(count) => u64::from(*count),
            Directive::Align(power) => {
                let alignment = 1u64.checked_shl(*power).unwrap_or(u64::MAX);
                address.next_multiple_of(alignment) - address
            }
        },
    }
}

/// Assigns addresses starting at IMEM offset 0 and builds the symbol table.
///
/// # Errors
///
/// Returns `SymbolError` on a duplicate label, a backwards `.org`, or
/// content that does not fit in IMEM.
pub fn assign_addresses(
    parsed: &[ParsedLine],
    source_lines: &[usize],
) -> Result<Assignment, SymbolError> {
    let mut symbols = SymbolTable::new();
    let mut lines = Vec::with_capacity(parsed.len());
    let mut address = 0u32;

    for (line, &source_line) in parsed.iter().zip(source_lines) {
        if let Some(name) = &line.label {
            if let Some(existing) = symbols.get(name) {
                return Err(SymbolError {
                    kind: SymbolErrorKind::DuplicateLabel {
                        name: name.clone(),
                        first_definition: existing.defined_at,
                    },
                    line: source_line,
                });
            }
            symbols.insert(
                name.clone(),
                Symbol {
                    address,
                    defined_at: source_line,
                },
            );
        }

        if let LineBody::Directive(Directive::Org(target)) = &line.body {
            if *target < address {
                return Err(SymbolError {
                    kind: SymbolErrorKind::OrgBackwards {
                        current: address,
                        requested: *target,
                    },
                    line: source_line,
                });
            }
        }

        let size = line_size(line, address);
        let end = u64::from(address) + size;
        let (Ok(size), Ok(next)) = (u32::try_from(size), u32::try_from(end)) else {
            return Err(overflow(end, source_line));
        };
        if next > IMEM_BYTES {
            return Err(overflow(end, source_line));
        }

        lines.push(AddressedLine {
            address,
            size,
            parsed: line.clone(),
            source_line,
        });
        address = next;
    }

    Ok(Assignment {
        lines,
        symbols,
        end_address: address,
    })
}

const fn overflow(address: u64, line: usize) -> SymbolError {
    SymbolError {
        kind: SymbolErrorKind::AddressOverflow { address },
        line,
    }
}
