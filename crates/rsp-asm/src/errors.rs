//! Error and warning types shared by the assembler phases.
//!
//! All errors render in the usual compiler style:
//! ```text
//! kernel.rsp.md:10:5: error: unknown mnemonic: frob
//! ```

use std::fmt;

use crate::encoder::EncodeError;
use crate::parser::ParseError;
use crate::symbols::SymbolError;
use crate::test_format::ParseAssertionError;

/// A source location for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoc {
    /// File path as given.
    pub file: String,
    /// 1-indexed line number.
    pub line: usize,
    /// 1-indexed column number (1 if unknown).
    pub column: usize,
}

impl SourceLoc {
    /// Creates a location.
    #[must_use]
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Classification of assembler errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssembleErrorKind {
    /// The input could not be read.
    #[error("I/O error: {0}")]
    Io(String),
    /// Syntax error.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Label or layout error.
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    /// Value does not fit or label undefined.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// Malformed `rsptest` block.
    #[error("test block: {0}")]
    TestBlock(#[from] ParseAssertionError),
}

/// An assembler error with source context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleError {
    /// The kind of error.
    pub kind: AssembleErrorKind,
    /// Source location if available.
    pub location: Option<SourceLoc>,
}

impl AssembleError {
    /// Creates an error without location.
    #[must_use]
    pub const fn new(kind: AssembleErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    /// Attaches a source location.
    #[must_use]
    pub fn with_location(mut self, loc: SourceLoc) -> Self {
        self.location = Some(loc);
        self
    }

    /// Formats the error for stderr.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        self.location.as_ref().map_or_else(
            || format!("error: {}", self.kind),
            |loc| format!("{loc}: error: {}", self.kind),
        )
    }
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{loc}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AssembleError {}

impl From<ParseError> for AssembleError {
    fn from(e: ParseError) -> Self {
        Self::new(AssembleErrorKind::Parse(e))
    }
}

impl From<SymbolError> for AssembleError {
    fn from(e: SymbolError) -> Self {
        Self::new(AssembleErrorKind::Symbol(e))
    }
}

impl From<EncodeError> for AssembleError {
    fn from(e: EncodeError) -> Self {
        Self::new(AssembleErrorKind::Encode(e))
    }
}

impl From<ParseAssertionError> for AssembleError {
    fn from(e: ParseAssertionError) -> Self {
        Self::new(AssembleErrorKind::TestBlock(e))
    }
}

/// Classification of non-fatal assembler findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembleWarningKind {
    /// Instruction placed off a word boundary; fetch ignores the low bits.
    UnalignedInstruction {
        /// IMEM offset of the instruction.
        address: u32,
    },
    /// Test blocks present but the program contains no BREAK.
    NoBreak,
}

impl fmt::Display for AssembleWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnalignedInstruction { address } => write!(
                f,
                "instruction at 0x{address:03X} is not word aligned and will not execute as written"
            ),
            Self::NoBreak => write!(f, "test blocks present but the program never executes BREAK"),
        }
    }
}

/// A warning with optional location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleWarning {
    /// What was found.
    pub kind: AssembleWarningKind,
    /// Where.
    pub location: Option<SourceLoc>,
}

impl fmt::Display for AssembleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{loc}: warning: {}", self.kind),
            None => write!(f, "warning: {}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    #[test]
    fn stderr_format_with_location() {
        let parse = parse_line("  frob", 3).unwrap_err();
        let err = AssembleError::from(parse).with_location(SourceLoc::new("k.s", 3, 3));
        assert_eq!(err.format_for_stderr(), "k.s:3:3: error: unknown mnemonic: frob");
    }

    #[test]
    fn stderr_format_without_location() {
        let err = AssembleError::new(AssembleErrorKind::Io("missing.s: not found".into()));
        assert_eq!(err.format_for_stderr(), "error: I/O error: missing.s: not found");
    }

    #[test]
    fn warning_display() {
        let warning = AssembleWarning {
            kind: AssembleWarningKind::UnalignedInstruction { address: 0x11 },
            location: Some(SourceLoc::new("a.s", 4, 1)),
        };
        assert_eq!(
            warning.to_string(),
            "a.s:4:1: warning: instruction at 0x011 is not word aligned and will not execute as written"
        );
    }
}
