//! Parsing for `rsptest` assertion blocks.
//!
//! ## Supported Syntax
//!
//! - Scalar registers: `$1 == 5`, `$t0 != 0`
//! - Vector lanes: `$v2[3] == 0x7FFF`
//! - DMEM bytes: `dmem[0x10] == 0xAB`
//! - Vector flags: `vco == 0x00FF`, `vcc`, `vce`
//! - Accumulator slices: `acc_high[0]`, `acc_mid[2] == 1`, `acc_low[7]`
//! - `status` (SP_STATUS) and `pc` (IMEM offset of the next instruction)
//! - Comments: `;` to end of line
//! - Literals: decimal, `0x` hex, `0b` binary, optional leading `-`

use std::fmt;

use crate::parser::{parse_number, parse_scalar};

/// Which accumulator slice an assertion reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorSlice {
    /// Bits 47..32.
    High,
    /// Bits 31..16.
    Mid,
    /// Bits 15..0.
    Low,
}

/// Vector control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorControl {
    /// Carry and not-equal flags.
    Vco,
    /// Compare and clip flags.
    Vcc,
    /// Extension flags.
    Vce,
}

/// The piece of machine state an assertion reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Scalar register.
    Scalar(u8),
    /// One lane of a vector register.
    VectorLane {
        /// Register number.
        register: u8,
        /// Lane in `0..8`.
        lane: u8,
    },
    /// DMEM byte.
    Dmem(u32),
    /// Vector control register.
    Control(VectorControl),
    /// One lane of an accumulator slice.
    Accumulator {
        /// Slice.
        slice: AccumulatorSlice,
        /// Lane in `0..8`.
        lane: u8,
    },
    /// SP_STATUS.
    Status,
    /// IMEM offset execution will resume from.
    Pc,
}

impl Target {
    /// Width of the value in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Scalar(_) | Self::Status => 32,
            Self::VectorLane { .. }
            | Self::Accumulator { .. }
            | Self::Control(VectorControl::Vco | VectorControl::Vcc) => 16,
            Self::Dmem(_) | Self::Control(VectorControl::Vce) => 8,
            Self::Pc => 12,
        }
    }

    /// Hex digits needed to print a value of this width.
    #[must_use]
    pub const fn hex_digits(self) -> usize {
        match self.bits() {
            32 => 8,
            16 => 4,
            12 => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(n) => write!(f, "${n}"),
            Self::VectorLane { register, lane } => write!(f, "$v{register}[{lane}]"),
            Self::Dmem(address) => write!(f, "dmem[0x{address:03X}]"),
            Self::Control(VectorControl::Vco) => write!(f, "vco"),
            Self::Control(VectorControl::Vcc) => write!(f, "vcc"),
            Self::Control(VectorControl::Vce) => write!(f, "vce"),
            Self::Accumulator { slice, lane } => {
                let name = match slice {
                    AccumulatorSlice::High => "acc_high",
                    AccumulatorSlice::Mid => "acc_mid",
                    AccumulatorSlice::Low => "acc_low",
                };
                write!(f, "{name}[{lane}]")
            }
            Self::Status => write!(f, "status"),
            Self::Pc => write!(f, "pc"),
        }
    }
}

/// Comparison operator for assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
}

impl ComparisonOp {
    /// Applies the operator.
    #[must_use]
    pub const fn holds(self, actual: u32, expected: u32) -> bool {
        match self {
            Self::Equal => actual == expected,
            Self::NotEqual => actual != expected,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "=="),
            Self::NotEqual => write!(f, "!="),
        }
    }
}

/// A parsed assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assertion {
    /// What to read.
    pub target: Target,
    /// How to compare.
    pub operator: ComparisonOp,
    /// Expected value, already reduced to the target's width.
    pub expected: u32,
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.target.hex_digits();
        write!(
            f,
            "{} {} 0x{:0digits$X}",
            self.target, self.operator, self.expected
        )
    }
}

/// A parsed test block with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTestBlock {
    /// Assertions in order.
    pub assertions: Vec<Assertion>,
    /// 1-indexed line of the opening fence.
    pub start_line: usize,
    /// 1-indexed line of the closing fence.
    pub end_line: usize,
}

/// Error parsing an assertion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line_in_block}: {message} (in '{text}')")]
pub struct ParseAssertionError {
    /// 1-indexed line within the block.
    pub line_in_block: usize,
    /// The offending text.
    pub text: String,
    /// What is wrong.
    pub message: String,
}

/// Parses a test block's content into assertions.
///
/// Blank and comment-only lines are skipped.
///
/// # Errors
///
/// Returns `ParseAssertionError` for the first malformed line.
pub fn parse_test_block(
    content: &str,
    start_line: usize,
    end_line: usize,
) -> Result<ParsedTestBlock, ParseAssertionError> {
    let mut assertions = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let stripped = line.split(';').next().unwrap_or_default().trim();
        if stripped.is_empty() {
            continue;
        }

        let assertion = parse_assertion(stripped).map_err(|message| ParseAssertionError {
            line_in_block: idx + 1,
            text: stripped.to_string(),
            message,
        })?;
        assertions.push(assertion);
    }

    Ok(ParsedTestBlock {
        assertions,
        start_line,
        end_line,
    })
}

/// Parses one assertion line.
///
/// # Errors
///
/// Returns a description of the problem.
pub fn parse_assertion(text: &str) -> Result<Assertion, String> {
    let (lhs, operator, rhs) = if let Some((l, r)) = text.split_once("==") {
        (l, ComparisonOp::Equal, r)
    } else if let Some((l, r)) = text.split_once("!=") {
        (l, ComparisonOp::NotEqual, r)
    } else {
        return Err("expected '==' or '!='".to_string());
    };

    let target = parse_target(lhs.trim())?;
    let rhs = rhs.trim();
    let value = parse_number(rhs).ok_or_else(|| format!("invalid value '{rhs}'"))?;
    let bits = target.bits();
    if value < -(1i64 << (bits - 1)) || value >= (1i64 << bits) {
        return Err(format!("value {rhs} does not fit in {bits} bits"));
    }

    Ok(Assertion {
        target,
        operator,
        expected: truncate(value, bits),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn truncate(value: i64, bits: u32) -> u32 {
    (value & ((1i64 << bits) - 1)) as u32
}

fn parse_target(text: &str) -> Result<Target, String> {
    let lower = text.to_ascii_lowercase();
    let indexed = |prefix: &str| -> Option<Result<u32, String>> {
        let inner = lower.strip_prefix(prefix)?.strip_suffix(']')?;
        Some(
            parse_number(inner)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| format!("invalid index in '{text}'")),
        )
    };
    let lane = |index: u32| -> Result<u8, String> {
        u8::try_from(index)
            .ok()
            .filter(|l| *l < 8)
            .ok_or_else(|| format!("lane {index} out of range in '{text}'"))
    };

    if let Some(index) = indexed("dmem[") {
        let address = index?;
        return if address < 0x1000 {
            Ok(Target::Dmem(address))
        } else {
            Err(format!("DMEM address 0x{address:X} out of range"))
        };
    }

    for (prefix, slice) in [
        ("acc_high[", AccumulatorSlice::High),
        ("acc_mid[", AccumulatorSlice::Mid),
        ("acc_low[", AccumulatorSlice::Low),
    ] {
        if let Some(index) = indexed(prefix) {
            return Ok(Target::Accumulator {
                slice,
                lane: lane(index?)?,
            });
        }
    }

    if let Some((register, rest)) = lower.strip_prefix("$v").and_then(|r| r.split_once('[')) {
        let register = register
            .parse::<u8>()
            .ok()
            .filter(|r| *r < 32)
            .ok_or_else(|| format!("invalid vector register in '{text}'"))?;
        let index = rest
            .strip_suffix(']')
            .and_then(parse_number)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| format!("invalid index in '{text}'"))?;
        return Ok(Target::VectorLane {
            register,
            lane: lane(index)?,
        });
    }

    match lower.trim_start_matches('$') {
        "vco" => return Ok(Target::Control(VectorControl::Vco)),
        "vcc" => return Ok(Target::Control(VectorControl::Vcc)),
        "vce" => return Ok(Target::Control(VectorControl::Vce)),
        "status" => return Ok(Target::Status),
        "pc" => return Ok(Target::Pc),
        _ => {}
    }

    parse_scalar(text)
        .map(Target::Scalar)
        .ok_or_else(|| format!("unknown assertion target '{text}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("$1 == 5", Target::Scalar(1), ComparisonOp::Equal, 5)]
    #[case("$t0 != 0", Target::Scalar(8), ComparisonOp::NotEqual, 0)]
    #[case("$v0 == -1", Target::Scalar(2), ComparisonOp::Equal, 0xFFFF_FFFF)]
    #[case(
        "$v2[3] == 0x7FFF",
        Target::VectorLane { register: 2, lane: 3 },
        ComparisonOp::Equal,
        0x7FFF
    )]
    #[case("$v31[7] == -2", Target::VectorLane { register: 31, lane: 7 }, ComparisonOp::Equal, 0xFFFE)]
    #[case("dmem[0x10] == 0xAB", Target::Dmem(0x10), ComparisonOp::Equal, 0xAB)]
    #[case("vco == 0x00FF", Target::Control(VectorControl::Vco), ComparisonOp::Equal, 0xFF)]
    #[case("VCE != 0b1", Target::Control(VectorControl::Vce), ComparisonOp::NotEqual, 1)]
    #[case(
        "acc_mid[2] == 1",
        Target::Accumulator { slice: AccumulatorSlice::Mid, lane: 2 },
        ComparisonOp::Equal,
        1
    )]
    #[case("status == 0x3", Target::Status, ComparisonOp::Equal, 3)]
    #[case("pc == 0x8", Target::Pc, ComparisonOp::Equal, 8)]
    fn parses_assertion_forms(
        #[case] text: &str,
        #[case] target: Target,
        #[case] operator: ComparisonOp,
        #[case] expected: u32,
    ) {
        assert_eq!(
            parse_assertion(text),
            Ok(Assertion {
                target,
                operator,
                expected
            })
        );
    }

    #[rstest]
    #[case("$1 5")]
    #[case("$32 == 1")]
    #[case("$v2[8] == 1")]
    #[case("$v40[0] == 1")]
    #[case("dmem[0x1000] == 1")]
    #[case("dmem[0x10] == 0x100")]
    #[case("acc_low[9] == 0")]
    #[case("vcc == 0x10000")]
    #[case("flags == 1")]
    #[case("$1 == five")]
    fn rejects_malformed_assertions(#[case] text: &str) {
        assert!(parse_assertion(text).is_err(), "{text} should not parse");
    }

    #[test]
    fn block_skips_blanks_and_comments() {
        let block = parse_test_block("; header\n$1 == 5\n\n  vco == 0 ; flags clear\n", 10, 15)
            .unwrap();
        assert_eq!(block.assertions.len(), 2);
        assert_eq!(block.start_line, 10);
        assert_eq!(block.end_line, 15);
    }

    #[test]
    fn block_error_reports_line() {
        let err = parse_test_block("$1 == 5\n$1 = 5\n", 1, 4).unwrap_err();
        assert_eq!(err.line_in_block, 2);
        assert_eq!(err.text, "$1 = 5");
    }

    #[test]
    fn display_pads_to_width() {
        let assertion = parse_assertion("dmem[0x10] == 0xA").unwrap();
        assert_eq!(assertion.to_string(), "dmem[0x010] == 0x0A");
        let assertion = parse_assertion("$3 != 1").unwrap();
        assert_eq!(assertion.to_string(), "$3 != 0x00000001");
    }
}
