//! Source line parser for instructions, labels and directives.
//!
//! Turns one raw line into a [`ParsedLine`]. Operands are interpreted by
//! the position they occupy in the mnemonic's [`OperandForm`], so `$v0` is
//! the scalar ABI register in `addu $v0, $a0, $a1` and a vector register in
//! `vadd $v0, $v1, $v2`.

#![allow(clippy::option_if_let_else)]

use rsp_core::ControlRegister;

use crate::mnemonic::{resolve_mnemonic, OperandForm};

/// A numeric value or a label reference with an addend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal.
    Number(i64),
    /// `label`, `label+4` or `label-8`.
    Label {
        /// Referenced label.
        name: String,
        /// Constant added to the label address.
        addend: i64,
    },
}

/// A typed operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Scalar register number.
    Scalar(u8),
    /// Vector register with its encoded element field.
    Vector {
        /// Register number.
        register: u8,
        /// Element field as it appears in the instruction word.
        element: u8,
    },
    /// COP0 register index or COP2 control register index.
    Control(u8),
    /// Immediate, shift amount or branch/jump target.
    Immediate(Expr),
    /// `offset(base)`.
    Memory {
        /// Byte offset.
        offset: Expr,
        /// Base scalar register.
        base: u8,
    },
}

/// A parsed instruction with typed operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstruction {
    /// The mnemonic as written.
    pub mnemonic: String,
    /// Resolved operand form.
    pub form: OperandForm,
    /// Operands in source order.
    pub operands: Vec<Operand>,
    /// Instruction words this line expands to.
    pub words: u8,
}

/// A parsed data or layout directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `.org addr`: move the location counter forward to `addr`.
    Org(u32),
    /// `.word v, ...`: 32-bit big-endian values; labels allowed.
    Word(Vec<Expr>),
    /// `.half v, ...`: 16-bit big-endian values.
    Half(Vec<u16>),
    /// `.byte v, ...`
    Byte(Vec<u8>),
    /// `.align n`: pad with zeros to a multiple of `2^n`.
    Align(u32),
    /// `.space n`: emit `n` zero bytes.
    Space(u32),
}

/// What follows an optional label on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineBody {
    /// Nothing (blank, comment or label only).
    Empty,
    /// A directive.
    Directive(Directive),
    /// An instruction.
    Instruction(ParsedInstruction),
}

/// A single parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Label defined on this line.
    pub label: Option<String>,
    /// Directive or instruction.
    pub body: LineBody,
}

impl ParsedLine {
    const fn empty() -> Self {
        Self {
            label: None,
            body: LineBody::Empty,
        }
    }
}

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// 1-indexed line number.
    pub line: usize,
    /// 1-indexed column number.
    pub column: usize,
}

/// Parse error with source location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct ParseError {
    /// Location of the error.
    pub location: SourceLocation,
    /// Kind of parse error.
    pub kind: ParseErrorKind,
}

/// Classification of parse errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// Unknown mnemonic.
    #[error("unknown mnemonic: {0}")]
    UnknownMnemonic(String),
    /// Not a scalar register.
    #[error("invalid register: {0}")]
    InvalidRegister(String),
    /// Not a vector register.
    #[error("invalid vector register: {0}")]
    InvalidVectorRegister(String),
    /// Element suffix not valid in this position.
    #[error("invalid element: {0}")]
    InvalidElement(String),
    /// Unknown COP0 or COP2 control register.
    #[error("invalid control register: {0}")]
    InvalidControlRegister(String),
    /// Malformed number or label.
    #[error("invalid immediate value: {0}")]
    InvalidImmediate(String),
    /// Not of the form `offset(base)`.
    #[error("invalid memory operand: {0}")]
    InvalidMemoryOperand(String),
    /// Unknown directive name.
    #[error("unknown directive: {0}")]
    InvalidDirective(String),
    /// Directive value missing or out of range.
    #[error("invalid directive value: {0}")]
    InvalidDirectiveValue(String),
    /// Malformed label definition.
    #[error("invalid label: {0}")]
    InvalidLabel(String),
    /// Wrong number of operands.
    #[error("{mnemonic} expects {expected} operand(s), found {found}")]
    OperandCount {
        /// The mnemonic as written.
        mnemonic: String,
        /// Accepted counts.
        expected: &'static str,
        /// Count found.
        found: usize,
    },
}

/// Result of parsing a single line.
pub type ParseResult = Result<ParsedLine, ParseError>;

const ABI_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
    "fp", "ra",
];

const VECTOR_CONTROL_NAMES: [&str; 3] = ["vco", "vcc", "vce"];

struct Line<'a> {
    raw: &'a str,
    number: usize,
}

impl Line<'_> {
    fn error(&self, near: &str, kind: ParseErrorKind) -> ParseError {
        let column = if near.is_empty() {
            1
        } else {
            self.raw.find(near).map_or(1, |pos| pos + 1)
        };
        ParseError {
            location: SourceLocation {
                line: self.number,
                column,
            },
            kind,
        }
    }
}

/// Parses a source line.
///
/// # Errors
///
/// Returns a `ParseError` for unknown mnemonics or directives, malformed
/// operands, or operand counts that do not fit the mnemonic.
pub fn parse_line(line: &str, line_number: usize) -> ParseResult {
    let ctx = Line {
        raw: line,
        number: line_number,
    };
    let mut text = strip_comment(line).trim();

    if text.is_empty() {
        return Ok(ParsedLine::empty());
    }

    let mut label = None;
    if let Some((name, rest)) = split_label(text) {
        if !is_valid_label(name) {
            return Err(ctx.error(name, ParseErrorKind::InvalidLabel(name.to_string())));
        }
        label = Some(name.to_string());
        text = rest.trim();
    }

    let body = if text.is_empty() {
        LineBody::Empty
    } else if let Some(directive) = text.strip_prefix('.') {
        LineBody::Directive(parse_directive(directive, &ctx)?)
    } else {
        LineBody::Instruction(parse_instruction(text, &ctx)?)
    };

    Ok(ParsedLine { label, body })
}

fn strip_comment(line: &str) -> &str {
    let end = [line.find(';'), line.find('#'), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

fn split_label(text: &str) -> Option<(&str, &str)> {
    text.split_once(':')
        .map(|(head, rest)| (head.trim(), rest))
}

fn is_valid_label(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_directive(text: &str, ctx: &Line<'_>) -> Result<Directive, ParseError> {
    let (name, args) = text
        .find(char::is_whitespace)
        .map_or((text, ""), |pos| (&text[..pos], text[pos..].trim()));
    let values: Vec<&str> = args
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    let bad_value = |v: &str| ctx.error(v, ParseErrorKind::InvalidDirectiveValue(v.to_string()));

    let single = || -> Result<u32, ParseError> {
        match values.as_slice() {
            [one] => parse_number(one)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| bad_value(one)),
            _ => Err(bad_value(args)),
        }
    };

    let directive = match name.to_ascii_lowercase().as_str() {
        "org" => Directive::Org(single()?),
        "align" => Directive::Align(single()?),
        "space" => Directive::Space(single()?),
        "word" => {
            if values.is_empty() {
                return Err(bad_value(args));
            }
            let exprs = values
                .iter()
                .map(|v| {
                    parse_expr(v)
                        .filter(|e| !matches!(e, Expr::Number(n) if !fits_bits(*n, 32)))
                        .ok_or_else(|| bad_value(v))
                })
                .collect::<Result<_, _>>()?;
            Directive::Word(exprs)
        }
        "half" => {
            if values.is_empty() {
                return Err(bad_value(args));
            }
            let halves = values
                .iter()
                .map(|v| {
                    parse_number(v)
                        .filter(|n| fits_bits(*n, 16))
                        .map(|n| n.to_be_bytes())
                        .map(|[.., high, low]| u16::from_be_bytes([high, low]))
                        .ok_or_else(|| bad_value(v))
                })
                .collect::<Result<_, _>>()?;
            Directive::Half(halves)
        }
        "byte" => {
            if values.is_empty() {
                return Err(bad_value(args));
            }
            let bytes = values
                .iter()
                .map(|v| {
                    parse_number(v)
                        .filter(|n| fits_bits(*n, 8))
                        .map(|n| n.to_be_bytes()[7])
                        .ok_or_else(|| bad_value(v))
                })
                .collect::<Result<_, _>>()?;
            Directive::Byte(bytes)
        }
        _ => {
            return Err(ctx.error(name, ParseErrorKind::InvalidDirective(name.to_string())));
        }
    };

    Ok(directive)
}

/// `true` if `value` is representable in `bits` bits, signed or unsigned.
#[must_use]
pub const fn fits_bits(value: i64, bits: u32) -> bool {
    value >= -(1 << (bits - 1)) && value < (1 << bits)
}

fn parse_instruction(text: &str, ctx: &Line<'_>) -> Result<ParsedInstruction, ParseError> {
    let tokens = tokenize(text);
    let Some((mnemonic, operand_tokens)) = tokens.split_first() else {
        return Err(ctx.error(text, ParseErrorKind::UnknownMnemonic(text.to_string())));
    };

    let form = resolve_mnemonic(mnemonic)
        .ok_or_else(|| ctx.error(mnemonic, ParseErrorKind::UnknownMnemonic(mnemonic.clone())))?;

    let operands = parse_operands(form, mnemonic, operand_tokens, ctx)?;
    let words = instruction_words(form, &operands);

    Ok(ParsedInstruction {
        mnemonic: mnemonic.clone(),
        form,
        operands,
        words,
    })
}

/// Words emitted for an instruction. Only `li` can expand to two.
#[must_use]
pub fn instruction_words(form: OperandForm, operands: &[Operand]) -> u8 {
    match (form, operands.get(1)) {
        (OperandForm::LoadImmediate, Some(Operand::Immediate(Expr::Number(n))))
            if fits_bits(*n, 16) =>
        {
            1
        }
        (OperandForm::LoadImmediate, _) => 2,
        _ => 1,
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in text.chars() {
        match ch {
            '[' | '(' => {
                depth += 1;
                current.push(ch);
            }
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' | ' ' | '\t' if depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            ' ' | '\t' => {}
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[derive(Clone, Copy)]
enum Slot {
    Scalar,
    VectorRegister,
    VectorBroadcast,
    VectorByte,
    VectorLane,
    Cop0,
    Cop2Control,
    Immediate,
    Memory,
}

fn slots(form: OperandForm, count: usize) -> Option<&'static [Slot]> {
    use Slot::{
        Cop0, Cop2Control, Immediate, Memory, Scalar, VectorBroadcast, VectorByte, VectorLane,
        VectorRegister,
    };

    let shape: &'static [Slot] = match form {
        OperandForm::Register3(_) | OperandForm::ShiftVariable(_) => &[Scalar, Scalar, Scalar],
        OperandForm::Shift(_) | OperandForm::Immediate(_) | OperandForm::BranchCompare(_) => {
            &[Scalar, Scalar, Immediate]
        }
        OperandForm::JumpRegister => &[Scalar],
        OperandForm::JumpAndLinkRegister if count == 1 => &[Scalar],
        OperandForm::JumpAndLinkRegister | OperandForm::Move => &[Scalar, Scalar],
        OperandForm::Break | OperandForm::Nop | OperandForm::VectorBare(_) => &[],
        OperandForm::LoadUpper
        | OperandForm::BranchZero(_)
        | OperandForm::BranchRegimm(_)
        | OperandForm::LoadImmediate => &[Scalar, Immediate],
        OperandForm::Jump(_) | OperandForm::Branch => &[Immediate],
        OperandForm::Memory(_) => &[Scalar, Memory],
        OperandForm::Cop0(_) => &[Scalar, Cop0],
        OperandForm::Cop2Element(_) => &[Scalar, VectorByte],
        OperandForm::Cop2Control(_) => &[Scalar, Cop2Control],
        OperandForm::Vector(_) => &[VectorRegister, VectorRegister, VectorBroadcast],
        OperandForm::VectorSingleLane(_) => &[VectorLane, VectorBroadcast],
        OperandForm::VectorMemory(_) => &[VectorByte, Memory],
    };

    (shape.len() == count).then_some(shape)
}

fn expected_count(form: OperandForm) -> &'static str {
    match form {
        OperandForm::Register3(_)
        | OperandForm::ShiftVariable(_)
        | OperandForm::Shift(_)
        | OperandForm::Immediate(_)
        | OperandForm::BranchCompare(_)
        | OperandForm::Vector(_) => "3",
        OperandForm::JumpRegister | OperandForm::Jump(_) | OperandForm::Branch => "1",
        OperandForm::JumpAndLinkRegister => "1 or 2",
        OperandForm::Break | OperandForm::Nop | OperandForm::VectorBare(_) => "0",
        OperandForm::LoadUpper
        | OperandForm::BranchZero(_)
        | OperandForm::BranchRegimm(_)
        | OperandForm::LoadImmediate
        | OperandForm::Memory(_)
        | OperandForm::Cop0(_)
        | OperandForm::Cop2Element(_)
        | OperandForm::Cop2Control(_)
        | OperandForm::Move
        | OperandForm::VectorSingleLane(_)
        | OperandForm::VectorMemory(_) => "2",
    }
}

fn parse_operands(
    form: OperandForm,
    mnemonic: &str,
    tokens: &[String],
    ctx: &Line<'_>,
) -> Result<Vec<Operand>, ParseError> {
    let Some(shape) = slots(form, tokens.len()) else {
        return Err(ctx.error(
            mnemonic,
            ParseErrorKind::OperandCount {
                mnemonic: mnemonic.to_string(),
                expected: expected_count(form),
                found: tokens.len(),
            },
        ));
    };

    shape
        .iter()
        .zip(tokens)
        .map(|(slot, token)| parse_operand(*slot, token, ctx))
        .collect()
}

fn parse_operand(slot: Slot, token: &str, ctx: &Line<'_>) -> Result<Operand, ParseError> {
    match slot {
        Slot::Scalar => parse_scalar(token)
            .map(Operand::Scalar)
            .ok_or_else(|| ctx.error(token, ParseErrorKind::InvalidRegister(token.to_string()))),
        Slot::VectorRegister => {
            let (register, suffix) = parse_vector(token, ctx)?;
            if suffix.is_some() {
                return Err(ctx.error(token, ParseErrorKind::InvalidElement(token.to_string())));
            }
            Ok(Operand::Vector {
                register,
                element: 0,
            })
        }
        Slot::VectorBroadcast | Slot::VectorByte | Slot::VectorLane => {
            let (register, suffix) = parse_vector(token, ctx)?;
            let element = match (slot, suffix) {
                (_, None) => Some(0),
                (Slot::VectorBroadcast, Some(s)) => broadcast_element(s),
                (Slot::VectorLane, Some(s)) => parse_number(s)
                    .and_then(|n| u8::try_from(n).ok())
                    .filter(|n| *n < 8),
                (_, Some(s)) => parse_number(s)
                    .and_then(|n| u8::try_from(n).ok())
                    .filter(|n| *n < 16),
            }
            .ok_or_else(|| ctx.error(token, ParseErrorKind::InvalidElement(token.to_string())))?;
            Ok(Operand::Vector { register, element })
        }
        Slot::Cop0 => parse_cop0(token).map(Operand::Control).ok_or_else(|| {
            ctx.error(
                token,
                ParseErrorKind::InvalidControlRegister(token.to_string()),
            )
        }),
        Slot::Cop2Control => parse_cop2_control(token)
            .map(Operand::Control)
            .ok_or_else(|| {
                ctx.error(
                    token,
                    ParseErrorKind::InvalidControlRegister(token.to_string()),
                )
            }),
        Slot::Immediate => parse_expr(token)
            .map(Operand::Immediate)
            .ok_or_else(|| ctx.error(token, ParseErrorKind::InvalidImmediate(token.to_string()))),
        Slot::Memory => parse_memory(token).ok_or_else(|| {
            ctx.error(
                token,
                ParseErrorKind::InvalidMemoryOperand(token.to_string()),
            )
        }),
    }
}

/// Parses `$N` (0..=31) or an ABI name such as `$t0`.
#[must_use]
pub fn parse_scalar(token: &str) -> Option<u8> {
    let name = token.strip_prefix('$')?;
    if let Ok(n) = name.parse::<u8>() {
        return (n < 32).then_some(n);
    }
    let lower = name.to_ascii_lowercase();
    if lower == "s8" {
        return Some(30);
    }
    ABI_NAMES
        .iter()
        .position(|abi| *abi == lower)
        .and_then(|i| u8::try_from(i).ok())
}

fn parse_vector<'t>(token: &'t str, ctx: &Line<'_>) -> Result<(u8, Option<&'t str>), ParseError> {
    let (name, suffix) = match token.find('[') {
        Some(open) => {
            let inner = token[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| ctx.error(token, ParseErrorKind::InvalidElement(token.to_string())))?;
            (&token[..open], Some(inner.trim()))
        }
        None => (token, None),
    };

    let register = name
        .strip_prefix("$v")
        .or_else(|| name.strip_prefix("$V"))
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| *n < 32)
        .ok_or_else(|| {
            ctx.error(
                token,
                ParseErrorKind::InvalidVectorRegister(token.to_string()),
            )
        })?;

    Ok((register, suffix))
}

/// Maps an element suffix (`0q`, `2h`, `5`, ...) to the element field.
#[must_use]
pub fn broadcast_element(suffix: &str) -> Option<u8> {
    let lower = suffix.to_ascii_lowercase();
    if let Some(n) = lower.strip_suffix('q') {
        return n.parse::<u8>().ok().filter(|n| *n < 2).map(|n| 2 + n);
    }
    if let Some(n) = lower.strip_suffix('h') {
        return n.parse::<u8>().ok().filter(|n| *n < 4).map(|n| 4 + n);
    }
    lower.parse::<u8>().ok().filter(|n| *n < 8).map(|n| 8 + n)
}

fn parse_cop0(token: &str) -> Option<u8> {
    let name = token.strip_prefix('$').unwrap_or(token);
    let index = name
        .strip_prefix('c')
        .unwrap_or(name)
        .parse::<u8>()
        .ok()
        .or_else(|| {
            (0..16).find(|i| ControlRegister::from_index(*i).name().eq_ignore_ascii_case(name))
        })?;
    (index < 16).then_some(index)
}

fn parse_cop2_control(token: &str) -> Option<u8> {
    let name = token.strip_prefix('$').unwrap_or(token);
    if let Ok(n) = name.parse::<u8>() {
        return (n < 3).then_some(n);
    }
    let lower = name.to_ascii_lowercase();
    VECTOR_CONTROL_NAMES
        .iter()
        .position(|c| *c == lower)
        .and_then(|i| u8::try_from(i).ok())
}

fn parse_memory(token: &str) -> Option<Operand> {
    let open = token.find('(')?;
    let base = token[open + 1..].strip_suffix(')')?;
    let base = parse_scalar(base.trim())?;
    let offset_text = token[..open].trim();
    let offset = if offset_text.is_empty() {
        Expr::Number(0)
    } else {
        parse_expr(offset_text)?
    };
    Some(Operand::Memory { offset, base })
}

/// Parses a literal or `label[+-addend]`.
#[must_use]
pub fn parse_expr(text: &str) -> Option<Expr> {
    if let Some(n) = parse_number(text) {
        return Some(Expr::Number(n));
    }

    let split = text
        .char_indices()
        .skip(1)
        .find(|(_, c)| matches!(c, '+' | '-'))
        .map(|(pos, _)| pos);
    let (name, addend) = match split {
        Some(pos) => {
            let magnitude = parse_number(&text[pos + 1..])?;
            let addend = if text[pos..].starts_with('-') {
                -magnitude
            } else {
                magnitude
            };
            (&text[..pos], addend)
        }
        None => (text, 0),
    };

    is_valid_label(name).then(|| Expr::Label {
        name: name.to_string(),
        addend,
    })
}

/// Parses decimal, `0x` hex or `0b` binary, with an optional leading `-`.
#[must_use]
pub fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = text
        .strip_prefix('-')
        .map_or((false, text), |rest| (true, rest));

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        i64::from_str_radix(bin, 2).ok()?
    } else if digits.starts_with(|c: char| c.is_ascii_digit()) {
        digits.parse::<i64>().ok()?
    } else {
        return None;
    };

    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsp_core::{PrimaryOpcode, SpecialFunction, VectorMemoryOpcode, VectorOpcode};

    fn instruction(line: &str) -> ParsedInstruction {
        match parse_line(line, 1).unwrap().body {
            LineBody::Instruction(i) => i,
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    fn error_kind(line: &str) -> ParseErrorKind {
        parse_line(line, 7).unwrap_err().kind
    }

    #[test]
    fn blank_and_comment_lines() {
        assert_eq!(parse_line("", 1).unwrap(), ParsedLine::empty());
        assert_eq!(parse_line("   ; note", 1).unwrap(), ParsedLine::empty());
        assert_eq!(parse_line("# note", 1).unwrap(), ParsedLine::empty());
        assert_eq!(parse_line("// note", 1).unwrap(), ParsedLine::empty());
    }

    #[test]
    fn label_alone_and_with_instruction() {
        let line = parse_line("start:", 1).unwrap();
        assert_eq!(line.label.as_deref(), Some("start"));
        assert_eq!(line.body, LineBody::Empty);

        let line = parse_line("loop: addiu $1, $1, -1 ; count down", 1).unwrap();
        assert_eq!(line.label.as_deref(), Some("loop"));
        assert!(matches!(line.body, LineBody::Instruction(_)));
    }

    #[test]
    fn scalar_registers_by_number_and_abi_name() {
        let i = instruction("addu $v0, $a0, $31");
        assert_eq!(
            i.operands,
            [Operand::Scalar(2), Operand::Scalar(4), Operand::Scalar(31)]
        );
        assert_eq!(i.form, OperandForm::Register3(SpecialFunction::Addu));
        assert_eq!(parse_scalar("$zero"), Some(0));
        assert_eq!(parse_scalar("$fp"), Some(30));
        assert_eq!(parse_scalar("$s8"), Some(30));
        assert_eq!(parse_scalar("$32"), None);
        assert_eq!(parse_scalar("r1"), None);
    }

    #[test]
    fn immediate_forms() {
        let i = instruction("addiu $1, $0, -5");
        assert_eq!(i.operands[2], Operand::Immediate(Expr::Number(-5)));
        assert_eq!(i.form, OperandForm::Immediate(PrimaryOpcode::Addiu));

        let i = instruction("ori $1, $1, 0b1010");
        assert_eq!(i.operands[2], Operand::Immediate(Expr::Number(10)));

        let i = instruction("beq $1, $2, done+8");
        assert_eq!(
            i.operands[2],
            Operand::Immediate(Expr::Label {
                name: "done".into(),
                addend: 8
            })
        );
    }

    #[test]
    fn memory_operands() {
        let i = instruction("lw $t0, 0x10($sp)");
        assert_eq!(
            i.operands[1],
            Operand::Memory {
                offset: Expr::Number(16),
                base: 29
            }
        );

        let i = instruction("sb $1, ($2)");
        assert_eq!(
            i.operands[1],
            Operand::Memory {
                offset: Expr::Number(0),
                base: 2
            }
        );

        let i = instruction("lw $1, table-4($0)");
        assert_eq!(
            i.operands[1],
            Operand::Memory {
                offset: Expr::Label {
                    name: "table".into(),
                    addend: -4
                },
                base: 0
            }
        );
    }

    #[test]
    fn vector_element_suffixes() {
        for (suffix, element) in [
            ("", 0),
            ("[0q]", 2),
            ("[1q]", 3),
            ("[0h]", 4),
            ("[3h]", 7),
            ("[0]", 8),
            ("[7]", 15),
        ] {
            let i = instruction(&format!("vmulf $v1, $v2, $v3{suffix}"));
            assert_eq!(
                i.operands[2],
                Operand::Vector {
                    register: 3,
                    element
                },
                "suffix {suffix}"
            );
            assert_eq!(i.form, OperandForm::Vector(VectorOpcode::Vmulf));
        }
    }

    #[test]
    fn single_lane_destination_element() {
        let i = instruction("vrcp $v4[5], $v2[1]");
        assert_eq!(
            i.operands,
            [
                Operand::Vector {
                    register: 4,
                    element: 5
                },
                Operand::Vector {
                    register: 2,
                    element: 9
                },
            ]
        );
    }

    #[test]
    fn vector_memory_and_moves_use_byte_elements() {
        let i = instruction("lqv $v1[0], 0x20($1)");
        assert_eq!(i.form, OperandForm::VectorMemory(VectorMemoryOpcode::Lqv));
        assert_eq!(
            i.operands[0],
            Operand::Vector {
                register: 1,
                element: 0
            }
        );

        let i = instruction("mtc2 $2, $v7[14]");
        assert_eq!(
            i.operands[1],
            Operand::Vector {
                register: 7,
                element: 14
            }
        );
    }

    #[test]
    fn control_registers() {
        assert_eq!(
            instruction("mfc0 $1, $4").operands[1],
            Operand::Control(4)
        );
        assert_eq!(
            instruction("mtc0 $1, SP_SEMAPHORE").operands[1],
            Operand::Control(7)
        );
        assert_eq!(
            instruction("mfc0 $1, $c9").operands[1],
            Operand::Control(9)
        );
        assert_eq!(
            instruction("cfc2 $1, $vcc").operands[1],
            Operand::Control(1)
        );
        assert_eq!(
            instruction("ctc2 $1, $2").operands[1],
            Operand::Control(2)
        );
    }

    #[test]
    fn li_size_depends_on_value() {
        assert_eq!(instruction("li $1, 0x7FFF").words, 1);
        assert_eq!(instruction("li $1, -1").words, 1);
        assert_eq!(instruction("li $1, 0xFFFF").words, 1);
        assert_eq!(instruction("li $1, 0x12345").words, 2);
        assert_eq!(instruction("li $1, table").words, 2);
        assert_eq!(instruction("nop").words, 1);
    }

    #[test]
    fn directives() {
        let parse = |line: &str| match parse_line(line, 1).unwrap().body {
            LineBody::Directive(d) => d,
            other => panic!("expected directive, got {other:?}"),
        };
        assert_eq!(parse(".org 0x100"), Directive::Org(0x100));
        assert_eq!(parse(".align 3"), Directive::Align(3));
        assert_eq!(parse(".space 4"), Directive::Space(4));
        assert_eq!(parse(".byte 1, 0xFF, -1"), Directive::Byte(vec![1, 0xFF, 0xFF]));
        assert_eq!(parse(".half 0x1234, -2"), Directive::Half(vec![0x1234, 0xFFFE]));
        assert_eq!(
            parse(".word 0xDEADBEEF, start"),
            Directive::Word(vec![
                Expr::Number(0xDEAD_BEEF),
                Expr::Label {
                    name: "start".into(),
                    addend: 0
                }
            ])
        );
    }

    #[test]
    fn errors_carry_line_and_column() {
        let err = parse_line("    frob $1", 12).unwrap_err();
        assert_eq!(err.location, SourceLocation { line: 12, column: 5 });
        assert_eq!(err.kind, ParseErrorKind::UnknownMnemonic("frob".into()));
    }

    #[test]
    fn operand_errors() {
        assert_eq!(
            error_kind("addu $1, $2"),
            ParseErrorKind::OperandCount {
                mnemonic: "addu".into(),
                expected: "3",
                found: 2
            }
        );
        assert!(matches!(
            error_kind("addu $1, $2, $v3"),
            ParseErrorKind::InvalidRegister(_)
        ));
        assert!(matches!(
            error_kind("vadd $v1, $v2[1], $v3"),
            ParseErrorKind::InvalidElement(_)
        ));
        assert!(matches!(
            error_kind("vadd $v1, $v2, $v3[8]"),
            ParseErrorKind::InvalidElement(_)
        ));
        assert!(matches!(
            error_kind("vrcp $v1[8], $v2"),
            ParseErrorKind::InvalidElement(_)
        ));
        assert!(matches!(
            error_kind("vadd $v32, $v2, $v3"),
            ParseErrorKind::InvalidVectorRegister(_)
        ));
        assert!(matches!(
            error_kind("mtc0 $1, $16"),
            ParseErrorKind::InvalidControlRegister(_)
        ));
        assert!(matches!(
            error_kind("lw $1, 4"),
            ParseErrorKind::InvalidMemoryOperand(_)
        ));
        assert!(matches!(
            error_kind(".frob 1"),
            ParseErrorKind::InvalidDirective(_)
        ));
        assert!(matches!(
            error_kind(".byte 256"),
            ParseErrorKind::InvalidDirectiveValue(_)
        ));
        assert!(matches!(
            error_kind("1abc: nop"),
            ParseErrorKind::InvalidLabel(_)
        ));
    }
}
