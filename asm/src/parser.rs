use std::num::ParseIntError;

use arch::mnemonic::{Form, Mnemonic, Slot};
use arch::reg::Reg;
use color_print::cformat;

use crate::error::{AsmError, SourceRange};

// ----------------------------------------------------------------------------
// Statement

/// Label declaration attached to a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub ident: String,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandKind {
    Register(Reg),
    Number(u8),
    Address(u8),
    RegisterAddress(Reg),
    Label(String),
}

impl OperandKind {
    fn name(&self) -> &'static str {
        match self {
            OperandKind::Register(_) => "register",
            OperandKind::Number(_) => "number",
            OperandKind::Address(_) => "address",
            OperandKind::RegisterAddress(_) => "register address",
            OperandKind::Label(_) => "label",
        }
    }
}

/// A typed operand. `code` is the operand's byte encoding, known at parse
/// time for everything except label references, which stay `None` until
/// the assembler's second pass resolves them to an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub kind: OperandKind,
    pub code: Option<u8>,
    pub range: SourceRange,
}

/// One parsed source line. `codes` is the final-width byte sequence the
/// statement contributes to memory: opcode plus one byte per operand,
/// with a zero placeholder where a label address will be patched in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub label: Option<Label>,
    pub mnemonic: Mnemonic,
    pub operands: Vec<Operand>,
    pub codes: Vec<u8>,
    pub range: SourceRange,
}

/// Parse a whole program into statements in source order. Any malformed
/// line aborts the parse; there are no partial results.
pub fn parse(source: &str) -> Result<Vec<Statement>, AsmError> {
    let mut statements = vec![];
    for (idx, raw) in source.lines().enumerate() {
        let code = match raw.split_once(';') {
            Some((code, _comment)) => code,
            None => raw,
        };
        if code.trim().is_empty() {
            continue;
        }
        statements.push(Statement::parse(idx, code)?);
    }
    Ok(statements)
}

impl Statement {
    fn parse(line: usize, code: &str) -> Result<Statement, AsmError> {
        // label: MNEMONIC op1, op2
        let (label, body_from) = match code.find(':') {
            Some(colon) => {
                let (off, ident) = trim_span(0, &code[..colon]);
                if !is_ident(ident) {
                    let range = SourceRange::new(line, off, off + ident.len().max(1));
                    return Err(AsmError::MalformedLabel(ident.to_string(), range));
                }
                let range = SourceRange::new(line, off, off + ident.len());
                let label = Label {
                    ident: ident.to_string(),
                    range,
                };
                (Some(label), colon + 1)
            }
            None => (None, 0),
        };

        let words = fields(code, body_from);
        let (mnemonic_off, mnemonic_word) = match words.first() {
            Some(first) => *first,
            None => {
                // the line held nothing but a label declaration
                let label = label.unwrap_or(Label {
                    ident: String::new(),
                    range: SourceRange::new(line, 0, 1),
                });
                return Err(AsmError::DanglingLabel(label.ident, label.range));
            }
        };
        let mnemonic_range =
            SourceRange::new(line, mnemonic_off, mnemonic_off + mnemonic_word.len());
        let mnemonic = mnemonic_word
            .parse::<Mnemonic>()
            .map_err(|_| AsmError::UnknownMnemonic(mnemonic_word.to_string(), mnemonic_range))?;

        let mut operands = vec![];
        for (off, tok) in operand_spans(code, mnemonic_off + mnemonic_word.len()) {
            let range = SourceRange::new(line, off, off + tok.len().max(1));
            operands.push(Operand::parse(tok, range)?);
        }

        let start = label.as_ref().map(|l| l.range.start).unwrap_or(mnemonic_off);
        let end = operands
            .last()
            .map(|op| op.range.end)
            .unwrap_or(mnemonic_range.end);
        let range = SourceRange::new(line, start, end);

        let form = mnemonic
            .forms()
            .iter()
            .find(|form| form_matches(form, &operands))
            .ok_or_else(|| AsmError::NoMatchingForm {
                mnemonic: mnemonic.to_string(),
                found: describe_operands(&operands),
                range,
            })?;

        let codes = match mnemonic {
            Mnemonic::ORG => vec![],
            Mnemonic::DB => vec![operands[0].code.unwrap_or(0)],
            _ => {
                let mut codes = Vec::with_capacity(1 + operands.len());
                codes.push(form.opcode);
                codes.extend(operands.iter().map(|op| op.code.unwrap_or(0)));
                codes
            }
        };

        Ok(Statement {
            label,
            mnemonic,
            operands,
            codes,
            range,
        })
    }
}

impl Operand {
    fn parse(tok: &str, range: SourceRange) -> Result<Operand, AsmError> {
        if let Some(inner) = tok.strip_prefix('[') {
            let inner = match inner.strip_suffix(']') {
                Some(inner) => inner.trim(),
                None => return Err(AsmError::MalformedOperand(tok.to_string(), range)),
            };
            if let Ok(reg) = inner.parse::<Reg>() {
                return Ok(Operand {
                    kind: OperandKind::RegisterAddress(reg),
                    code: Some(reg.into()),
                    range,
                });
            }
            let value = byte_literal(inner, range)?;
            return Ok(Operand {
                kind: OperandKind::Address(value),
                code: Some(value),
                range,
            });
        }
        if let Ok(reg) = tok.parse::<Reg>() {
            return Ok(Operand {
                kind: OperandKind::Register(reg),
                code: Some(reg.into()),
                range,
            });
        }
        if tok.starts_with(|c: char| c.is_ascii_digit()) {
            let value = byte_literal(tok, range)?;
            return Ok(Operand {
                kind: OperandKind::Number(value),
                code: Some(value),
                range,
            });
        }
        if is_ident(tok) {
            return Ok(Operand {
                kind: OperandKind::Label(tok.to_string()),
                code: None,
                range,
            });
        }
        Err(AsmError::MalformedOperand(tok.to_string(), range))
    }
}

fn form_matches(form: &Form, operands: &[Operand]) -> bool {
    form.slots.len() == operands.len()
        && form
            .slots
            .iter()
            .zip(operands)
            .all(|(slot, op)| slot_matches(*slot, &op.kind))
}

fn slot_matches(slot: Slot, kind: &OperandKind) -> bool {
    matches!(
        (slot, kind),
        (Slot::Reg, OperandKind::Register(_))
            | (Slot::Imm, OperandKind::Number(_))
            | (Slot::Addr, OperandKind::Address(_))
            | (Slot::RegAddr, OperandKind::RegisterAddress(_))
            | (Slot::Target, OperandKind::Label(_))
            | (Slot::Target, OperandKind::Number(_))
    )
}

fn describe_operands(operands: &[Operand]) -> String {
    if operands.is_empty() {
        return "no operands".to_string();
    }
    operands
        .iter()
        .map(|op| op.kind.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn byte_literal(s: &str, range: SourceRange) -> Result<u8, AsmError> {
    let value =
        parse_with_prefix(s).map_err(|_| AsmError::MalformedNumber(s.to_string(), range))?;
    if value > 0xFF {
        return Err(AsmError::ValueTooLarge(value, range));
    }
    Ok(value as u8)
}

fn parse_with_prefix(s: &str) -> Result<u32, ParseIntError> {
    // get(..2) stays None on short input and on a prefix split inside a
    // multi-byte character; both fall through to the decimal parse
    let radix = match s.get(..2) {
        Some("0b") => 2,
        Some("0o") => 8,
        Some("0x") => 16,
        _ => return u32::from_str_radix(s, 10),
    };
    u32::from_str_radix(&s[2..], radix)
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whitespace-separated words of `code[from..]` with their column offsets.
fn fields(code: &str, from: usize) -> Vec<(usize, &str)> {
    let mut out = vec![];
    let mut start = None;
    for (i, c) in code[from..].char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push((s, &code[s..from + i]));
            }
        } else if start.is_none() {
            start = Some(from + i);
        }
    }
    if let Some(s) = start {
        out.push((s, &code[s..]));
    }
    out
}

/// Comma-separated operand tokens of `code[from..]`, trimmed, with their
/// column offsets. An empty token between commas is kept so it can be
/// reported as malformed.
fn operand_spans(code: &str, from: usize) -> Vec<(usize, &str)> {
    let rest = &code[from..];
    if rest.trim().is_empty() {
        return vec![];
    }
    let mut out = vec![];
    let mut piece_start = from;
    for (i, c) in rest.char_indices() {
        if c == ',' {
            out.push(trim_span(piece_start, &code[piece_start..from + i]));
            piece_start = from + i + 1;
        }
    }
    out.push(trim_span(piece_start, &code[piece_start..]));
    out
}

fn trim_span(off: usize, s: &str) -> (usize, &str) {
    let leading = s.len() - s.trim_start().len();
    (off + leading, s.trim())
}

// ----------------------------------------------------------------------------
// Listing format

impl Operand {
    pub fn cformat(&self) -> String {
        match &self.kind {
            OperandKind::Register(reg) => cformat!("<blue>{}</>", reg),
            OperandKind::Number(n) => cformat!("<yellow>0x{:02X}</>", n),
            OperandKind::Address(a) => cformat!("<yellow>[0x{:02X}]</>", a),
            OperandKind::RegisterAddress(reg) => cformat!("<blue>[{}]</>", reg),
            OperandKind::Label(name) => match self.code {
                Some(addr) => cformat!("<green>0x{:02X}({})</>", addr, name),
                None => cformat!("<red,underline>{}</>", name),
            },
        }
    }
}

impl Statement {
    pub fn cformat(&self) -> String {
        let label = match &self.label {
            Some(label) => cformat!("<green>{}:</> ", label.ident),
            None => String::new(),
        };
        let operands = self
            .operands
            .iter()
            .map(Operand::cformat)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}{} {}",
            label,
            cformat!("<red>{:<4}</>", self.mnemonic.to_string()),
            operands
        )
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn one(code: &str) -> Statement {
        let statements = parse(code).unwrap();
        assert_eq!(statements.len(), 1);
        statements.into_iter().next().unwrap()
    }

    #[test]
    fn mov_immediate() {
        let stmt = one("MOV AL, 5");
        assert_eq!(stmt.mnemonic, Mnemonic::MOV);
        assert_eq!(stmt.codes, vec![0xD0, 0x00, 0x05]);
        assert_eq!(stmt.operands[0].kind, OperandKind::Register(Reg::AL));
        assert_eq!(stmt.operands[1].code, Some(5));
    }

    #[test]
    fn addressing_forms() {
        assert_eq!(one("MOV AL, [0x10]").codes, vec![0xD1, 0x00, 0x10]);
        assert_eq!(one("MOV [0x10], AL").codes, vec![0xD2, 0x10, 0x00]);
        assert_eq!(one("MOV AL, [BL]").codes, vec![0xD3, 0x00, 0x01]);
        assert_eq!(one("MOV [BL], AL").codes, vec![0xD4, 0x01, 0x00]);
    }

    #[test]
    fn case_insensitive_words() {
        assert_eq!(one("add al, bl").codes, vec![0xA0, 0x00, 0x01]);
        assert_eq!(one("Add AL, 2").codes, vec![0xB0, 0x00, 0x02]);
    }

    #[test]
    fn radix_literals() {
        assert_eq!(one("DB 0x2A").codes, vec![0x2A]);
        assert_eq!(one("DB 0b1010").codes, vec![0x0A]);
        assert_eq!(one("DB 0o17").codes, vec![0x0F]);
        assert_eq!(one("DB 42").codes, vec![0x2A]);
    }

    #[test]
    fn label_declaration() {
        let stmt = one("start: JMP start");
        let label = stmt.label.unwrap();
        assert_eq!(label.ident, "start");
        assert_eq!(label.range, SourceRange::new(0, 0, 5));
        // placeholder byte reserved for the unresolved reference
        assert_eq!(stmt.codes, vec![0xC0, 0x00]);
        assert_eq!(stmt.operands[0].kind, OperandKind::Label("start".into()));
        assert_eq!(stmt.operands[0].code, None);
    }

    #[test]
    fn jump_to_numeric_address() {
        assert_eq!(one("JMP 0x20").codes, vec![0xC0, 0x20]);
    }

    #[test]
    fn comments_and_blanks() {
        let statements = parse("; all comments\n\n  HALT ; stop\n").unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].mnemonic, Mnemonic::HALT);
        assert_eq!(statements[0].range.line, 2);
    }

    #[test]
    fn org_carries_no_codes() {
        let stmt = one("ORG 0x10");
        assert_eq!(stmt.codes, Vec::<u8>::new());
        assert_eq!(stmt.operands[0].code, Some(0x10));
    }

    #[test]
    fn unknown_mnemonic() {
        assert!(matches!(
            parse("FROB AL"),
            Err(AsmError::UnknownMnemonic(word, _)) if word == "FROB"
        ));
    }

    #[test]
    fn wrong_operand_types() {
        assert!(matches!(
            parse("ADD 1, 2"),
            Err(AsmError::NoMatchingForm { mnemonic, .. }) if mnemonic == "ADD"
        ));
        assert!(matches!(
            parse("INC AL, BL"),
            Err(AsmError::NoMatchingForm { .. })
        ));
    }

    #[test]
    fn org_rejects_label_operand() {
        assert!(matches!(
            parse("ORG start"),
            Err(AsmError::NoMatchingForm { mnemonic, .. }) if mnemonic == "ORG"
        ));
    }

    #[test]
    fn malformed_literals() {
        assert!(matches!(
            parse("MOV AL, 0xZZ"),
            Err(AsmError::MalformedNumber(tok, _)) if tok == "0xZZ"
        ));
        assert!(matches!(
            parse("MOV AL, 300"),
            Err(AsmError::ValueTooLarge(300, _))
        ));
        // overflows the operand width, not the parser
        assert!(matches!(
            parse("DB 99999"),
            Err(AsmError::ValueTooLarge(99999, _))
        ));
    }

    #[test]
    fn non_ascii_literal() {
        assert!(matches!(
            parse("MOV AL, 1\u{e9}"),
            Err(AsmError::MalformedNumber(tok, _)) if tok == "1\u{e9}"
        ));
        assert!(matches!(
            parse("DB 0x\u{e9}9"),
            Err(AsmError::MalformedNumber(..))
        ));
    }

    #[test]
    fn malformed_labels() {
        assert!(matches!(parse("1st: HALT"), Err(AsmError::MalformedLabel(..))));
        assert!(matches!(
            parse("lonely:"),
            Err(AsmError::DanglingLabel(ident, _)) if ident == "lonely"
        ));
    }

    #[test]
    fn malformed_operands() {
        assert!(matches!(
            parse("MOV AL, [0x10"),
            Err(AsmError::MalformedOperand(..))
        ));
        assert!(matches!(
            parse("MOV AL,, 5"),
            Err(AsmError::MalformedOperand(..))
        ));
    }

    #[test]
    fn operand_ranges() {
        let stmt = one("  JMP  start");
        assert_eq!(stmt.operands[0].range, SourceRange::new(0, 7, 12));
        assert_eq!(stmt.range, SourceRange::new(0, 2, 12));
    }
}
