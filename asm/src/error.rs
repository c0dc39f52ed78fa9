use std::fmt;

use color_print::cprintln;
use thiserror::Error;

/// Location of a token within the source text: line index plus a byte
/// column span within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        SourceRange { line, start, end }
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.start + 1)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("Unknown mnemonic: `{0}`")]
    UnknownMnemonic(String, SourceRange),

    #[error("`{mnemonic}` does not take ({found})")]
    NoMatchingForm {
        mnemonic: String,
        found: String,
        range: SourceRange,
    },

    #[error("Cannot parse `{0}` as a number")]
    MalformedNumber(String, SourceRange),

    #[error("Value {0} does not fit in a byte")]
    ValueTooLarge(u32, SourceRange),

    #[error("Malformed label: `{0}`")]
    MalformedLabel(String, SourceRange),

    #[error("Malformed operand: `{0}`")]
    MalformedOperand(String, SourceRange),

    #[error("Label `{0}` is not attached to a statement")]
    DanglingLabel(String, SourceRange),

    #[error("Re-defined label: `{0}`")]
    DuplicateLabel(String, SourceRange),

    #[error("Program does not fit in memory: statement ends at address {address}")]
    EndOfMemory { address: u16, range: SourceRange },

    #[error("Undefined label: `{0}`")]
    UndefinedLabel(String, SourceRange),
}

impl AsmError {
    pub fn range(&self) -> SourceRange {
        match self {
            AsmError::UnknownMnemonic(_, range)
            | AsmError::MalformedNumber(_, range)
            | AsmError::ValueTooLarge(_, range)
            | AsmError::MalformedLabel(_, range)
            | AsmError::MalformedOperand(_, range)
            | AsmError::DanglingLabel(_, range)
            | AsmError::DuplicateLabel(_, range)
            | AsmError::UndefinedLabel(_, range) => *range,
            AsmError::NoMatchingForm { range, .. } => *range,
            AsmError::EndOfMemory { range, .. } => *range,
        }
    }

    /// Print the error with the offending source line and a caret span.
    pub fn print_diag(&self, source: &str) {
        let range = self.range();
        let line_num = range.line + 1;

        cprintln!("<red,bold>error</>: {}", self);
        cprintln!("     <blue>--></> line {}", line_num);
        cprintln!("      <blue>|</>");

        let line_content = source.lines().nth(range.line).unwrap_or("");
        cprintln!(" <blue>{:>4} |</> {}", line_num, line_content);
        cprintln!(
            "      <blue>|</> <red,bold>{}</>",
            underline(line_content, range)
        );
    }
}

/// Caret line marking `range` under `line`. Tabs in the prefix are kept
/// so the carets line up at the same tab stops as the source line; every
/// other character takes one column.
fn underline(line: &str, range: SourceRange) -> String {
    let pad: String = line
        .get(..range.start)
        .unwrap_or("")
        .chars()
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    let width = line
        .get(range.start..range.end)
        .map(|s| s.chars().count())
        .unwrap_or_else(|| range.end.saturating_sub(range.start))
        .max(1);
    format!("{}{}", pad, "^".repeat(width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underline_tracks_columns() {
        let range = SourceRange::new(0, 9, 12);
        assert_eq!(underline("\tMOV AL, 300", range), "\t        ^^^");
    }

    #[test]
    fn underline_counts_chars_not_bytes() {
        // `é` is two bytes but one column
        let line = "MOV AL, 1\u{e9}";
        let range = SourceRange::new(0, 8, 11);
        assert_eq!(underline(line, range), "        ^^");
    }
}
