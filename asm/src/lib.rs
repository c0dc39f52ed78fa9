pub mod assembler;
pub mod error;
pub mod parser;

pub use assembler::{assemble, emit, label_table, Assembly, LabelTable};
pub use error::{AsmError, SourceRange};
pub use parser::{parse, Label, Operand, OperandKind, Statement};
