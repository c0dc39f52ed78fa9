use std::collections::BTreeMap;

use arch::mnemonic::Mnemonic;
use indexmap::IndexMap;

use crate::error::AsmError;
use crate::parser::{self, OperandKind, Statement};

/// Label identifier to resolved address, built by the first pass.
pub type LabelTable = IndexMap<String, u8>;

/// Result of a successful assembly. `memory` is the address to byte map
/// (absent addresses are implicitly zero); `addr_to_stmt` maps the first
/// address of each emitted statement to its index in `statements`, whose
/// entries carry fully resolved operand codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub memory: BTreeMap<u16, u8>,
    pub statements: Vec<Statement>,
    pub addr_to_stmt: BTreeMap<u16, usize>,
}

impl Assembly {
    pub fn statement_at(&self, address: u16) -> Option<&Statement> {
        self.addr_to_stmt
            .get(&address)
            .map(|&idx| &self.statements[idx])
    }

    /// Flatten into the 256-byte image a simulator loads. Bytes a final
    /// statement pushed past the boundary are dropped.
    pub fn image(&self) -> [u8; 256] {
        let mut image = [0u8; 256];
        for (&address, &code) in &self.memory {
            if let Some(cell) = image.get_mut(address as usize) {
                *cell = code;
            }
        }
        image
    }
}

/// Pass 1: walk the statements with an address cursor, recording each
/// label at its statement's address. `ORG` relocates the cursor without
/// occupying memory. A non-final statement that ends past address 0xFF
/// aborts; the final statement may run over the edge since nothing is
/// placed after it.
pub fn label_table(statements: &[Statement]) -> Result<LabelTable, AsmError> {
    let mut table = LabelTable::new();
    let mut address: u16 = 0;
    let last = statements.len().saturating_sub(1);
    for (idx, stmt) in statements.iter().enumerate() {
        if let Some(label) = &stmt.label {
            if table.contains_key(&label.ident) {
                return Err(AsmError::DuplicateLabel(label.ident.clone(), label.range));
            }
            table.insert(label.ident.clone(), address as u8);
        }
        if stmt.mnemonic == Mnemonic::ORG {
            address = org_target(stmt);
        } else {
            address += stmt.codes.len() as u16;
            if address > 0xFF && idx != last {
                return Err(AsmError::EndOfMemory {
                    address,
                    range: stmt.range,
                });
            }
        }
    }
    Ok(table)
}

/// Pass 2: resolve label operands against the table and flatten the
/// program into memory. Works on clones of the parsed statements; the
/// caller's input is left untouched.
pub fn emit(statements: &[Statement], table: &LabelTable) -> Result<Assembly, AsmError> {
    let mut memory = BTreeMap::new();
    let mut addr_to_stmt = BTreeMap::new();
    let mut resolved: Vec<Statement> = Vec::with_capacity(statements.len());
    let mut address: u16 = 0;
    for stmt in statements {
        let mut stmt = stmt.clone();
        if stmt.mnemonic == Mnemonic::ORG {
            address = org_target(&stmt);
            resolved.push(stmt);
            continue;
        }
        for (idx, operand) in stmt.operands.iter_mut().enumerate() {
            if let OperandKind::Label(name) = &operand.kind {
                let target = match table.get(name.as_str()) {
                    Some(addr) => *addr,
                    None => return Err(AsmError::UndefinedLabel(name.clone(), operand.range)),
                };
                operand.code = Some(target);
                // patch the placeholder byte behind the opcode
                stmt.codes[1 + idx] = target;
            }
        }
        for (idx, &code) in stmt.codes.iter().enumerate() {
            memory.insert(address + idx as u16, code);
        }
        addr_to_stmt.insert(address, resolved.len());
        address += stmt.codes.len() as u16;
        resolved.push(stmt);
    }
    Ok(Assembly {
        memory,
        statements: resolved,
        addr_to_stmt,
    })
}

/// Assemble a whole program. The sole entry point consumed by the
/// simulator layer.
pub fn assemble(source: &str) -> Result<Assembly, AsmError> {
    let statements = parser::parse(source)?;
    let table = label_table(&statements)?;
    emit(&statements, &table)
}

// The parser admits only a numeric form for ORG.
fn org_target(stmt: &Statement) -> u16 {
    match stmt.operands.first().map(|op| &op.kind) {
        Some(OperandKind::Number(n)) => *n as u16,
        _ => unreachable!("ORG operand is validated by the parser"),
    }
}
