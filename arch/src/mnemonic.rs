use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Mnemonic {
    HALT,
    NOP,
    ADD,
    SUB,
    MUL,
    DIV,
    INC,
    DEC,
    AND,
    OR,
    XOR,
    NOT,
    CMP,
    MOV,
    JMP,
    JZ,
    JNZ,
    JS,
    JNS,
    CALL,
    RET,
    PUSH,
    POP,
    IN,
    OUT,
    ORG,
    DB,
}

/// Operand slot of an instruction form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Register
    Reg,
    /// Immediate byte
    Imm,
    /// Direct memory address `[n]`
    Addr,
    /// Register-indirect address `[reg]`
    RegAddr,
    /// Jump target: numeric address or label reference
    Target,
}

/// One accepted addressing form of a mnemonic. An instruction encodes as
/// the form's opcode followed by one byte per operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Form {
    pub slots: &'static [Slot],
    pub opcode: u8,
}

impl Mnemonic {
    /// Accepted operand forms with their opcodes. Directives carry a form
    /// for arity/type checking only; their opcode byte is never emitted.
    pub fn forms(&self) -> &'static [Form] {
        use Slot::*;
        macro_rules! forms {
            ($([$($slot:ident),*] => $op:expr),* $(,)?) => {
                &[$(Form { slots: &[$($slot),*], opcode: $op }),*]
            };
        }
        match self {
            Mnemonic::HALT => forms![[] => 0x00],
            Mnemonic::NOP => forms![[] => 0x01],
            Mnemonic::ADD => forms![[Reg, Reg] => 0xA0, [Reg, Imm] => 0xB0],
            Mnemonic::SUB => forms![[Reg, Reg] => 0xA1, [Reg, Imm] => 0xB1],
            Mnemonic::MUL => forms![[Reg, Reg] => 0xA2, [Reg, Imm] => 0xB2],
            Mnemonic::DIV => forms![[Reg, Reg] => 0xA3, [Reg, Imm] => 0xB3],
            Mnemonic::INC => forms![[Reg] => 0xA4],
            Mnemonic::DEC => forms![[Reg] => 0xA5],
            Mnemonic::AND => forms![[Reg, Reg] => 0xA6, [Reg, Imm] => 0xB6],
            Mnemonic::OR => forms![[Reg, Reg] => 0xA7, [Reg, Imm] => 0xB7],
            Mnemonic::XOR => forms![[Reg, Reg] => 0xA8, [Reg, Imm] => 0xB8],
            Mnemonic::NOT => forms![[Reg] => 0xA9],
            Mnemonic::CMP => forms![[Reg, Reg] => 0xDA, [Reg, Imm] => 0xDB],
            Mnemonic::MOV => forms![
                [Reg, Imm] => 0xD0,
                [Reg, Addr] => 0xD1,
                [Addr, Reg] => 0xD2,
                [Reg, RegAddr] => 0xD3,
                [RegAddr, Reg] => 0xD4,
            ],
            Mnemonic::JMP => forms![[Target] => 0xC0],
            Mnemonic::JZ => forms![[Target] => 0xC1],
            Mnemonic::JNZ => forms![[Target] => 0xC2],
            Mnemonic::JS => forms![[Target] => 0xC3],
            Mnemonic::JNS => forms![[Target] => 0xC4],
            Mnemonic::CALL => forms![[Target] => 0xCA],
            Mnemonic::RET => forms![[] => 0xCB],
            Mnemonic::PUSH => forms![[Reg] => 0xE0],
            Mnemonic::POP => forms![[Reg] => 0xE1],
            Mnemonic::IN => forms![[Imm] => 0xF0],
            Mnemonic::OUT => forms![[Imm] => 0xF1],
            Mnemonic::ORG => forms![[Imm] => 0x00],
            Mnemonic::DB => forms![[Imm] => 0x00],
        }
    }

    /// Directives contribute no opcode byte to memory.
    pub fn is_directive(&self) -> bool {
        matches!(self, Mnemonic::ORG | Mnemonic::DB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!("mov".parse::<Mnemonic>(), Ok(Mnemonic::MOV));
        assert_eq!("Jnz".parse::<Mnemonic>(), Ok(Mnemonic::JNZ));
        assert!("hoge".parse::<Mnemonic>().is_err());
    }

    #[test]
    fn forms() {
        assert_eq!(Mnemonic::MOV.forms().len(), 5);
        assert_eq!(Mnemonic::JMP.forms()[0].opcode, 0xC0);
        assert_eq!(Mnemonic::HALT.forms()[0].slots.len(), 0);
        assert!(Mnemonic::ORG.is_directive());
        assert!(!Mnemonic::JMP.is_directive());
    }
}
