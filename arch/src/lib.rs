pub mod mnemonic;
pub mod reg;
